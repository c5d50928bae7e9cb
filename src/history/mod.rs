//! 历史记录模块
//!
//! 历史文件是只追加的文本表：一行表头，之后每个运行一行，14个空白分隔字段。
//! 没有更新或删除路径；每个运行号最多出现一次，由写入前的存在性检查保证。

pub mod row;
pub mod store;

pub use row::{HEADER, format_row, parse_row};
pub use store::HistoryStore;
