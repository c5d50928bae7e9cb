//! Laser Validation Tool
//!
//! 激光刻度运行的验证分析：从每个运行的时间对齐直方图中提取峰值时间、
//! 峰宽和坏通道数，逐行追加到历史文件，并按运行号窗口输出趋势视图。
//!
//! ## 核心特性
//! - 全局时间投影的峰值统计（峰值bin、峰高、总条目数）
//! - 对称高斯与非对称（双侧sigma）高斯的分bin泊松似然拟合
//! - 逐通道有限状态机扫描，识别被空隙劈开的分裂峰
//! - 只追加的历史文件，每个运行号最多一行
//! - 数据目录回填（可选rayon并行提取）与趋势视图

pub mod core;
pub mod error;
pub mod history;
pub mod run_data;
pub mod tools;

// 重新导出核心类型
pub use core::{GaussParams, Histogram2D, LaserAnalyzer, Projection, RunSummary, SkewGaussParams};
pub use error::{ErrorCategory, LaserError, LaserResult};
pub use history::HistoryStore;
pub use run_data::{JsonRunSource, RunData, RunMetadata, RunSource};
