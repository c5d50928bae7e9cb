//! 运行数据读取模块
//!
//! 单个激光刻度运行的输入：时间对齐直方图（通道 × 时间bin）和两个标量元数据。
//! 具体的文件格式隐藏在 `RunSource` trait 之后，分析核心只看到 `RunData`。

pub mod json_source;

pub use json_source::{JsonRunSource, RunFileRecord, parse_run_file_name, run_file_name};

use crate::core::histogram::Histogram2D;
use crate::error::LaserResult;
use std::path::PathBuf;

/// 运行级标量元数据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunMetadata {
    /// 活跃PMT数
    pub n_live_pmts: u32,

    /// TT8（激光触发）事件数
    pub tt8_events: u64,
}

/// 一个运行的完整输入数据
#[derive(Debug, Clone)]
pub struct RunData {
    pub run: u32,
    pub metadata: RunMetadata,
    pub histogram: Histogram2D,
}

/// 运行数据来源
///
/// 实现方负责定位、读取和校验运行数据；任何缺失或损坏都以错误返回，
/// 调用方据此在写入任何历史行之前中止。
pub trait RunSource: Send + Sync {
    /// 数据源名称（用于日志输出）
    fn name(&self) -> &'static str;

    /// 运行数据所在位置（用于提示信息）
    fn locate(&self, run: u32) -> PathBuf;

    /// 载入指定运行
    fn load(&self, run: u32) -> LaserResult<RunData>;
}
