//! 核心算法模块
//!
//! 包含直方图数据结构、峰形拟合、坏通道扫描和单运行汇总提取。

pub mod bad_channels;
pub mod gaussian_fit;
pub mod histogram;
pub mod optimizer;
pub mod projection_stats;
pub mod run_summary;

// 重新导出公共接口
pub use bad_channels::{ChannelVerdict, ScanState, count_bad_channels};
pub use gaussian_fit::{FitOutcome, GaussParams, SkewGaussParams};
pub use histogram::{Histogram2D, Projection, TimeAxis};
pub use projection_stats::ProjectionStats;
pub use run_summary::{LaserAnalyzer, RunAnalysis, RunSummary};
