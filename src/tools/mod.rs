//! 工具模块集合
//!
//! 包含CLI、运行处理、回填、趋势视图和格式化等工具模块，支持main.rs的流程控制。

pub mod batch_state;
pub mod cli;
pub mod constants;
pub mod formatter;
pub mod parallel_processor;
pub mod processor;
pub mod scanner;
pub mod trend;
pub mod utils;

// 重新导出主要的公共接口
pub use batch_state::{BatchStatsSnapshot, ParallelBatchStats, SerialBatchStats};
pub use cli::{AppConfig, parse_args, show_completion_info, show_startup_info};
pub use formatter::{create_report_header, format_run_summary, format_trend_report};
pub use parallel_processor::process_backfill_parallel;
pub use processor::{
    UpdateOutcome, analyze_run, process_backfill_serial, process_single_run, update_laser_run,
};
pub use scanner::{RunFile, scan_run_files, show_backfill_completion_info, show_scan_results};
pub use trend::{TrendReport, TrendWindow, build_trend, write_trend_json};
pub use utils::path;
