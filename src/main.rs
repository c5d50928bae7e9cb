//! Laser Validation Tool - 主程序入口
//!
//! 纯流程控制器：更新单个运行、回填数据目录、输出趋势视图。

use laser_validation::{
    error::{ErrorCategory, LaserError},
    history::HistoryStore,
    run_data::JsonRunSource,
    tools::{self, AppConfig, TrendWindow, constants::defaults},
};
use std::process;

/// 错误退出码定义
mod exit_codes {
    /// 通用错误
    pub const GENERAL_ERROR: i32 = 1;
    /// 格式/输入错误
    pub const FORMAT_ERROR: i32 = 2;
    /// 运行文件缺少对象
    pub const MISSING_OBJECT: i32 = 3;
    /// 计算错误
    pub const CALCULATION_ERROR: i32 = 4;
    /// 资源/并发错误
    pub const RESOURCE_ERROR: i32 = 5;
}

/// 获取错误建议文本
fn get_error_suggestion(error: &LaserError) -> &'static str {
    match error {
        LaserError::InvalidInput(_) => {
            "检查命令行参数是否正确，使用 --help 查看完整用法 / Check if command-line arguments are correct, use --help to see full usage"
        }
        LaserError::ResourceError(_) => {
            "资源不可用，请重试；若持续失败请降低并发度（--parallel-runs 1） / Resource unavailable, retry or reduce parallelism (--parallel-runs 1)"
        }
        _ => match ErrorCategory::from_laser_error(error) {
            ErrorCategory::Io => {
                "检查运行文件和历史文件路径是否正确、是否可读写 / Check that the run file and history file paths exist and are accessible"
            }
            ErrorCategory::Format => {
                "运行文件或历史文件内容损坏 / Run file or history file content is malformed"
            }
            ErrorCategory::MissingObject => {
                "运行文件缺少直方图或元数据 / Run file lacks the histogram or metadata"
            }
            ErrorCategory::Calculation => {
                "计算过程出现异常，请检查直方图是否包含有效数据 / Calculation error, check that the histogram contains valid data"
            }
            ErrorCategory::Other => "请检查输入文件和参数设置 / Please check input files and parameters",
        },
    }
}

/// 错误处理和建议
fn handle_error(error: LaserError) -> ! {
    eprintln!("[ERROR] 错误 / Error: {error}");
    eprintln!("[INFO] 建议 / Suggestion: {}", get_error_suggestion(&error));

    let exit_code = match &error {
        LaserError::InvalidInput(_) => exit_codes::FORMAT_ERROR,
        LaserError::ResourceError(_) => exit_codes::RESOURCE_ERROR,
        _ => match ErrorCategory::from_laser_error(&error) {
            ErrorCategory::Format => exit_codes::FORMAT_ERROR,
            ErrorCategory::MissingObject => exit_codes::MISSING_OBJECT,
            ErrorCategory::Calculation => exit_codes::CALCULATION_ERROR,
            ErrorCategory::Io | ErrorCategory::Other => exit_codes::GENERAL_ERROR,
        },
    };

    process::exit(exit_code);
}

/// 回填数据目录中的所有运行
fn process_backfill_mode(config: &AppConfig, store: &HistoryStore) -> Result<(), LaserError> {
    let run_files = tools::scan_run_files(&config.data_dir)?;
    tools::show_scan_results(config, &run_files);

    if run_files.is_empty() {
        return Ok(());
    }

    let degree = tools::utils::effective_parallel_degree(config.parallel_runs, Some(run_files.len()));
    let snapshot = if degree > 1 {
        tools::process_backfill_parallel(&run_files, store, config, degree).or_else(|e| {
            eprintln!("[WARNING] 并行处理失败 / Parallel processing failed: {e}，回退到串行模式 / fallback to serial");
            tools::process_backfill_serial(&run_files, store, config)
        })?
    } else {
        if config.verbose && config.is_parallel() {
            println!("[INFO] 并发度为1，使用串行模式 / Parallelism=1, using serial mode");
        }
        tools::process_backfill_serial(&run_files, store, config)?
    };

    tools::show_backfill_completion_info(&snapshot, config);
    Ok(())
}

/// 趋势视图
fn process_display_mode(config: &AppConfig, store: &HistoryStore) -> Result<(), LaserError> {
    let rows = store.load_all()?;
    let last_run = rows.iter().map(|s| s.run).max();
    let window = TrendWindow::resolve(config.from_run, config.to_run, last_run)?;
    let report = tools::build_trend(&rows, window, defaults::BAD_CHANNEL_HIGHLIGHT);

    if config.display {
        println!("{}", tools::format_trend_report(&report));
    }

    if let Some(path) = &config.export_json {
        tools::write_trend_json(&report, path)?;
        println!("[OK] 趋势数据已导出 / Trend exported: {}", path.display());
    }

    Ok(())
}

/// 应用程序主逻辑（便于测试和复用）
fn run() -> Result<(), LaserError> {
    // 1. 解析命令行参数
    let config = tools::parse_args();

    if !config.has_work() {
        return Err(LaserError::InvalidInput(
            "未指定运行号或操作（RUN / --rebuild / --display） / no run number or action given"
                .to_string(),
        ));
    }

    // 2. 显示启动信息
    tools::show_startup_info(&config);

    let store = HistoryStore::new(&config.history_path);

    // 3. 依次执行：单运行更新 → 回填 → 趋势视图
    if let Some(run) = config.run {
        let source = JsonRunSource::new(&config.data_dir);
        tools::process_single_run(run, &source, &store, &config)?;
    }

    if config.rebuild {
        process_backfill_mode(&config, &store)?;
    }

    if config.display || config.export_json.is_some() {
        process_display_mode(&config, &store)?;
    }

    tools::show_completion_info(&config);
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        handle_error(error);
    }
}
