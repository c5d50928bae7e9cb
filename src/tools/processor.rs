//! 运行处理模块
//!
//! 负责单个运行的 "检查 → 载入 → 分析 → 追加" 流程，以及串行回填。
//! 历史文件的唯一写入点都在这里，且每次只追加一行完整数据。

use super::batch_state::{BatchStatsSnapshot, SerialBatchStats};
use super::cli::AppConfig;
use super::scanner::RunFile;
use super::{formatter, utils};
use crate::core::run_summary::{LaserAnalyzer, RunAnalysis};
use crate::error::{ErrorCategory, LaserResult};
use crate::history::HistoryStore;
use crate::run_data::{JsonRunSource, RunData, RunSource};

/// 单个运行的更新结果
#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// 已分析并追加
    Appended(RunAnalysis),

    /// 历史文件中已有该运行，未写入
    Duplicate,
}

/// 分析已载入的运行数据
pub fn analyze_run(data: &RunData) -> RunAnalysis {
    LaserAnalyzer::new(data).analyze()
}

/// 更新历史文件：运行不存在时载入、分析并追加一行
///
/// 运行数据缺失或损坏时返回错误，此时历史文件保持不变。
pub fn update_laser_run(
    run: u32,
    source: &dyn RunSource,
    store: &HistoryStore,
) -> LaserResult<UpdateOutcome> {
    if store.exists(run)? {
        return Ok(UpdateOutcome::Duplicate);
    }

    let data = source.load(run)?;
    let analysis = analyze_run(&data);
    store.append(&analysis.summary)?;
    Ok(UpdateOutcome::Appended(analysis))
}

/// 输出拟合警告（stderr）
pub fn print_warnings(run: u32, warnings: &[String]) {
    for warning in warnings {
        eprintln!("[WARNING] run {run}: {warning}");
    }
}

/// 处理命令行指定的单个运行并输出结果
pub fn process_single_run(
    run: u32,
    source: &dyn RunSource,
    store: &HistoryStore,
    config: &AppConfig,
) -> LaserResult<UpdateOutcome> {
    if config.verbose {
        println!(
            "[INFO] 载入运行 / Loading run {run} ({}): {}",
            source.name(),
            source.locate(run).display()
        );
    }

    let outcome = update_laser_run(run, source, store)?;

    match &outcome {
        UpdateOutcome::Appended(analysis) => {
            print_warnings(run, &analysis.warnings);
            if config.verbose {
                println!("{}", formatter::format_run_summary(&analysis.summary));
            }
            println!(
                "[OK] run {run} 已写入 / Run {run} written to {}",
                store.path().display()
            );
        }
        UpdateOutcome::Duplicate => {
            println!(
                "[INFO] run {run} 已存在于历史文件中 / Run {run} already in {}",
                store.path().display()
            );
        }
    }

    Ok(outcome)
}

/// 串行回填：逐个载入、分析、追加
///
/// 单个运行的读取失败只计入统计；历史文件写入失败立即中止。
pub fn process_backfill_serial(
    run_files: &[RunFile],
    store: &HistoryStore,
    config: &AppConfig,
) -> LaserResult<BatchStatsSnapshot> {
    let recorded = store.recorded_runs()?;
    let mut stats = SerialBatchStats::new();

    for (index, file) in run_files.iter().enumerate() {
        if recorded.contains(&file.run) {
            stats.inc_duplicate();
            continue;
        }

        if config.verbose {
            println!(
                "[PROCESSING] [{}/{}] 处理 / Processing: {}",
                index + 1,
                run_files.len(),
                utils::extract_filename_lossy(&file.path)
            );
        }

        match JsonRunSource::load_path(&file.path, file.run) {
            Ok(data) => {
                let analysis = analyze_run(&data);
                print_warnings(file.run, &analysis.warnings);
                store.append(&analysis.summary)?;
                stats.inc_processed();
                if config.verbose {
                    println!("   [OK] 已追加 / Appended");
                }
            }
            Err(e) => {
                let category = ErrorCategory::from_laser_error(&e);
                let filename = utils::extract_filename_lossy(&file.path);
                println!(
                    "[FAIL] [{}/{}] {} - [{}] {e} / 处理失败",
                    index + 1,
                    run_files.len(),
                    filename,
                    category.display_name()
                );
                stats.inc_failed(category, filename);
            }
        }
    }

    Ok(stats.snapshot())
}
