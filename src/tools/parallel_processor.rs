//! 多运行并行回填模块
//!
//! 使用rayon在自定义线程池中并行载入和分析运行文件；
//! 分析结果按运行号排序后由主线程逐行追加，历史文件始终按升序增长。

use super::batch_state::{BatchStatsSnapshot, ParallelBatchStats};
use super::cli::AppConfig;
use super::processor::{analyze_run, print_warnings};
use super::scanner::RunFile;
use super::utils;
use crate::core::run_summary::RunAnalysis;
use crate::error::{ErrorCategory, LaserError};
use crate::history::HistoryStore;
use crate::run_data::JsonRunSource;
use rayon::prelude::*;

/// 有序结果容器（保证追加顺序）
struct OrderedResult {
    /// 原始索引（用于排序）
    index: usize,

    /// 运行号
    run: u32,

    /// 分析结果
    result: Result<RunAnalysis, LaserError>,
}

/// 多运行并行回填
///
/// - 自定义rayon线程池精确控制并发度
/// - 工作线程只读运行文件、不碰历史文件
/// - 索引排序后串行追加
pub fn process_backfill_parallel(
    run_files: &[RunFile],
    store: &HistoryStore,
    config: &AppConfig,
    parallel_degree: usize,
) -> Result<BatchStatsSnapshot, LaserError> {
    println!("[INFO] 并行提取 / Parallel extraction: {parallel_degree} 并发度");

    let recorded = store.recorded_runs()?;
    let stats = ParallelBatchStats::new();

    let pending: Vec<(usize, &RunFile)> = run_files
        .iter()
        .filter(|file| {
            let seen = recorded.contains(&file.run);
            if seen {
                stats.inc_duplicate();
            }
            !seen
        })
        .enumerate()
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(parallel_degree)
        .thread_name(|i| format!("laser-worker-{i}"))
        .build()
        .map_err(|e| LaserError::ResourceError(format!("线程池创建失败: {e}")))?;

    let mut results: Vec<OrderedResult> = pool.install(|| {
        pending
            .par_iter()
            .map(|&(index, file)| {
                if !config.verbose {
                    print!(".");
                    use std::io::Write;
                    std::io::stdout().flush().ok();
                }

                let result = JsonRunSource::load_path(&file.path, file.run).map(|data| analyze_run(&data));

                if let Err(e) = &result {
                    let filename = utils::extract_filename_lossy(&file.path);
                    if config.verbose {
                        println!("[FAIL] {filename} - {e}");
                    }
                    stats.inc_failed(ErrorCategory::from_laser_error(e), filename);
                }

                OrderedResult {
                    index,
                    run: file.run,
                    result,
                }
            })
            .collect()
    });

    if !config.verbose {
        println!(); // 进度点换行
    }

    // 按原始顺序排序（扫描结果已按运行号升序）
    results.sort_by_key(|r| r.index);

    for ordered in results {
        if let Ok(analysis) = ordered.result {
            print_warnings(ordered.run, &analysis.warnings);
            store.append(&analysis.summary)?;
            let count = stats.inc_processed();
            if config.verbose {
                println!("[OK] [{count}] run {} 已追加 / appended", ordered.run);
            }
        }
    }

    Ok(stats.snapshot())
}
