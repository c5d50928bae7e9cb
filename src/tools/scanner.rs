//! 运行文件扫描模块
//!
//! 递归扫描数据目录，按文件名识别运行文件并按运行号排序。

use super::batch_state::BatchStatsSnapshot;
use super::cli::AppConfig;
use super::utils;
use crate::error::{LaserError, LaserResult};
use crate::run_data::parse_run_file_name;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 扫描到的运行文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFile {
    pub run: u32,
    pub path: PathBuf,
}

/// 递归扫描目录中的运行文件，按运行号升序
///
/// 同一运行号出现在多个子目录时只保留路径排序最靠前的一个。
pub fn scan_run_files(dir_path: &Path) -> LaserResult<Vec<RunFile>> {
    if !dir_path.exists() {
        return Err(LaserError::IoError(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("目录不存在: {}", dir_path.display()),
        )));
    }

    if !dir_path.is_dir() {
        return Err(LaserError::InvalidInput(format!(
            "路径不是目录: {}",
            dir_path.display()
        )));
    }

    let mut run_files: Vec<RunFile> = WalkDir::new(dir_path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let run = parse_run_file_name(e.file_name().to_str()?)?;
            Some(RunFile {
                run,
                path: e.into_path(),
            })
        })
        .collect();

    run_files.sort_by(|a, b| a.run.cmp(&b.run).then_with(|| a.path.cmp(&b.path)));
    run_files.dedup_by_key(|f| f.run);

    Ok(run_files)
}

/// 显示文件扫描结果
pub fn show_scan_results(config: &AppConfig, run_files: &[RunFile]) {
    if run_files.is_empty() {
        println!(
            "[WARNING] 目录 {} 中没有找到运行文件 / No run files found",
            config.data_dir.display()
        );
        return;
    }

    println!("[INFO] 扫描目录 / Scanning: {}", config.data_dir.display());
    println!(
        "[INFO] 找到 {} 个运行文件 / Found {} run files ({} .. {})",
        run_files.len(),
        run_files.len(),
        run_files[0].run,
        run_files[run_files.len() - 1].run
    );

    if config.verbose {
        for (i, file) in run_files.iter().enumerate() {
            println!(
                "   {}. {} ({})",
                i + 1,
                file.run,
                utils::extract_filename_lossy(&file.path)
            );
        }
    }
    println!();
}

/// 显示回填完成信息
pub fn show_backfill_completion_info(snapshot: &BatchStatsSnapshot, config: &AppConfig) {
    println!();
    println!("[INFO] 回填完成 / Backfill finished");
    println!(
        "   追加 / Appended: {} / {}",
        snapshot.processed,
        snapshot.total()
    );
    println!("   已记录跳过 / Already recorded: {}", snapshot.duplicates);
    if snapshot.failed > 0 {
        println!("   失败 / Failed: {}", snapshot.failed);
        for (category, runs) in snapshot.sorted_failures() {
            println!("   - {} ({}):", category.display_name(), runs.len());
            if config.verbose {
                for name in runs {
                    println!("       {name}");
                }
            }
        }
    }
    println!(
        "   历史文件 / History file: {}",
        config.history_path.display()
    );
}
