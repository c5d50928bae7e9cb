//! 命令行接口模块
//!
//! 负责命令行参数解析、配置管理和程序信息展示。

use super::constants::{defaults, parallel_limits};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// 应用程序配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 要追加到历史文件的运行号
    pub run: Option<u32>,

    /// 历史文件路径
    pub history_path: PathBuf,

    /// 运行文件目录
    pub data_dir: PathBuf,

    /// 是否输出趋势视图
    pub display: bool,

    /// 趋势窗口起点（含）
    pub from_run: u32,

    /// 趋势窗口终点（含）；None 时取最后一个已记录运行号 + 余量
    pub to_run: Option<u32>,

    /// 是否回填数据目录中所有未记录的运行
    pub rebuild: bool,

    /// 回填时的提取并发度
    pub parallel_runs: usize,

    /// 趋势序列的JSON导出路径
    pub export_json: Option<PathBuf>,

    /// 是否显示详细信息
    pub verbose: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            run: None,
            history_path: PathBuf::from(defaults::HISTORY_FILE),
            data_dir: PathBuf::from(defaults::DATA_DIR),
            display: false,
            from_run: defaults::TREND_FROM_RUN,
            to_run: None,
            rebuild: false,
            parallel_runs: defaults::PARALLEL_RUNS_DEGREE,
            export_json: None,
            verbose: false,
        }
    }
}

impl AppConfig {
    /// 是否指定了任何操作
    #[inline]
    pub fn has_work(&self) -> bool {
        self.run.is_some() || self.rebuild || self.display || self.export_json.is_some()
    }

    /// 回填是否走并行路径
    #[inline]
    pub fn is_parallel(&self) -> bool {
        self.parallel_runs > 1
    }
}

/// 构建命令定义
pub fn build_command() -> Command {
    Command::new("laser-validation")
        .version(VERSION)
        .about(DESCRIPTION)
        .author("Laser Validation Team")
        .arg(
            Arg::new("RUN")
                .help("要分析并追加到历史文件的运行号")
                .required(false)
                .index(1)
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("history")
                .long("history")
                .help("历史文件路径")
                .value_name("FILE")
                .default_value(defaults::HISTORY_FILE),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .help("运行文件目录")
                .value_name("DIR")
                .default_value(defaults::DATA_DIR),
        )
        .arg(
            Arg::new("display")
                .long("display")
                .short('d')
                .help("输出趋势视图（sigma、强度、坏通道数）")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("from")
                .long("from")
                .help("趋势窗口起始运行号")
                .value_name("RUN")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("to")
                .long("to")
                .help("趋势窗口结束运行号（默认：最后一个已记录运行号 + 100）")
                .value_name("RUN")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("rebuild")
                .long("rebuild")
                .help("回填数据目录中所有尚未记录的运行")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("parallel-runs")
                .long("parallel-runs")
                .help("回填时并行提取的运行数（1 = 串行）")
                .value_name("N")
                .value_parser(clap::value_parser!(u64).range(
                    parallel_limits::MIN_PARALLEL_DEGREE as u64
                        ..=parallel_limits::MAX_PARALLEL_DEGREE as u64,
                )),
        )
        .arg(
            Arg::new("export-json")
                .long("export-json")
                .help("将趋势序列导出为JSON文件")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("显示详细处理信息")
                .action(ArgAction::SetTrue),
        )
}

/// 从解析结果创建配置
pub fn config_from_matches(matches: &ArgMatches) -> AppConfig {
    let fallback = AppConfig::default();
    AppConfig {
        run: matches.get_one::<u32>("RUN").copied(),
        history_path: matches
            .get_one::<String>("history")
            .map(PathBuf::from)
            .unwrap_or(fallback.history_path),
        data_dir: matches
            .get_one::<String>("data-dir")
            .map(PathBuf::from)
            .unwrap_or(fallback.data_dir),
        display: matches.get_flag("display"),
        from_run: matches
            .get_one::<u32>("from")
            .copied()
            .unwrap_or(fallback.from_run),
        to_run: matches.get_one::<u32>("to").copied(),
        rebuild: matches.get_flag("rebuild"),
        parallel_runs: matches
            .get_one::<u64>("parallel-runs")
            .map(|&n| n as usize)
            .unwrap_or(fallback.parallel_runs),
        export_json: matches.get_one::<String>("export-json").map(PathBuf::from),
        verbose: matches.get_flag("verbose"),
    }
}

/// 解析命令行参数并创建配置
pub fn parse_args() -> AppConfig {
    config_from_matches(&build_command().get_matches())
}

/// 显示程序启动信息
pub fn show_startup_info(config: &AppConfig) {
    println!("Laser Validation Tool v{VERSION}");
    println!("{DESCRIPTION}");
    if config.verbose {
        println!(
            "[INFO] 历史文件 / History file: {}",
            config.history_path.display()
        );
        println!(
            "[INFO] 运行文件目录 / Data directory: {}",
            config.data_dir.display()
        );
    }
    println!();
}

/// 显示程序完成信息
pub fn show_completion_info(config: &AppConfig) {
    if config.verbose {
        println!("[OK] 所有任务处理完成 / All tasks completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> AppConfig {
        let matches = build_command()
            .try_get_matches_from(std::iter::once("laser-validation").chain(args.iter().copied()))
            .unwrap();
        config_from_matches(&matches)
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["30500"]);
        assert_eq!(config.run, Some(30500));
        assert_eq!(config.history_path, PathBuf::from(defaults::HISTORY_FILE));
        assert_eq!(config.data_dir, PathBuf::from(defaults::DATA_DIR));
        assert_eq!(config.from_run, 26000);
        assert_eq!(config.to_run, None);
        assert!(!config.is_parallel());
        assert!(config.has_work());
    }

    #[test]
    fn test_display_window() {
        let config = parse(&["--display", "--from", "29000", "--to", "30000", "-v"]);
        assert_eq!(config.run, None);
        assert!(config.display);
        assert_eq!(config.from_run, 29000);
        assert_eq!(config.to_run, Some(30000));
        assert!(config.verbose);
    }

    #[test]
    fn test_parallel_runs_range() {
        let config = parse(&["--rebuild", "--parallel-runs", "4"]);
        assert!(config.rebuild);
        assert_eq!(config.parallel_runs, 4);
        assert!(config.is_parallel());

        let too_many = build_command().try_get_matches_from(["laser-validation", "--parallel-runs", "64"]);
        assert!(too_many.is_err());
    }

    #[test]
    fn test_invalid_run_number() {
        let result = build_command().try_get_matches_from(["laser-validation", "-5"]);
        assert!(result.is_err());
        let result = build_command().try_get_matches_from(["laser-validation", "abc"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_arguments_means_no_work() {
        assert!(!parse(&[]).has_work());
    }
}
