//! 常量和默认配置集中管理
//!
//! 将所有重要常量集中定义，避免"默认值漂移"和重复定义

/// 激光刻度分析算法常量
pub mod laser_analysis {
    /// 标称通道数（时间对齐直方图的通道轴bin数）
    pub const NOMINAL_CHANNELS: usize = 2240;

    /// 对称高斯拟合窗口半宽（时间单位，围绕峰值bin中心）
    pub const GAUS_FIT_HALF_WIDTH: f64 = 12.0;

    /// 对称高斯初始幅度积分的半宽（bin数）
    pub const GAUS_AMPLITUDE_HALF_BINS: i64 = 20;

    /// 对称高斯初始sigma猜测值
    pub const GAUS_INITIAL_SIGMA: f64 = 3.0;

    /// 对称高斯函数定义域
    pub const GAUS_DOMAIN: (f64, f64) = (500.0, 1000.0);

    /// 非对称高斯拟合窗口半宽（时间单位）
    pub const SKEW_FIT_HALF_WIDTH: f64 = 25.0;

    /// 非对称高斯均值边界：投影均值 ± N×RMS
    pub const SKEW_MEAN_RMS_LIMIT: f64 = 3.0;

    /// 非对称高斯sigma上界
    pub const SKEW_SIGMA_UPPER: f64 = 1000.0;

    /// sigma的物理合理上限，超过即判定拟合无效
    ///
    /// 与拟合窗口（±25）同一时间单位
    pub const SKEW_SIGMA_SANITY_LIMIT: f64 = 10.0;

    /// 坏通道扫描：最少条目数，低于此值统计量不足
    pub const BAD_CHANNEL_MIN_ENTRIES: f64 = 700.0;

    /// 坏通道扫描：峰区（±12 bin）积分占比下限
    pub const BAD_CHANNEL_PEAK_HALF_BINS: i64 = 12;
    pub const BAD_CHANNEL_MIN_PEAK_FRACTION: f64 = 0.2;

    /// 坏通道扫描范围：[峰值bin-25, 峰值bin+25)
    pub const BAD_CHANNEL_SCAN_HALF_BINS: i64 = 25;

    /// 地板阈值：峰高的3%，跌破即离开峰区
    pub const BAD_CHANNEL_FLOOR_FRACTION: f64 = 0.03;

    /// 天花板阈值：峰高的8%，跌破地板后再次超过即为分裂峰
    pub const BAD_CHANNEL_CEIL_FRACTION: f64 = 0.08;
}

/// 默认配置值
pub mod defaults {
    /// 默认历史文件（测试文件；正式文件为 /home/production/laser_history.csv）
    pub const HISTORY_FILE: &str = "laser_history_c19.csv";

    /// 默认运行文件目录
    pub const DATA_DIR: &str = "/bxstorage/rootfiles/cycle_18/laser_run";

    /// 运行文件名后缀
    pub const RUN_FILE_SUFFIX: &str = "_laser_calibrations_validate_c18.json";

    /// 趋势视图默认起始运行号
    pub const TREND_FROM_RUN: u32 = 26000;

    /// 趋势视图上界：最后一个运行号之后的余量
    pub const TREND_RUN_PADDING: u32 = 100;

    /// 坏通道数高亮阈值
    pub const BAD_CHANNEL_HIGHLIGHT: u32 = 70;

    /// 默认回填并发度（1 = 串行）
    pub const PARALLEL_RUNS_DEGREE: usize = 1;
}

/// 并发度限制常量
pub mod parallel_limits {
    /// 最小并发度
    pub const MIN_PARALLEL_DEGREE: usize = 1;

    /// 最大并发度
    ///
    /// 每个运行文件完整载入内存（2240通道 × 时间bin），限制同时驻留的直方图数量
    pub const MAX_PARALLEL_DEGREE: usize = 8;
}
