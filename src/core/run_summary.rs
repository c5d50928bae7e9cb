//! 单个运行的汇总提取
//!
//! `LaserAnalyzer` 持有一个运行的数据和全局投影，按固定顺序计算：
//! 投影统计 → 对称高斯拟合 → 非对称高斯拟合 → 坏通道计数，
//! 最终产出一行 `RunSummary`。
//!
//! 拟合的警告（未收敛、结果被拒绝）收集在 `RunAnalysis::warnings` 中，
//! 由调用方决定如何输出；它们从不阻止汇总行的生成。

use super::bad_channels;
use super::gaussian_fit::{self, FitOutcome, GaussParams, SkewGaussParams};
use super::histogram::Projection;
use super::projection_stats::ProjectionStats;
use crate::run_data::RunData;
use crate::tools::constants::laser_analysis;

/// 单个运行的汇总行（历史文件中的一行，14个字段）
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// 运行号
    pub run: u32,

    /// 活跃PMT数
    pub n_live_pmts: u32,

    /// TT8事件数
    pub tt8_events: u64,

    /// 全局投影总条目数
    pub total_entries: u64,

    /// 峰值bin计数
    pub peak_height: f64,

    /// 峰值bin中心时间
    pub peak_time: f64,

    /// 对称高斯拟合参数
    pub gaus: GaussParams,

    /// 非对称高斯拟合参数（拒绝时全零）
    pub skew: SkewGaussParams,

    /// 坏通道数
    pub bad_channels: u32,
}

/// 分析结果：汇总行 + 拟合警告
#[derive(Debug, Clone)]
pub struct RunAnalysis {
    pub summary: RunSummary,
    pub warnings: Vec<String>,
}

/// 激光运行分析器
pub struct LaserAnalyzer<'a> {
    data: &'a RunData,
    projection: Projection,
    stats: ProjectionStats,
}

impl<'a> LaserAnalyzer<'a> {
    /// 创建分析器并计算全局投影
    pub fn new(data: &'a RunData) -> Self {
        let projection = data.histogram.projection();
        let stats = ProjectionStats::compute(&projection);
        Self {
            data,
            projection,
            stats,
        }
    }

    /// 全局投影
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// 投影统计（峰值bin、峰高、总条目数）
    pub fn projection_stats(&self) -> &ProjectionStats {
        &self.stats
    }

    /// 对称高斯拟合
    pub fn gaus_fit(&self) -> FitOutcome<GaussParams> {
        gaussian_fit::fit_gaus(&self.projection, &self.stats)
    }

    /// 非对称高斯拟合
    pub fn skew_gaus_fit(&self) -> FitOutcome<SkewGaussParams> {
        gaussian_fit::fit_skew_gaus(&self.projection, &self.stats)
    }

    /// 坏通道数
    pub fn bad_channels(&self) -> u32 {
        bad_channels::count_bad_channels(&self.data.histogram)
    }

    /// 完整分析，生成汇总行
    pub fn analyze(&self) -> RunAnalysis {
        let mut warnings = Vec::new();

        let channels = self.data.histogram.channels();
        if channels != laser_analysis::NOMINAL_CHANNELS {
            warnings.push(format!(
                "通道数 {channels} 与标称值 {} 不符 / unexpected channel count",
                laser_analysis::NOMINAL_CHANNELS
            ));
        }

        let gaus = self.gaus_fit();
        warnings.extend(gaus.warning);

        let skew = self.skew_gaus_fit();
        warnings.extend(skew.warning);

        let summary = RunSummary {
            run: self.data.run,
            n_live_pmts: self.data.metadata.n_live_pmts,
            tt8_events: self.data.metadata.tt8_events,
            total_entries: self.stats.entries(),
            peak_height: self.stats.peak_height,
            peak_time: self.stats.max_x,
            gaus: gaus.params,
            skew: skew.params,
            bad_channels: self.bad_channels(),
        };

        RunAnalysis { summary, warnings }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::histogram::{Histogram2D, TimeAxis};
    use crate::run_data::RunMetadata;

    // 4通道，时间轴 [499.5, 1000.5)，bin中心为500..=1000的整数
    fn synthetic_run() -> RunData {
        let axis = TimeAxis::new(501, 499.5, 1000.5).unwrap();
        let mut counts = Vec::new();
        for _ in 0..4 {
            for bin in 0..501 {
                let x = 500.0 + bin as f64;
                let u = (x - 750.0) / 3.0;
                counts.push((1000.0 * (-0.5 * u * u).exp()).round() as u32);
            }
        }
        RunData {
            run: 12345,
            metadata: RunMetadata {
                n_live_pmts: 1800,
                tt8_events: 500_000,
            },
            histogram: Histogram2D::new(4, axis, counts).unwrap(),
        }
    }

    #[test]
    fn test_analysis_fills_all_fields() {
        let data = synthetic_run();
        let analysis = LaserAnalyzer::new(&data).analyze();
        let s = &analysis.summary;

        assert_eq!(s.run, 12345);
        assert_eq!(s.n_live_pmts, 1800);
        assert_eq!(s.tt8_events, 500_000);
        assert_eq!(s.peak_time, 750.0);
        assert_eq!(s.peak_height, 4000.0);
        assert_eq!(s.total_entries, data.histogram.projection().integral() as u64);
        assert!((s.gaus.mean - 750.0).abs() < 0.05);
        assert!((s.gaus.sigma - 3.0).abs() < 0.05);
        assert!(!s.skew.is_rejected());
        assert!((s.skew.mean - 750.0).abs() < 0.2);
        assert_eq!(s.bad_channels, 0);
    }

    #[test]
    fn test_channel_count_warning() {
        let data = synthetic_run();
        let analysis = LaserAnalyzer::new(&data).analyze();
        assert!(analysis.warnings.iter().any(|w| w.contains("通道数 4")));
    }
}
