//! 全局投影统计
//!
//! 峰值bin定位、峰高、总条目数，以及拟合初值所需的窗口均值/RMS。

use super::histogram::Projection;

/// 全局时间投影的峰值统计
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionStats {
    /// 最大计数bin（1-based，并列取最小bin号）
    pub max_bin: i64,

    /// 最大计数bin的中心时间
    pub max_x: f64,

    /// 峰高（最大bin计数）
    pub peak_height: f64,

    /// 全投影积分
    pub total_entries: f64,
}

impl ProjectionStats {
    /// 从投影计算峰值统计
    pub fn compute(projection: &Projection) -> Self {
        let max_bin = projection.maximum_bin();
        Self {
            max_bin,
            max_x: projection.bin_center(max_bin),
            peak_height: projection.bin_content(max_bin),
            total_entries: projection.integral(),
        }
    }

    /// 总条目数（整数形式，写入历史文件）
    #[inline]
    pub fn entries(&self) -> u64 {
        self.total_entries.round() as u64
    }

    /// 峰值bin两侧 `half_bins` 个bin的积分
    pub fn peak_integral(&self, projection: &Projection, half_bins: i64) -> f64 {
        projection.integral_range(self.max_bin - half_bins, self.max_bin + half_bins)
    }

    /// 以峰值中心 ± `half_width` 限定坐标范围后的均值与RMS
    pub fn windowed_mean_rms(&self, projection: &Projection, half_width: f64) -> Option<(f64, f64)> {
        let (first, last) =
            projection.bins_covering(self.max_x - half_width, self.max_x + half_width)?;
        projection.mean_rms(first, last)
    }
}
