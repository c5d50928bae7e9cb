//! 时间对齐直方图与投影
//!
//! `Histogram2D` 是通道 × 时间bin 的整数计数矩阵，载入后不可变。
//! `Projection` 是沿通道轴求和（全部通道或单个通道）得到的一维时间分布。
//!
//! ## bin编号约定
//!
//! - 时间bin从1开始编号，bin 1 是第一个范围内的bin
//! - 不存储underflow/overflow，越界bin读数为0
//! - 积分区间越界时截断到 `[1, bins]`

use crate::error::{LaserError, LaserResult};

/// 时间轴：`[min, max)` 等宽分成 `bins` 份
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAxis {
    bins: usize,
    min: f64,
    max: f64,
}

impl TimeAxis {
    /// 创建时间轴，维度非法时返回格式错误
    pub fn new(bins: usize, min: f64, max: f64) -> LaserResult<Self> {
        if bins == 0 {
            return Err(LaserError::FormatError("时间轴bin数为0".to_string()));
        }
        if !min.is_finite() || !max.is_finite() || max <= min {
            return Err(LaserError::FormatError(format!(
                "时间轴范围无效: [{min}, {max})"
            )));
        }
        Ok(Self { bins, min, max })
    }

    #[inline]
    pub fn bins(&self) -> usize {
        self.bins
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    #[inline]
    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.bins as f64
    }

    /// bin中心（1-based；越界bin按等宽外推）
    #[inline]
    pub fn bin_center(&self, bin: i64) -> f64 {
        self.min + (bin as f64 - 0.5) * self.bin_width()
    }

    /// 查找包含x的bin：0为underflow，`bins + 1` 为overflow
    pub fn find_bin(&self, x: f64) -> i64 {
        if x < self.min {
            0
        } else if x >= self.max {
            self.bins as i64 + 1
        } else {
            let bin = ((x - self.min) / self.bin_width()).floor() as i64 + 1;
            bin.min(self.bins as i64)
        }
    }

    /// 将bin区间截断到有效范围，空区间返回None
    #[inline]
    fn clamp_range(&self, first: i64, last: i64) -> Option<(usize, usize)> {
        let first = first.max(1);
        let last = last.min(self.bins as i64);
        if first > last {
            None
        } else {
            Some((first as usize, last as usize))
        }
    }
}

/// 通道 × 时间bin 二维直方图（通道主序存储）
#[derive(Debug, Clone)]
pub struct Histogram2D {
    channels: usize,
    axis: TimeAxis,
    counts: Vec<u32>,
}

impl Histogram2D {
    /// 从通道主序的计数数组创建直方图
    pub fn new(channels: usize, axis: TimeAxis, counts: Vec<u32>) -> LaserResult<Self> {
        if channels == 0 {
            return Err(LaserError::FormatError("通道数为0".to_string()));
        }
        let expected = channels.checked_mul(axis.bins()).ok_or_else(|| {
            LaserError::FormatError(format!("直方图维度溢出: {channels} × {}", axis.bins()))
        })?;
        if counts.len() != expected {
            return Err(LaserError::FormatError(format!(
                "直方图计数长度不一致: 期望 {expected} ({channels} 通道 × {} bin)，实际 {}",
                axis.bins(),
                counts.len()
            )));
        }
        Ok(Self {
            channels,
            axis,
            counts,
        })
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn time_axis(&self) -> &TimeAxis {
        &self.axis
    }

    /// 全部计数（通道主序）
    #[inline]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// 单通道原始计数（通道1-based）
    pub fn channel_counts(&self, channel: usize) -> Option<&[u32]> {
        if channel == 0 || channel > self.channels {
            return None;
        }
        let bins = self.axis.bins();
        let start = (channel - 1) * bins;
        Some(&self.counts[start..start + bins])
    }

    /// 沿通道轴求和得到全局时间投影
    pub fn projection(&self) -> Projection {
        let bins = self.axis.bins();
        let mut sums = vec![0.0; bins];
        for row in self.counts.chunks_exact(bins) {
            for (sum, &count) in sums.iter_mut().zip(row) {
                *sum += count as f64;
            }
        }
        Projection::new(self.axis, sums)
    }

    /// 单通道时间投影（通道1-based）
    pub fn channel_projection(&self, channel: usize) -> Option<Projection> {
        self.channel_counts(channel).map(|row| {
            Projection::new(self.axis, row.iter().map(|&c| c as f64).collect())
        })
    }
}

/// 一维时间投影
#[derive(Debug, Clone)]
pub struct Projection {
    axis: TimeAxis,
    counts: Vec<f64>,
}

impl Projection {
    /// 创建投影；计数长度必须与时间轴bin数一致
    pub fn new(axis: TimeAxis, counts: Vec<f64>) -> Self {
        debug_assert_eq!(axis.bins(), counts.len());
        Self { axis, counts }
    }

    #[inline]
    pub fn axis(&self) -> &TimeAxis {
        &self.axis
    }

    #[inline]
    pub fn bins(&self) -> usize {
        self.axis.bins()
    }

    /// bin内容（1-based，越界为0）
    #[inline]
    pub fn bin_content(&self, bin: i64) -> f64 {
        if bin < 1 || bin > self.bins() as i64 {
            0.0
        } else {
            self.counts[(bin - 1) as usize]
        }
    }

    #[inline]
    pub fn bin_center(&self, bin: i64) -> f64 {
        self.axis.bin_center(bin)
    }

    /// 最大计数所在bin；并列时取最小bin号
    pub fn maximum_bin(&self) -> i64 {
        let mut best = 0usize;
        for (i, &count) in self.counts.iter().enumerate() {
            if count > self.counts[best] {
                best = i;
            }
        }
        best as i64 + 1
    }

    /// 最大计数
    pub fn maximum(&self) -> f64 {
        self.bin_content(self.maximum_bin())
    }

    /// 全范围积分（总条目数）
    pub fn integral(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// `[first, last]` 闭区间积分，越界截断
    pub fn integral_range(&self, first: i64, last: i64) -> f64 {
        match self.axis.clamp_range(first, last) {
            Some((a, b)) => self.counts[a - 1..b].iter().sum(),
            None => 0.0,
        }
    }

    /// bin中心落在 `[lo, hi]` 内的bin区间
    pub fn bins_with_centers_in(&self, lo: f64, hi: f64) -> Option<(i64, i64)> {
        let tolerance = 1e-9 * self.axis.bin_width();
        let mut first = None;
        let mut last = None;
        for bin in 1..=self.bins() as i64 {
            let x = self.bin_center(bin);
            if x >= lo - tolerance && x <= hi + tolerance {
                first.get_or_insert(bin);
                last = Some(bin);
            }
        }
        first.zip(last)
    }

    /// 包含 `[lo, hi]` 端点的bin区间（截断到有效范围）
    pub fn bins_covering(&self, lo: f64, hi: f64) -> Option<(i64, i64)> {
        self.axis
            .clamp_range(self.axis.find_bin(lo), self.axis.find_bin(hi))
            .map(|(a, b)| (a as i64, b as i64))
    }

    /// `[first, last]` 内的 (bin中心, 计数) 点
    pub fn points(&self, first: i64, last: i64) -> Vec<(f64, f64)> {
        match self.axis.clamp_range(first, last) {
            Some((a, b)) => (a..=b)
                .map(|bin| (self.bin_center(bin as i64), self.counts[bin - 1]))
                .collect(),
            None => Vec::new(),
        }
    }

    /// `[first, last]` 内的加权均值和RMS（标准差）；区间无条目时返回None
    pub fn mean_rms(&self, first: i64, last: i64) -> Option<(f64, f64)> {
        let points = self.points(first, last);
        let sum_w: f64 = points.iter().map(|&(_, w)| w).sum();
        if sum_w <= 0.0 {
            return None;
        }
        let mean = points.iter().map(|&(x, w)| x * w).sum::<f64>() / sum_w;
        let var = points
            .iter()
            .map(|&(x, w)| w * (x - mean) * (x - mean))
            .sum::<f64>()
            / sum_w;
        Some((mean, var.max(0.0).sqrt()))
    }
}
