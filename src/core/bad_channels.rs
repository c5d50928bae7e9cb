//! 坏通道扫描
//!
//! 坏通道指时间峰被一段空隙劈成两半的通道（时钟问题导致的分裂峰）。
//! 每个通道在自身峰值bin附近逐bin走一个有限状态机：
//!
//! ```text
//! BeforePeak --(y > ceil)--> InPeak --(y < floor)--> Dropped --(y > ceil)--> Bad
//! ```
//!
//! `Bad` 为终态，到达后立即结束该通道的扫描。
//!
//! ## 预筛选
//!
//! - 条目数 < 700：统计量不足，跳过
//! - 峰值bin ±12 bin 积分占比 < 0.2：没有明确的峰，跳过

use super::histogram::{Histogram2D, Projection};
use crate::tools::constants::laser_analysis;

/// 单通道扫描状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// 尚未越过天花板
    #[default]
    BeforePeak,

    /// 已进入峰区
    InPeak,

    /// 峰区之后跌破地板（正常峰尾或空隙）
    Dropped,

    /// 跌破地板后再次越过天花板：分裂峰
    Bad,
}

impl ScanState {
    /// 单个bin的状态转移
    #[inline]
    pub fn step(self, y: f64, floor: f64, ceil: f64) -> Self {
        match self {
            Self::BeforePeak if y > ceil => Self::InPeak,
            Self::InPeak if y < floor => Self::Dropped,
            Self::Dropped if y > ceil => Self::Bad,
            state => state,
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        self == Self::Bad
    }
}

/// 单通道判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelVerdict {
    /// 条目数不足
    LowStatistics,

    /// 峰区占比过低
    NoClearPeak,

    /// 扫描完成，未发现分裂
    Clean,

    /// 分裂峰
    Split,
}

impl ChannelVerdict {
    #[inline]
    pub fn is_bad(self) -> bool {
        self == Self::Split
    }
}

/// 对单通道投影做预筛选并走状态机
pub fn classify_channel(projection: &Projection) -> ChannelVerdict {
    let entries = projection.integral();
    if entries < laser_analysis::BAD_CHANNEL_MIN_ENTRIES {
        return ChannelVerdict::LowStatistics;
    }

    let peak_bin = projection.maximum_bin();
    let half = laser_analysis::BAD_CHANNEL_PEAK_HALF_BINS;
    let peak_fraction = projection.integral_range(peak_bin - half, peak_bin + half) / entries;
    if peak_fraction < laser_analysis::BAD_CHANNEL_MIN_PEAK_FRACTION {
        return ChannelVerdict::NoClearPeak;
    }

    let peak_height = projection.bin_content(peak_bin);
    let floor = laser_analysis::BAD_CHANNEL_FLOOR_FRACTION * peak_height;
    let ceil = laser_analysis::BAD_CHANNEL_CEIL_FRACTION * peak_height;

    let scan = laser_analysis::BAD_CHANNEL_SCAN_HALF_BINS;
    let mut state = ScanState::BeforePeak;
    // 上界不含 peak_bin + 25
    for bin in (peak_bin - scan)..(peak_bin + scan) {
        state = state.step(projection.bin_content(bin), floor, ceil);
        if state.is_terminal() {
            return ChannelVerdict::Split;
        }
    }
    ChannelVerdict::Clean
}

/// 统计直方图中的坏通道数
pub fn count_bad_channels(histogram: &Histogram2D) -> u32 {
    (1..=histogram.channels())
        .filter_map(|ch| histogram.channel_projection(ch))
        .filter(|p| classify_channel(p).is_bad())
        .count() as u32
}
