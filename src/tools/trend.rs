//! 趋势视图
//!
//! 从历史记录中取出运行号窗口内的行，派生三组趋势序列：
//! sigma（对称σ、左σ、右σ）、强度（总条目 / 峰面积，按活跃PMT和TT8归一）、坏通道数。
//! 窗口上界是显式参数，调用方负责给出。

use super::constants::defaults;
use super::utils;
use crate::core::run_summary::RunSummary;
use crate::error::{LaserError, LaserResult};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// 运行历史上的操作标记（运行号, 说明）
pub const MARKERS: &[(u32, &str)] = &[
    (8892, "calibrations"),
    (18000, "new reference channels for CNGS"),
    (26580, "new trigger"),
    (28734, "first crate recabling"),
    (28892, "other crate recablings"),
    (29091, "last crate recabling"),
    (29601, "clock issue"),
    (30425, "laser 3.99 -> 6"),
    (31949, "laser controller broken"),
    (32202, "new controller"),
    (32422, "open laser box, still old head"),
    (32457, "readjusting laser"),
];

/// 运行号闭区间 `[from, to]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrendWindow {
    pub from: u32,
    pub to: u32,
}

impl TrendWindow {
    pub fn new(from: u32, to: u32) -> LaserResult<Self> {
        if from > to {
            return Err(LaserError::InvalidInput(format!(
                "趋势窗口无效: from {from} > to {to}"
            )));
        }
        Ok(Self { from, to })
    }

    /// 确定窗口：未给出上界时取最后一个已记录运行号 + 余量
    pub fn resolve(from: u32, to: Option<u32>, last_run: Option<u32>) -> LaserResult<Self> {
        let to = to.unwrap_or_else(|| {
            last_run
                .unwrap_or(from)
                .saturating_add(defaults::TREND_RUN_PADDING)
        });
        Self::new(from, to)
    }

    #[inline]
    pub fn contains(&self, run: u32) -> bool {
        (self.from..=self.to).contains(&run)
    }
}

/// 单个运行的趋势点
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub run: u32,
    pub gaus_sigma: f64,
    pub skew_left_sigma: f64,
    pub skew_right_sigma: f64,
    /// 总条目 / 活跃PMT / TT8
    pub intensity_total: Option<f64>,
    /// A·σ·sqrt(2π) / 活跃PMT / TT8
    pub intensity_peak: Option<f64>,
    pub bad_channels: u32,
    /// 坏通道数超过高亮阈值
    pub highlighted: bool,
}

impl TrendPoint {
    pub fn from_summary(s: &RunSummary, highlight_threshold: u32) -> Self {
        let norm = if s.n_live_pmts == 0 || s.tt8_events == 0 {
            None
        } else {
            Some(s.n_live_pmts as f64 * s.tt8_events as f64)
        };
        Self {
            run: s.run,
            gaus_sigma: s.gaus.sigma,
            skew_left_sigma: s.skew.left_sigma,
            skew_right_sigma: s.skew.right_sigma,
            intensity_total: norm.map(|n| s.total_entries as f64 / n),
            intensity_peak: norm.map(|n| s.gaus.area() / n),
            bad_channels: s.bad_channels,
            highlighted: s.bad_channels > highlight_threshold,
        }
    }
}

/// 窗口内的操作标记
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerEntry {
    pub run: u32,
    pub label: String,
}

/// 趋势报告
#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub window: TrendWindow,
    pub highlight_threshold: u32,
    pub points: Vec<TrendPoint>,
    pub markers: Vec<MarkerEntry>,
}

impl TrendReport {
    /// 高亮的运行数
    pub fn highlighted_count(&self) -> usize {
        self.points.iter().filter(|p| p.highlighted).count()
    }
}

/// 从历史行构建趋势报告（按运行号排序）
pub fn build_trend(rows: &[RunSummary], window: TrendWindow, highlight_threshold: u32) -> TrendReport {
    let mut points: Vec<TrendPoint> = rows
        .iter()
        .filter(|s| window.contains(s.run))
        .map(|s| TrendPoint::from_summary(s, highlight_threshold))
        .collect();
    points.sort_by_key(|p| p.run);

    let markers = MARKERS
        .iter()
        .filter(|(run, _)| window.contains(*run))
        .map(|&(run, label)| MarkerEntry {
            run,
            label: label.to_string(),
        })
        .collect();

    TrendReport {
        window,
        highlight_threshold,
        points,
        markers,
    }
}

/// 导出趋势报告为JSON
pub fn write_trend_json(report: &TrendReport, path: &Path) -> LaserResult<()> {
    fs::create_dir_all(utils::get_parent_dir(path))?;
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
