//! 历史行的格式化与解析
//!
//! 列顺序固定：
//!
//! ```text
//! RunNumber NLivePmts NTT8 Nentries PeakHeight PeakTime
//! GausAmp GausMean GausSigma SkewAmp SkewMean SkewLeftSigma SkewRightSigma BadChannels
//! ```
//!
//! 浮点数按最短可往返表示写出，重新读入后逐位相等。

use crate::core::gaussian_fit::{GaussParams, SkewGaussParams};
use crate::core::run_summary::RunSummary;
use crate::error::{LaserError, LaserResult, format_error};
use std::str::FromStr;

/// 列名
pub const COLUMNS: [&str; 14] = [
    "RunNumber",
    "NLivePmts",
    "NTT8",
    "Nentries",
    "PeakHeight",
    "PeakTime",
    "GausAmp",
    "GausMean",
    "GausSigma",
    "SkewAmp",
    "SkewMean",
    "SkewLeftSigma",
    "SkewRightSigma",
    "BadChannels",
];

/// 表头行（不含换行）
pub const HEADER: &str = "RunNumber NLivePmts NTT8 Nentries PeakHeight PeakTime GausAmp GausMean GausSigma SkewAmp SkewMean SkewLeftSigma SkewRightSigma BadChannels";

/// 是否为表头行
pub fn is_header(line: &str) -> bool {
    line.split_whitespace().next() == Some(COLUMNS[0])
}

/// 格式化为一行（不含换行）
pub fn format_row(s: &RunSummary) -> String {
    format!(
        "{} {} {} {} {} {} {} {} {} {} {} {} {} {}",
        s.run,
        s.n_live_pmts,
        s.tt8_events,
        s.total_entries,
        s.peak_height,
        s.peak_time,
        s.gaus.amplitude,
        s.gaus.mean,
        s.gaus.sigma,
        s.skew.amplitude,
        s.skew.mean,
        s.skew.left_sigma,
        s.skew.right_sigma,
        s.bad_channels
    )
}

fn field<T: FromStr>(fields: &[&str], index: usize, line_no: usize) -> LaserResult<T> {
    fields[index].parse().map_err(|_| {
        format_error(
            &format!("历史文件第 {line_no} 行: 列 {}", COLUMNS[index]),
            format!("无法解析 {:?}", fields[index]),
        )
    })
}

/// 解析一行数据（`line_no` 仅用于错误信息）
pub fn parse_row(line: &str, line_no: usize) -> LaserResult<RunSummary> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != COLUMNS.len() {
        return Err(LaserError::FormatError(format!(
            "历史文件第 {line_no} 行: 期望 {} 列，实际 {} 列",
            COLUMNS.len(),
            fields.len()
        )));
    }

    Ok(RunSummary {
        run: field(&fields, 0, line_no)?,
        n_live_pmts: field(&fields, 1, line_no)?,
        tt8_events: field(&fields, 2, line_no)?,
        total_entries: field(&fields, 3, line_no)?,
        peak_height: field(&fields, 4, line_no)?,
        peak_time: field(&fields, 5, line_no)?,
        gaus: GaussParams {
            amplitude: field(&fields, 6, line_no)?,
            mean: field(&fields, 7, line_no)?,
            sigma: field(&fields, 8, line_no)?,
        },
        skew: SkewGaussParams {
            amplitude: field(&fields, 9, line_no)?,
            mean: field(&fields, 10, line_no)?,
            left_sigma: field(&fields, 11, line_no)?,
            right_sigma: field(&fields, 12, line_no)?,
        },
        bad_channels: field(&fields, 13, line_no)?,
    })
}
