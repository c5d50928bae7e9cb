//! 输出格式化模块
//!
//! 负责单运行汇总和趋势视图的文本输出。

use super::trend::TrendReport;
use crate::core::run_summary::RunSummary;
use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL};

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");

const SEPARATOR: &str =
    "--------------------------------------------------------------------------------\n";

/// 报告头部（工具版本 + 生成时间）
pub fn create_report_header(title: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("Laser Validation Tool v{VERSION} / {title}\n"));
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    output.push_str(&format!("log date: {now}\n"));
    output.push_str(SEPARATOR);
    output
}

fn right(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

/// 单运行汇总表
pub fn format_run_summary(s: &RunSummary) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Quantity / 量", "Value / 值"]);

    let rows: [(&str, String); 14] = [
        ("Run / 运行号", s.run.to_string()),
        ("Live PMTs / 活跃PMT", s.n_live_pmts.to_string()),
        ("TT8 events / TT8事件", s.tt8_events.to_string()),
        ("Entries / 总条目", s.total_entries.to_string()),
        ("Peak height / 峰高", format!("{:.0}", s.peak_height)),
        ("Peak time / 峰值时间", format!("{:.2}", s.peak_time)),
        ("Gaus A", format!("{:.1}", s.gaus.amplitude)),
        ("Gaus mean", format!("{:.3}", s.gaus.mean)),
        ("Gaus sigma", format!("{:.3}", s.gaus.sigma)),
        ("Skew N", format!("{:.1}", s.skew.amplitude)),
        ("Skew mean", format!("{:.3}", s.skew.mean)),
        ("Skew left sigma", format!("{:.3}", s.skew.left_sigma)),
        ("Skew right sigma", format!("{:.3}", s.skew.right_sigma)),
        ("Bad channels / 坏通道", s.bad_channels.to_string()),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), right(value)]);
    }

    table.to_string()
}

fn optional(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4e}"),
        None => "-".to_string(),
    }
}

/// 趋势视图（表格 + 窗口内的操作标记）
pub fn format_trend_report(report: &TrendReport) -> String {
    let mut output = create_report_header("Laser trend / 激光趋势");
    output.push_str(&format!(
        "运行窗口 / Run window: {} .. {}\n\n",
        report.window.from, report.window.to
    ));

    if report.points.is_empty() {
        output.push_str("[INFO] 窗口内没有记录 / No recorded runs in window\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            "Run",
            "Gaus σ",
            "Skew σL",
            "Skew σR",
            "Intensity (total)",
            "Intensity (peak)",
            "Bad ch.",
        ]);

        for p in &report.points {
            let bad = right(p.bad_channels.to_string());
            let bad = if p.highlighted {
                bad.fg(Color::Red)
            } else {
                bad
            };
            table.add_row(vec![
                Cell::new(p.run),
                right(format!("{:.3}", p.gaus_sigma)),
                right(format!("{:.3}", p.skew_left_sigma)),
                right(format!("{:.3}", p.skew_right_sigma)),
                right(optional(p.intensity_total)),
                right(optional(p.intensity_peak)),
                bad,
            ]);
        }

        output.push_str(&table.to_string());
        output.push('\n');
        output.push_str(&format!(
            "坏通道数 > {} 的运行 / Runs above bad-channel threshold: {}\n",
            report.highlight_threshold,
            report.highlighted_count()
        ));
    }

    if !report.markers.is_empty() {
        output.push('\n');
        output.push_str("操作标记 / Markers:\n");
        for marker in &report.markers {
            output.push_str(&format!("   {:>6}  {}\n", marker.run, marker.label));
        }
    }

    output
}
