//! JSON运行文件读取
//!
//! 文件名：`Run<运行号，6位补零>_laser_calibrations_validate_c18.json`
//!
//! ```json
//! { "run": 50000, "n_live_pmts": 1800, "tt8_events": 1000000,
//!   "histogram": { "channels": 2240, "time_bins": 501,
//!                  "time_min": 499.5, "time_max": 1000.5,
//!                  "counts": [ ... ] } }
//! ```
//!
//! `counts` 按通道主序存放（通道1的全部时间bin，然后通道2 ...）。
//! `run` 字段可省略；存在时必须与请求的运行号一致。

use super::{RunData, RunMetadata, RunSource};
use crate::core::histogram::{Histogram2D, TimeAxis};
use crate::error::{LaserError, LaserResult};
use crate::tools::constants::defaults;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// 运行文件名
pub fn run_file_name(run: u32) -> String {
    format!("Run{run:06}{}", defaults::RUN_FILE_SUFFIX)
}

/// 从文件名解析运行号，不匹配命名规则时返回None
pub fn parse_run_file_name(name: &str) -> Option<u32> {
    let digits = name
        .strip_prefix("Run")?
        .strip_suffix(defaults::RUN_FILE_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// 直方图在运行文件中的表示
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramRecord {
    pub channels: usize,
    pub time_bins: usize,
    pub time_min: f64,
    pub time_max: f64,
    pub counts: Vec<u32>,
}

/// 运行文件的磁盘表示
///
/// 字段全部可选，缺失字段在转换时报告为 `MissingObject`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunFileRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<u32>,
    #[serde(default)]
    pub n_live_pmts: Option<u32>,
    #[serde(default)]
    pub tt8_events: Option<u64>,
    #[serde(default)]
    pub histogram: Option<HistogramRecord>,
}

impl RunFileRecord {
    /// 从内存中的运行数据构建
    pub fn from_run_data(data: &RunData) -> Self {
        let axis = data.histogram.time_axis();
        Self {
            run: Some(data.run),
            n_live_pmts: Some(data.metadata.n_live_pmts),
            tt8_events: Some(data.metadata.tt8_events),
            histogram: Some(HistogramRecord {
                channels: data.histogram.channels(),
                time_bins: axis.bins(),
                time_min: axis.min(),
                time_max: axis.max(),
                counts: data.histogram.counts().to_vec(),
            }),
        }
    }

    /// 读取运行文件
    pub fn read(path: &Path) -> LaserResult<Self> {
        let file = File::open(path).map_err(|e| {
            LaserError::IoError(std::io::Error::new(
                e.kind(),
                format!("无法打开运行文件 {}: {e}", path.display()),
            ))
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// 写出运行文件
    pub fn write(&self, path: &Path) -> LaserResult<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// 校验并转换为 `RunData`
    ///
    /// `expected_run` 为请求的运行号；文件内记录的运行号不一致时报错。
    pub fn into_run_data(self, expected_run: u32) -> LaserResult<RunData> {
        if let Some(recorded) = self.run
            && recorded != expected_run
        {
            return Err(LaserError::FormatError(format!(
                "运行号不一致: 请求 {expected_run}，文件记录 {recorded}"
            )));
        }

        let n_live_pmts = self
            .n_live_pmts
            .ok_or_else(|| LaserError::MissingObject("n_live_pmts".to_string()))?;
        let tt8_events = self
            .tt8_events
            .ok_or_else(|| LaserError::MissingObject("tt8_events".to_string()))?;
        let record = self
            .histogram
            .ok_or_else(|| LaserError::MissingObject("histogram".to_string()))?;

        let axis = TimeAxis::new(record.time_bins, record.time_min, record.time_max)?;
        let histogram = Histogram2D::new(record.channels, axis, record.counts)?;

        Ok(RunData {
            run: expected_run,
            metadata: RunMetadata {
                n_live_pmts,
                tt8_events,
            },
            histogram,
        })
    }
}

/// 从数据目录读取JSON运行文件
#[derive(Debug, Clone)]
pub struct JsonRunSource {
    data_dir: PathBuf,
}

impl JsonRunSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// 读取任意路径的运行文件（回填扫描使用）
    pub fn load_path(path: &Path, run: u32) -> LaserResult<RunData> {
        RunFileRecord::read(path)?.into_run_data(run)
    }
}

impl RunSource for JsonRunSource {
    fn name(&self) -> &'static str {
        "json"
    }

    fn locate(&self, run: u32) -> PathBuf {
        self.data_dir.join(run_file_name(run))
    }

    fn load(&self, run: u32) -> LaserResult<RunData> {
        Self::load_path(&self.locate(run), run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "laser_json_source_{tag}_{}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn small_record(run: Option<u32>) -> RunFileRecord {
        RunFileRecord {
            run,
            n_live_pmts: Some(1800),
            tt8_events: Some(1_000_000),
            histogram: Some(HistogramRecord {
                channels: 2,
                time_bins: 3,
                time_min: 0.0,
                time_max: 3.0,
                counts: vec![1, 2, 3, 4, 5, 6],
            }),
        }
    }

    #[test]
    fn test_file_name_padding() {
        assert_eq!(
            run_file_name(8892),
            "Run008892_laser_calibrations_validate_c18.json"
        );
        assert_eq!(
            run_file_name(1234567),
            "Run1234567_laser_calibrations_validate_c18.json"
        );
    }

    #[test]
    fn test_parse_file_name() {
        assert_eq!(
            parse_run_file_name("Run050000_laser_calibrations_validate_c18.json"),
            Some(50000)
        );
        assert_eq!(parse_run_file_name("Run_laser_calibrations_validate_c18.json"), None);
        assert_eq!(parse_run_file_name("Run05a000_laser_calibrations_validate_c18.json"), None);
        assert_eq!(parse_run_file_name("Run050000_laser_calibrations_validate_c18.root"), None);
    }

    #[test]
    fn test_round_trip_through_source() {
        let dir = temp_dir("roundtrip");
        let source = JsonRunSource::new(&dir);
        small_record(Some(777)).write(&source.locate(777)).unwrap();

        let data = source.load(777).unwrap();
        assert_eq!(data.run, 777);
        assert_eq!(data.metadata.n_live_pmts, 1800);
        assert_eq!(data.metadata.tt8_events, 1_000_000);
        assert_eq!(data.histogram.channels(), 2);
        assert_eq!(data.histogram.projection().integral(), 21.0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = JsonRunSource::new(temp_dir("missing"));
        let result = source.load(424242);
        assert!(matches!(result, Err(LaserError::IoError(_))));
    }

    #[test]
    fn test_missing_histogram_is_missing_object() {
        let mut record = small_record(None);
        record.histogram = None;
        let result = record.into_run_data(1);
        assert!(matches!(result, Err(LaserError::MissingObject(_))));
    }

    #[test]
    fn test_run_number_mismatch() {
        let result = small_record(Some(5)).into_run_data(6);
        assert!(matches!(result, Err(LaserError::FormatError(_))));
        assert!(small_record(None).into_run_data(6).is_ok());
    }

    #[test]
    fn test_inconsistent_dimensions() {
        let mut record = small_record(None);
        if let Some(h) = record.histogram.as_mut() {
            h.counts.pop();
        }
        assert!(matches!(
            record.into_run_data(1),
            Err(LaserError::FormatError(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_format_error() {
        let dir = temp_dir("malformed");
        let path = dir.join(run_file_name(9));
        std::fs::write(&path, "{ not json").unwrap();
        let result = JsonRunSource::load_path(&path, 9);
        assert!(matches!(result, Err(LaserError::FormatError(_))));
        std::fs::remove_dir_all(&dir).ok();
    }
}
