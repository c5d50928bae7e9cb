//! 历史文件存储
//!
//! 每次追加先在内存中组装完整文本，再以一次 `write_all` 追加到文件末尾，
//! 单个运行的失败不会留下半行。

use super::row::{self, HEADER};
use crate::core::run_summary::RunSummary;
use crate::error::LaserResult;
use std::collections::BTreeSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// 只追加的历史文件
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取全文；文件不存在视为空
    fn read_text(&self) -> LaserResult<String> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// 数据行（跳过表头和空行），附带1-based行号
    fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
        text.lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line))
            .filter(|(_, line)| !line.trim().is_empty() && !row::is_header(line))
    }

    /// 运行号是否已记录（找到第一条匹配即返回）
    pub fn exists(&self, run: u32) -> LaserResult<bool> {
        let text = self.read_text()?;
        Ok(Self::data_lines(&text).any(|(_, line)| {
            line.split_whitespace()
                .next()
                .and_then(|token| token.parse::<u32>().ok())
                == Some(run)
        }))
    }

    /// 全部已记录的运行号
    pub fn recorded_runs(&self) -> LaserResult<BTreeSet<u32>> {
        let text = self.read_text()?;
        Ok(Self::data_lines(&text)
            .filter_map(|(_, line)| line.split_whitespace().next()?.parse().ok())
            .collect())
    }

    /// 追加一行
    ///
    /// 文件不存在或为空时先写表头；文件末尾缺少换行时补一个。
    /// 不检查重复，调用方负责先调用 `exists`。
    pub fn append(&self, summary: &RunSummary) -> LaserResult<()> {
        let existing = self.read_text()?;

        let mut chunk = String::new();
        if existing.is_empty() {
            chunk.push_str(HEADER);
            chunk.push('\n');
        } else if !existing.ends_with('\n') {
            chunk.push('\n');
        }
        chunk.push_str(&row::format_row(summary));
        chunk.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(chunk.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// 按文件顺序读取全部行
    pub fn load_all(&self) -> LaserResult<Vec<RunSummary>> {
        let text = self.read_text()?;
        Self::data_lines(&text)
            .map(|(line_no, line)| row::parse_row(line, line_no))
            .collect()
    }

    /// 最大的已记录运行号
    pub fn last_run(&self) -> LaserResult<Option<u32>> {
        Ok(self.recorded_runs()?.last().copied())
    }
}
