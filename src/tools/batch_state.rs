//! 回填统计模块
//!
//! 回填时的统计管理，支持串行和并行两种提取模式。
//! 失败按错误类别归组，记录的是运行文件名。

use crate::error::ErrorCategory;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// 批处理统计快照
///
/// 包含追加成功/已记录跳过/失败计数和错误分类统计
#[derive(Debug, Clone, Default)]
pub struct BatchStatsSnapshot {
    /// 成功追加的运行数
    pub processed: usize,
    /// 已在历史文件中、被跳过的运行数
    pub duplicates: usize,
    /// 失败的运行数
    pub failed: usize,
    /// 错误分类统计（错误类型 -> 失败文件列表）
    pub error_stats: HashMap<ErrorCategory, Vec<String>>,
}

/// 串行回填统计
#[derive(Debug, Default)]
pub struct SerialBatchStats {
    processed: usize,
    duplicates: usize,
    failed: usize,
    error_stats: HashMap<ErrorCategory, Vec<String>>,
}

impl SerialBatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// 增加成功处理计数
    #[inline]
    pub fn inc_processed(&mut self) -> usize {
        self.processed += 1;
        self.processed
    }

    /// 增加重复（已记录）计数
    #[inline]
    pub fn inc_duplicate(&mut self) -> usize {
        self.duplicates += 1;
        self.duplicates
    }

    /// 增加失败计数并记录错误分类
    #[inline]
    pub fn inc_failed(&mut self, category: ErrorCategory, filename: String) -> usize {
        self.failed += 1;
        self.error_stats.entry(category).or_default().push(filename);
        self.failed
    }

    /// 获取统计快照
    pub fn snapshot(&self) -> BatchStatsSnapshot {
        BatchStatsSnapshot {
            processed: self.processed,
            duplicates: self.duplicates,
            failed: self.failed,
            error_stats: self.error_stats.clone(),
        }
    }
}

/// 并行回填统计
///
/// 克隆后共享同一份计数，工作线程各持一份
#[derive(Debug, Clone)]
pub struct ParallelBatchStats {
    processed: Arc<AtomicUsize>,
    duplicates: Arc<AtomicUsize>,
    failed: Arc<AtomicUsize>,
    error_stats: Arc<Mutex<HashMap<ErrorCategory, Vec<String>>>>,
}

impl ParallelBatchStats {
    pub fn new() -> Self {
        Self {
            processed: Arc::new(AtomicUsize::new(0)),
            duplicates: Arc::new(AtomicUsize::new(0)),
            failed: Arc::new(AtomicUsize::new(0)),
            error_stats: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// 增加成功处理计数（线程安全）
    #[inline]
    pub fn inc_processed(&self) -> usize {
        self.processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 增加重复（已记录）计数（线程安全）
    #[inline]
    pub fn inc_duplicate(&self) -> usize {
        self.duplicates.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 增加失败计数并记录错误分类（线程安全）
    pub fn inc_failed(&self, category: ErrorCategory, filename: String) -> usize {
        let count = self.failed.fetch_add(1, Ordering::Relaxed) + 1;

        // 更新错误分类统计（需要锁）
        if let Ok(mut stats) = self.error_stats.lock() {
            stats.entry(category).or_default().push(filename);
        }

        count
    }

    /// 获取统计快照（线程安全）
    pub fn snapshot(&self) -> BatchStatsSnapshot {
        BatchStatsSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            error_stats: self
                .error_stats
                .lock()
                .map(|stats| stats.clone())
                .unwrap_or_default(),
        }
    }
}

impl Default for ParallelBatchStats {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchStatsSnapshot {
    /// 扫描到的运行总数
    #[inline]
    pub fn total(&self) -> usize {
        self.processed + self.duplicates + self.failed
    }

    /// 按类别名排序的失败列表（输出稳定）
    pub fn sorted_failures(&self) -> Vec<(ErrorCategory, Vec<String>)> {
        let mut entries: Vec<_> = self
            .error_stats
            .iter()
            .map(|(category, names)| (*category, names.clone()))
            .collect();
        entries.sort_by_key(|(category, _)| category.display_name());
        entries
    }
}
