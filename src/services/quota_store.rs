//! 验证码额度记录 - 业务能力层
//!
//! 按自然日（本地时区）记录验证码成功次数，跨进程重启保留。

use crate::error::FileError;
use crate::utils::json_file::{read_json_or_default, write_json_atomic};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// 日期 → 当日成功次数
///
/// 同一天内计数只增不减，新的日期从 0 开始。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotaRecord {
    counts: BTreeMap<NaiveDate, u32>,
}

impl QuotaRecord {
    /// 指定日期的已用次数
    pub fn count_for(&self, date: NaiveDate) -> u32 {
        self.counts.get(&date).copied().unwrap_or(0)
    }

    /// 记录一次成功，返回当日新的计数
    pub fn increment(&mut self, date: NaiveDate) -> u32 {
        let count = self.counts.entry(date).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }
}

/// 额度记录的持久化
pub struct QuotaStore {
    path: PathBuf,
}

impl QuotaStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取记录，文件缺失或损坏时返回空记录
    pub async fn load(&self) -> QuotaRecord {
        read_json_or_default(&self.path).await
    }

    pub async fn save(&self, record: &QuotaRecord) -> Result<(), FileError> {
        write_json_atomic(&self.path, record).await
    }
}
