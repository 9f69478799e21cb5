//! 任务进度持久化 - 业务能力层
//!
//! 按邮箱记录每个账号已完成的任务 ID 和签到日期。
//! 文件格式：`{email: {tasks: {id: true}, checkInDays: {date: true}}}`

use crate::error::FileError;
use crate::models::TaskId;
use crate::utils::json_file::{read_json_or_default, write_json_atomic};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::info;

/// 连续签到最多记录的天数
pub const MAX_CHECK_IN_DAYS: usize = 7;

/// 所有账号的进度，键为邮箱
pub type ProgressMap = BTreeMap<String, ProgressRecord>;

/// 单个账号的进度
///
/// 任务 ID 一旦写入就不会再被提交。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(rename = "tasks", default, with = "true_set")]
    completed_task_ids: BTreeSet<String>,
    #[serde(rename = "checkInDays", default, with = "true_set")]
    check_in_days: BTreeSet<NaiveDate>,
}

impl ProgressRecord {
    pub fn is_completed(&self, id: &TaskId) -> bool {
        self.completed_task_ids.contains(id.as_str())
    }

    /// 记录完成的任务，返回是否为新记录
    pub fn mark_completed(&mut self, id: &TaskId) -> bool {
        self.completed_task_ids.insert(id.as_str().to_string())
    }

    pub fn completed_count(&self) -> usize {
        self.completed_task_ids.len()
    }

    pub fn has_checked_in(&self, day: NaiveDate) -> bool {
        self.check_in_days.contains(&day)
    }

    /// 当天是否还可以签到：当天未签且未满 7 天
    pub fn can_check_in(&self, day: NaiveDate) -> bool {
        !self.has_checked_in(day) && self.check_in_days.len() < MAX_CHECK_IN_DAYS
    }

    pub fn record_check_in(&mut self, day: NaiveDate) -> bool {
        if !self.can_check_in(day) {
            return false;
        }
        self.check_in_days.insert(day)
    }

    pub fn check_in_count(&self) -> usize {
        self.check_in_days.len()
    }
}

/// 进度文件读写
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取全部进度，文件缺失或损坏时返回空表，不会报错
    pub async fn load(&self) -> ProgressMap {
        let map: ProgressMap = read_json_or_default(&self.path).await;
        info!("📂 已加载 {} 个账号的任务进度", map.len());
        map
    }

    /// 整体覆盖保存
    pub async fn save(&self, progress: &ProgressMap) -> Result<(), FileError> {
        write_json_atomic(&self.path, progress).await?;
        info!("💾 任务进度已保存: {} 个账号", progress.len());
        Ok(())
    }
}

/// `BTreeSet<K>` 与 `{K: true}` 之间的转换，值为 false 的键视为不存在
mod true_set {
    use serde::de::DeserializeOwned;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::{BTreeMap, BTreeSet};

    pub fn serialize<K, S>(set: &BTreeSet<K>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(set.len()))?;
        for key in set {
            map.serialize_entry(key, &true)?;
        }
        map.end()
    }

    pub fn deserialize<'de, K, D>(deserializer: D) -> Result<BTreeSet<K>, D::Error>
    where
        K: DeserializeOwned + Ord,
        D: Deserializer<'de>,
    {
        let map = BTreeMap::<K, bool>::deserialize(deserializer)?;
        Ok(map.into_iter().filter(|(_, v)| *v).map(|(k, _)| k).collect())
    }
}
