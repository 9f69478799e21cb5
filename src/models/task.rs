//! 任务数据结构
//!
//! 任务由服务端维护，本程序只读取，唯一的副作用是完成任务的 PATCH 调用。

use serde::{Deserialize, Deserializer};
use std::fmt;

/// 任务 ID
///
/// 服务端可能返回数字或字符串，统一规范化为字符串。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => TaskId(n.to_string()),
            RawId::Text(s) => TaskId(s),
        })
    }
}

/// 任务状态
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    New,
    Started,
    Completed,
    Failed,
    /// 未知状态，保留原值
    Other(String),
}

impl TaskStatus {
    /// 已开始、已完成、已失败的任务不再处理
    pub fn is_settled(&self) -> bool {
        matches!(self, TaskStatus::Started | TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl From<&str> for TaskStatus {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "new" => TaskStatus::New,
            "started" => TaskStatus::Started,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::Other(value.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|s| TaskStatus::from(s.as_str())).unwrap_or_default())
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::New => f.write_str("new"),
            TaskStatus::Started => f.write_str("started"),
            TaskStatus::Completed => f.write_str("completed"),
            TaskStatus::Failed => f.write_str("failed"),
            TaskStatus::Other(s) => f.write_str(s),
        }
    }
}

/// 平台任务
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: TaskStatus,
    /// 子任务，需要逐个完成
    #[serde(default, rename = "child")]
    pub children: Option<Vec<Task>>,
}

impl Task {
    pub fn has_children(&self) -> bool {
        self.children.as_ref().is_some_and(|c| !c.is_empty())
    }

    pub fn children(&self) -> &[Task] {
        self.children.as_deref().unwrap_or(&[])
    }
}
