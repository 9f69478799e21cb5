//! 账号相关数据结构

use serde::Deserialize;
use std::fmt;

/// 账号访问凭证（Bearer token）
///
/// 只在进程启动时加载一次，日志中只显示掩码后的前缀。
#[derive(Clone, PartialEq, Eq)]
pub struct AccessCredential(String);

impl AccessCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// 原始 token，仅用于构造 Authorization 头
    pub fn token(&self) -> &str {
        &self.0
    }

    /// 日志用的掩码形式
    pub fn masked(&self) -> String {
        let prefix: String = self.0.chars().take(6).collect();
        format!("{}****", prefix)
    }
}

impl fmt::Debug for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessCredential({})", self.masked())
    }
}

impl fmt::Display for AccessCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// 账号资料，每轮重新获取，不持久化
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountProfile {
    pub email: String,
    #[serde(default)]
    pub nickname: Option<String>,
}
