//! 账号处理上下文
//!
//! 封装"我正在处理第几个账号、用哪个代理"这一信息

use crate::models::{AccessCredential, ProxyEndpoint};
use std::fmt::Display;

/// 账号处理上下文
#[derive(Debug, Clone)]
pub struct AccountCtx {
    /// 账号索引（从1开始，仅用于日志显示）
    pub account_index: usize,

    /// 账号 token
    pub credential: AccessCredential,

    /// 分配到的代理，`None` 表示直连
    pub proxy: Option<ProxyEndpoint>,
}

impl AccountCtx {
    pub fn new(account_index: usize, credential: AccessCredential, proxy: Option<ProxyEndpoint>) -> Self {
        Self {
            account_index,
            credential,
            proxy,
        }
    }
}

impl Display for AccountCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[账号 {}]", self.account_index)
    }
}
