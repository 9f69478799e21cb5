//! HTTP 客户端构建 - 基础设施层
//!
//! 每个账号一个 `reqwest::Client`，代理在这里挂载。

use crate::error::ProxyParseError;
use crate::models::ProxyEndpoint;
use reqwest::Client;
use std::time::Duration;

/// 构建 HTTP 客户端，`proxy` 为 `None` 时直连
pub fn build_client(
    proxy: Option<&ProxyEndpoint>,
    timeout: Duration,
) -> Result<Client, ProxyParseError> {
    let builder = Client::builder().timeout(timeout);

    let builder = match proxy {
        Some(endpoint) => builder.proxy(endpoint.to_reqwest_proxy()?),
        // 直连时也忽略系统代理环境变量
        None => builder.no_proxy(),
    };

    builder.build().map_err(|e| ProxyParseError::TransportFailed {
        endpoint: proxy.map(|p| p.to_string()).unwrap_or_else(|| "direct".to_string()),
        message: e.to_string(),
    })
}

/// 构建直连客户端
pub fn build_direct_client(timeout: Duration) -> Result<Client, ProxyParseError> {
    build_client(None, timeout)
}
