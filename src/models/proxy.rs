//! 代理端点描述

use crate::error::ProxyParseError;
use reqwest::{Proxy, Url};
use std::fmt;

/// 代理协议
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyProtocol {
    Http,
    Socks4,
    Socks5,
}

impl ProxyProtocol {
    /// 由 URL scheme 推断协议
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" | "https" => Some(ProxyProtocol::Http),
            "socks4" | "socks4a" => Some(ProxyProtocol::Socks4),
            "socks" | "socks5" | "socks5h" => Some(ProxyProtocol::Socks5),
            _ => None,
        }
    }

    pub fn scheme(self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Socks4 => "socks4",
            ProxyProtocol::Socks5 => "socks5",
        }
    }
}

/// 规范化后的代理端点
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyEndpoint {
    /// 构建 reqwest 代理（账号密码会被百分号编码进 URL）
    pub fn to_reqwest_proxy(&self) -> Result<Proxy, ProxyParseError> {
        let transport_failed = |message: String| ProxyParseError::TransportFailed {
            endpoint: self.to_string(),
            message,
        };

        let mut url = Url::parse(&format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port))
            .map_err(|e| transport_failed(e.to_string()))?;

        if let Some(username) = &self.username {
            url.set_username(username)
                .map_err(|_| transport_failed("无法设置代理用户名".to_string()))?;
            url.set_password(self.password.as_deref())
                .map_err(|_| transport_failed("无法设置代理密码".to_string()))?;
        }

        Proxy::all(url.as_str()).map_err(|e| transport_failed(e.to_string()))
    }
}

/// 显示时隐藏密码
impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.username {
            Some(user) => write!(
                f,
                "{}://{}:****@{}:{}",
                self.protocol.scheme(),
                user,
                self.host,
                self.port
            ),
            None => write!(f, "{}://{}:{}", self.protocol.scheme(), self.host, self.port),
        }
    }
}

impl fmt::Debug for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProxyEndpoint({})", self)
    }
}
