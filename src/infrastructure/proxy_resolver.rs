//! 代理解析 - 基础设施层
//!
//! 把各种格式的代理字符串解析成统一的 [`ProxyEndpoint`]，不做任何网络请求。
//!
//! 支持的格式（按顺序尝试，先匹配先得）：
//! 1. `scheme://[user:pass@]host:port`
//! 2. `host:port`
//! 3. `host:port:user:pass`
//! 4. `user:pass@host:port`

use crate::error::{ConfigError, ProxyParseError};
use crate::models::{ProxyEndpoint, ProxyProtocol};
use regex::{Captures, Regex};

/// 单一格式的解析策略
struct ProxyGrammar {
    name: &'static str,
    pattern: Regex,
}

impl ProxyGrammar {
    fn new(name: &'static str, pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
        })
    }
}

/// 代理解析器
pub struct ProxyResolver {
    grammars: Vec<ProxyGrammar>,
}

impl ProxyResolver {
    pub fn new() -> Result<Self, ConfigError> {
        let grammars = vec![
            ProxyGrammar::new(
                "url",
                r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://(?:(?P<user>[^:@/]+)(?::(?P<pass>[^@/]*))?@)?(?P<host>[^:@/]+):(?P<port>[^:@/]+)/?$",
            )?,
            ProxyGrammar::new("host_port", r"^(?P<host>[^:@/]+):(?P<port>[^:@/]+)$")?,
            ProxyGrammar::new(
                "host_port_user_pass",
                r"^(?P<host>[^:@/]+):(?P<port>[^:@/]+):(?P<user>[^:@/]+):(?P<pass>[^:]+)$",
            )?,
            ProxyGrammar::new(
                "user_pass_at_host_port",
                r"^(?P<user>[^:@/]+):(?P<pass>[^@/]+)@(?P<host>[^:@/]+):(?P<port>[^:@/]+)$",
            )?,
        ];

        Ok(Self { grammars })
    }

    /// 解析代理字符串
    pub fn resolve(&self, spec: &str) -> Result<ProxyEndpoint, ProxyParseError> {
        let spec = spec.trim();

        let (grammar, caps) = self
            .grammars
            .iter()
            .find_map(|g| g.pattern.captures(spec).map(|caps| (g, caps)))
            .ok_or_else(|| ProxyParseError::UnrecognizedFormat {
                spec: spec.to_string(),
            })?;

        tracing::debug!("代理 '{}' 匹配格式: {}", mask_proxy_spec(spec), grammar.name);

        let protocol = match caps.name("scheme") {
            Some(scheme) => ProxyProtocol::from_scheme(scheme.as_str()).ok_or_else(|| {
                ProxyParseError::UnsupportedScheme {
                    scheme: scheme.as_str().to_string(),
                    spec: spec.to_string(),
                }
            })?,
            None => ProxyProtocol::Http,
        };

        let port_text = capture(&caps, "port").unwrap_or_default();
        let port = port_text
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| ProxyParseError::InvalidPort {
                port: port_text.clone(),
                spec: spec.to_string(),
            })?;

        let username = capture(&caps, "user");
        let password = username.as_ref().and(capture(&caps, "pass"));

        Ok(ProxyEndpoint {
            protocol,
            host: capture(&caps, "host").unwrap_or_default(),
            port,
            username,
            password,
        })
    }
}

fn capture(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name)
        .map(|m| m.as_str().to_string())
        .filter(|s| !s.is_empty())
}

/// 日志中隐藏代理密码
pub fn mask_proxy_spec(spec: &str) -> String {
    let scheme_end = spec.find("://").map(|i| i + 3);

    // host:port:user:pass
    let parts: Vec<&str> = spec.split(':').collect();
    if scheme_end.is_none() && parts.len() == 4 {
        return format!("{}:{}:{}:****", parts[0], parts[1], parts[2]);
    }

    if let Some(at) = spec.rfind('@') {
        let (auth, rest) = spec.split_at(at);
        let user_start = scheme_end.unwrap_or(0).min(auth.len());
        return match auth[user_start..].find(':') {
            Some(colon) => format!("{}:****{}", &auth[..user_start + colon], rest),
            None => spec.to_string(),
        };
    }

    spec.to_string()
}
