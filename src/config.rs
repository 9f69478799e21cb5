use crate::error::{AppResult, ConfigError};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_FILE: &str = "waitlist.toml";

/// 程序配置文件
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 远程服务 ---
    /// 任务平台 API 地址
    pub waitlist_api_base_url: String,
    /// 验证码服务 API 地址
    pub captcha_api_base_url: String,
    /// 验证码服务 key
    pub captcha_api_key: String,
    /// 验证码所在页面
    pub captcha_website_url: String,
    /// 验证码 site key
    pub captcha_website_key: String,
    /// 每日验证码额度
    pub max_captcha_daily: u32,
    // --- 文件 ---
    pub tokens_file: String,
    pub proxies_file: String,
    pub quota_file: String,
    pub progress_file: String,
    // --- 节奏控制 ---
    /// 验证码轮询间隔（毫秒）
    pub captcha_poll_interval_ms: u64,
    /// 验证码最多轮询次数
    pub captcha_max_polls: u32,
    /// 两个任务之间的间隔（毫秒）
    pub task_delay_ms: u64,
    /// 两个账号之间的间隔（毫秒）
    pub account_delay_ms: u64,
    /// 下一轮最短等待（小时）
    pub sweep_delay_min_hours: u64,
    /// 下一轮最长等待（小时）
    pub sweep_delay_max_hours: u64,
    /// 倒计时日志间隔（秒）
    pub countdown_interval_secs: u64,
    /// HTTP 请求超时（秒）
    pub http_timeout_secs: u64,
    // --- 签到 ---
    pub check_in_enabled: bool,
    /// 签到任务标题匹配规则（正则）
    pub check_in_title_pattern: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            waitlist_api_base_url: "https://api.walme.io".to_string(),
            captcha_api_base_url: "https://api.2captcha.com".to_string(),
            captcha_api_key: String::new(),
            captcha_website_url: "https://waitlist.walme.io/".to_string(),
            captcha_website_key: String::new(),
            max_captcha_daily: 100,
            tokens_file: "tokens.txt".to_string(),
            proxies_file: "proxies.txt".to_string(),
            quota_file: "captcha_count_cache.json".to_string(),
            progress_file: "completed_tasks.json".to_string(),
            captcha_poll_interval_ms: 10_000,
            captcha_max_polls: 3,
            task_delay_ms: 1_000,
            account_delay_ms: 2_000,
            sweep_delay_min_hours: 20,
            sweep_delay_max_hours: 24,
            countdown_interval_secs: 600,
            http_timeout_secs: 30,
            check_in_enabled: true,
            check_in_title_pattern: r"(?i)daily\s*check[\s-]?in".to_string(),
            verbose_logging: false,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("waitlist_api_base_url", &self.waitlist_api_base_url)
            .field("captcha_api_base_url", &self.captcha_api_base_url)
            .field(
                "captcha_api_key",
                &if self.captcha_api_key.is_empty() { "<unset>" } else { "<redacted>" },
            )
            .field("captcha_website_url", &self.captcha_website_url)
            .field("max_captcha_daily", &self.max_captcha_daily)
            .field("tokens_file", &self.tokens_file)
            .field("proxies_file", &self.proxies_file)
            .field("sweep_delay_min_hours", &self.sweep_delay_min_hours)
            .field("sweep_delay_max_hours", &self.sweep_delay_max_hours)
            .field("check_in_enabled", &self.check_in_enabled)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// 加载配置：默认值 → TOML 文件（可选）→ 环境变量
    pub fn load() -> AppResult<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = if Path::new(&path).exists() {
            Self::from_toml_file(&path)?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides()?)
    }

    /// 从 TOML 文件读取配置，缺失的字段使用默认值
    pub fn from_toml_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::AppError::file_read_failed(path, e))?;
        Self::from_toml_str(&content, path)
    }

    pub fn from_toml_str(content: &str, path: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|source| {
            ConfigError::TomlParseFailed {
                path: path.to_string(),
                source,
            }
            .into()
        })
    }

    /// 只使用环境变量覆盖默认配置
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            waitlist_api_base_url: env_string("WAITLIST_API_BASE_URL", self.waitlist_api_base_url),
            captcha_api_base_url: env_string("CAPTCHA_API_BASE_URL", self.captcha_api_base_url),
            captcha_api_key: env_string("API_KEY_2CAPTCHA", self.captcha_api_key),
            captcha_website_url: env_string("CAPTCHA_URL", self.captcha_website_url),
            captcha_website_key: env_string("WEBSITE_KEY", self.captcha_website_key),
            max_captcha_daily: env_parse("MAX_CAPTCHA_NUM_DAILY", self.max_captcha_daily)?,
            tokens_file: env_string("TOKENS_FILE", self.tokens_file),
            proxies_file: env_string("PROXIES_FILE", self.proxies_file),
            quota_file: env_string("QUOTA_FILE", self.quota_file),
            progress_file: env_string("PROGRESS_FILE", self.progress_file),
            captcha_poll_interval_ms: env_parse("CAPTCHA_POLL_INTERVAL_MS", self.captcha_poll_interval_ms)?,
            captcha_max_polls: env_parse("CAPTCHA_MAX_POLLS", self.captcha_max_polls)?,
            task_delay_ms: env_parse("TASK_DELAY_MS", self.task_delay_ms)?,
            account_delay_ms: env_parse("ACCOUNT_DELAY_MS", self.account_delay_ms)?,
            sweep_delay_min_hours: env_parse("SWEEP_DELAY_MIN_HOURS", self.sweep_delay_min_hours)?,
            sweep_delay_max_hours: env_parse("SWEEP_DELAY_MAX_HOURS", self.sweep_delay_max_hours)?,
            countdown_interval_secs: env_parse("COUNTDOWN_INTERVAL_SECS", self.countdown_interval_secs)?,
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS", self.http_timeout_secs)?,
            check_in_enabled: env_parse("CHECK_IN_ENABLED", self.check_in_enabled)?,
            check_in_title_pattern: env_string("CHECK_IN_TITLE_PATTERN", self.check_in_title_pattern),
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging)?,
        })
    }
}

fn env_string(var_name: &str, default: String) -> String {
    std::env::var(var_name).unwrap_or(default)
}

fn env_parse<T: FromStr>(var_name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: std::any::type_name::<T>().to_string(),
        }),
        Err(_) => Ok(default),
    }
}
