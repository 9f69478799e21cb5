use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（致命）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 代理解析错误
    #[error("代理错误: {0}")]
    Proxy(#[from] ProxyParseError),
    /// 远程 API 调用错误
    #[error("API错误: {0}")]
    Api(#[from] ApiError),
    /// 验证码服务错误
    #[error("验证码错误: {0}")]
    Captcha(#[from] CaptchaError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
}

impl AppError {
    /// 是否为必须终止整个进程的错误
    ///
    /// 缺少验证码 key、没有任何账号、当日额度耗尽属于致命错误，
    /// 其余错误只影响单个账号或单个任务。
    pub fn is_fatal(&self) -> bool {
        match self {
            AppError::Config(_) => true,
            AppError::Captcha(e) => e.is_fatal(),
            _ => false,
        }
    }

    /// 创建API请求失败错误
    pub fn api_request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 未配置验证码服务 key
    #[error("未设置验证码服务 API key，请配置环境变量 API_KEY_2CAPTCHA")]
    MissingCaptchaKey,
    /// 没有可用的账号 token
    #[error("在 {path} 中没有找到任何 token")]
    NoCredentials { path: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 签到标题匹配规则无效
    #[error("签到任务标题规则无效: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// 代理字符串解析错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyParseError {
    /// 没有任何格式匹配
    #[error("无法识别的代理格式: {spec}")]
    UnrecognizedFormat { spec: String },
    /// 不支持的协议
    #[error("不支持的代理协议 '{scheme}': {spec}")]
    UnsupportedScheme { scheme: String, spec: String },
    /// 端口无效
    #[error("代理端口无效 '{port}': {spec}")]
    InvalidPort { port: String, spec: String },
    /// 无法构建代理传输层
    #[error("无法构建代理客户端 ({endpoint}): {message}")]
    TransportFailed { endpoint: String, message: String },
}

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// API 返回错误响应
    #[error("API返回错误响应 ({endpoint}): status={status}, message={message:?}")]
    BadResponse {
        endpoint: String,
        status: u16,
        message: Option<String>,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({endpoint}): {source}")]
    JsonParseFailed {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 验证码服务错误
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// 当日验证码额度已用完（致命）
    #[error("{date} 验证码额度已用完: {used}/{limit}")]
    QuotaExceeded { date: String, used: u32, limit: u32 },
    /// 创建任务失败
    #[error("创建验证码任务失败: {message}")]
    CreateFailed { message: String },
    /// 服务端报告任务出错
    #[error("验证码任务 {task_id} 失败: {message}")]
    JobFailed { task_id: String, message: String },
    /// 轮询次数用完仍在处理中
    #[error("验证码任务 {task_id} 在 {polls} 次轮询后仍未完成")]
    PollExhausted { task_id: String, polls: u32 },
    /// 底层请求失败
    #[error(transparent)]
    Transport(#[from] ApiError),
}

impl CaptchaError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, CaptchaError::QuotaExceeded { .. })
    }
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 序列化失败
    #[error("序列化失败 ({path}): {source}")]
    SerializeFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
