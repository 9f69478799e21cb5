//! 验证码服务 API 客户端
//!
//! 只负责 createTask / getTaskResult 两个接口的收发，不关心额度和重试。

use crate::error::{ApiError, CaptchaError};
use crate::models::ProxyEndpoint;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// 带代理的任务类型
pub const TASK_TYPE_PROXY: &str = "RecaptchaV2Task";
/// 不带代理的任务类型
pub const TASK_TYPE_PROXYLESS: &str = "RecaptchaV2TaskProxyless";

/// createTask 请求中的 task 字段
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaTaskRequest {
    #[serde(rename = "type")]
    pub task_type: String,
    #[serde(rename = "websiteURL")]
    pub website_url: String,
    pub website_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy_password: Option<String>,
}

impl CaptchaTaskRequest {
    /// 构建任务参数，有代理时让验证码服务走同一个出口
    pub fn new(website_url: &str, website_key: &str, proxy: Option<&ProxyEndpoint>) -> Self {
        match proxy {
            Some(ep) => Self {
                task_type: TASK_TYPE_PROXY.to_string(),
                website_url: website_url.to_string(),
                website_key: website_key.to_string(),
                proxy_type: Some(ep.protocol.scheme().to_string()),
                proxy_address: Some(ep.host.clone()),
                proxy_port: Some(ep.port),
                proxy_login: ep.username.clone(),
                proxy_password: ep.password.clone(),
            },
            None => Self {
                task_type: TASK_TYPE_PROXYLESS.to_string(),
                website_url: website_url.to_string(),
                website_key: website_key.to_string(),
                proxy_type: None,
                proxy_address: None,
                proxy_port: None,
                proxy_login: None,
                proxy_password: None,
            },
        }
    }
}

/// 一次 getTaskResult 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPoll {
    Processing,
    Ready { token: String },
    Failed { message: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskResponse {
    #[serde(default)]
    error_id: i64,
    #[serde(default)]
    task_id: Option<Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskResultResponse {
    #[serde(default)]
    error_id: i64,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    solution: Option<Solution>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Solution {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "gRecaptchaResponse")]
    g_recaptcha_response: Option<String>,
}

/// 验证码服务客户端
pub struct CaptchaClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl CaptchaClient {
    pub fn new(http: Client, base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// 创建验证码任务，返回任务 ID
    pub async fn create_task(&self, task: &CaptchaTaskRequest) -> Result<String, CaptchaError> {
        let body = json!({
            "clientKey": self.api_key,
            "task": task,
        });

        let response: CreateTaskResponse = self.post("/createTask", &body).await?;

        if response.error_id != 0 {
            return Err(CaptchaError::CreateFailed {
                message: describe_error(response.error_code, response.error_description),
            });
        }

        match response.task_id {
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::String(s)) if !s.is_empty() => Ok(s),
            _ => Err(CaptchaError::CreateFailed {
                message: "响应中没有 taskId".to_string(),
            }),
        }
    }

    /// 查询任务结果
    pub async fn get_task_result(&self, task_id: &str) -> Result<JobPoll, CaptchaError> {
        // 服务端的 taskId 是数字，原样回传
        let id_value = task_id
            .parse::<u64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(task_id));
        let body = json!({
            "clientKey": self.api_key,
            "taskId": id_value,
        });

        let response: TaskResultResponse = self.post("/getTaskResult", &body).await?;
        Ok(interpret_result(response))
    }

    async fn post<T: DeserializeOwned>(&self, endpoint: &str, body: &Value) -> Result<T, CaptchaError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("验证码服务请求: {}", endpoint);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::RequestFailed {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::BadResponse {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message: response.text().await.ok(),
            }
            .into());
        }

        let text = response.text().await.map_err(|source| ApiError::RequestFailed {
            endpoint: endpoint.to_string(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|source| {
            ApiError::JsonParseFailed {
                endpoint: endpoint.to_string(),
                source,
            }
            .into()
        })
    }
}

fn interpret_result(response: TaskResultResponse) -> JobPoll {
    if response.error_id != 0 {
        return JobPoll::Failed {
            message: describe_error(response.error_code, response.error_description),
        };
    }

    match response.status.as_deref() {
        Some("processing") => JobPoll::Processing,
        Some("ready") => {
            let token = response
                .solution
                .and_then(|s| s.token.or(s.g_recaptcha_response))
                .filter(|t| !t.is_empty());
            match token {
                Some(token) => JobPoll::Ready { token },
                None => JobPoll::Failed {
                    message: "状态为 ready 但没有 token".to_string(),
                },
            }
        }
        Some("error") => JobPoll::Failed {
            message: describe_error(response.error_code, response.error_description),
        },
        other => JobPoll::Failed {
            message: format!("未知状态: {:?}", other),
        },
    }
}

fn describe_error(code: Option<String>, description: Option<String>) -> String {
    match (code, description) {
        (Some(code), Some(desc)) => format!("{}: {}", code, desc),
        (Some(code), None) => code,
        (None, Some(desc)) => desc,
        (None, None) => "未知错误".to_string(),
    }
}
