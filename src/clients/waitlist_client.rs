//! 任务平台 API 客户端
//!
//! 封装个人资料、任务列表、完成任务三个接口，所有请求都带 Bearer token。

use crate::error::{ApiError, AppError, AppResult};
use crate::models::{AccessCredential, AccountProfile, Task, TaskId, TaskStatus};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::debug;

/// 完成任务后服务端返回的任务信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
}

/// 任务平台客户端（一个账号一个实例）
pub struct WaitlistClient {
    http: Client,
    base_url: String,
    credential: AccessCredential,
}

impl WaitlistClient {
    /// 创建新的任务平台客户端
    pub fn new(http: Client, base_url: &str, credential: AccessCredential) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
        }
    }

    /// 获取账号资料
    pub async fn fetch_profile(&self) -> AppResult<AccountProfile> {
        let endpoint = "/user/profile";
        let request = self.http.get(self.url(endpoint));
        self.send_json(request, endpoint).await
    }

    /// 获取完整任务列表
    pub async fn fetch_tasks(&self) -> AppResult<Vec<Task>> {
        let endpoint = "/waitlist/tasks";
        let request = self.http.get(self.url(endpoint));
        self.send_json(request, endpoint).await
    }

    /// 提交任务完成，附带验证码 token
    ///
    /// # 参数
    /// - `task_id`: 任务 ID
    /// - `recaptcha`: 验证码服务返回的 token
    pub async fn complete_task(&self, task_id: &TaskId, recaptcha: &str) -> AppResult<TaskUpdate> {
        let endpoint = format!("/waitlist/tasks/{}", task_id);
        let request = self
            .http
            .patch(self.url(&endpoint))
            .header("Recaptcha", recaptcha)
            .json(&json!({}));

        let body: Value = self.send_json(request, &endpoint).await?;

        Ok(TaskUpdate {
            title: body.get("title").and_then(Value::as_str).map(str::to_string),
            status: body.get("status").and_then(Value::as_str).map(TaskStatus::from),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// 发送请求并解析 JSON，非 2xx 时提取响应中的 message
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> AppResult<T> {
        debug!("请求 {} (token {})", endpoint, self.credential);

        let response = request
            .bearer_auth(self.credential.token())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        if !status.is_success() {
            return Err(ApiError::BadResponse {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message: extract_message(&text),
            }
            .into());
        }

        let body = if text.trim().is_empty() { "null" } else { text.as_str() };
        serde_json::from_str(body).map_err(|source| {
            ApiError::JsonParseFailed {
                endpoint: endpoint.to_string(),
                source,
            }
            .into()
        })
    }
}

/// 从错误响应中提取 message 字段
fn extract_message(text: &str) -> Option<String> {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|v| v.get("message").cloned())
        .map(|m| match m {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .or_else(|| {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| crate::utils::logging::truncate_text(trimmed, 200))
        })
}
