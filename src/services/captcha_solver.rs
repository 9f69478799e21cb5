//! 验证码求解服务 - 业务能力层
//!
//! 负责"解一个验证码"的完整过程：
//! 1. 前置检查：验证码服务 key、当日额度（任一不满足都是致命错误）
//! 2. CREATE：提交任务，拿到任务 ID（失败不重试）
//! 3. POLL：最多轮询 N 次，每次先等待固定间隔
//! 4. 成功后当日额度 +1 并立即落盘
//!
//! 额度记录由本服务独占持有。

use crate::clients::{CaptchaClient, CaptchaTaskRequest, JobPoll};
use crate::config::Config;
use crate::error::{AppResult, CaptchaError, ConfigError};
use crate::models::ProxyEndpoint;
use crate::services::quota_store::{QuotaRecord, QuotaStore};
use crate::utils::time::today;
use chrono::NaiveDate;
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// 验证码所在页面信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeContext {
    pub website_url: String,
    pub website_key: String,
}

impl ChallengeContext {
    pub fn from_config(config: &Config) -> Self {
        Self {
            website_url: config.captcha_website_url.clone(),
            website_key: config.captcha_website_key.clone(),
        }
    }
}

/// 求解节奏与额度设置
#[derive(Debug, Clone, Copy)]
pub struct SolverSettings {
    pub daily_limit: u32,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl SolverSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            daily_limit: config.max_captcha_daily,
            poll_interval: Duration::from_millis(config.captcha_poll_interval_ms),
            max_polls: config.captcha_max_polls,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobStatus {
    Processing,
    Ready,
    Error,
}

/// 一次求解过程中的任务状态，只在 solve 调用期间存在
#[derive(Debug)]
struct CaptchaJob {
    external_id: String,
    status: JobStatus,
    solution_token: Option<String>,
    failure: Option<String>,
    remaining_polls: u32,
}

impl CaptchaJob {
    fn new(external_id: String, max_polls: u32) -> Self {
        Self {
            external_id,
            status: JobStatus::Processing,
            solution_token: None,
            failure: None,
            remaining_polls: max_polls,
        }
    }

    fn apply(&mut self, poll: JobPoll) {
        match poll {
            JobPoll::Processing => {}
            JobPoll::Ready { token } => {
                self.status = JobStatus::Ready;
                self.solution_token = Some(token);
            }
            JobPoll::Failed { message } => {
                self.status = JobStatus::Error;
                self.failure = Some(message);
            }
        }
    }
}

/// 验证码求解服务
pub struct CaptchaSolver {
    client: CaptchaClient,
    quota: QuotaRecord,
    quota_store: QuotaStore,
    settings: SolverSettings,
}

impl CaptchaSolver {
    /// 创建求解服务，额度记录从磁盘加载
    pub async fn new(client: CaptchaClient, quota_store: QuotaStore, settings: SolverSettings) -> Self {
        let quota = quota_store.load().await;
        Self {
            client,
            quota,
            quota_store,
            settings,
        }
    }

    pub async fn from_config(config: &Config, http: Client) -> Self {
        let client = CaptchaClient::new(http, &config.captcha_api_base_url, config.captcha_api_key.clone());
        Self::new(
            client,
            QuotaStore::new(&config.quota_file),
            SolverSettings::from_config(config),
        )
        .await
    }

    pub fn quota(&self) -> &QuotaRecord {
        &self.quota
    }

    /// 今日已用次数
    pub fn used_today(&self) -> u32 {
        self.quota.count_for(today())
    }

    /// 求解验证码，返回 token
    ///
    /// 缺少 key 或额度用完返回致命错误，其余失败返回可恢复错误。
    pub async fn solve(
        &mut self,
        challenge: &ChallengeContext,
        proxy: Option<&ProxyEndpoint>,
    ) -> AppResult<String> {
        self.solve_on(today(), challenge, proxy).await
    }

    /// 以指定日期计算额度的求解
    pub async fn solve_on(
        &mut self,
        day: NaiveDate,
        challenge: &ChallengeContext,
        proxy: Option<&ProxyEndpoint>,
    ) -> AppResult<String> {
        self.ensure_ready(day)?;

        // ========== CREATE ==========
        let request = CaptchaTaskRequest::new(&challenge.website_url, &challenge.website_key, proxy);
        let external_id = self.client.create_task(&request).await?;
        debug!("验证码任务已创建: {}", external_id);

        // ========== POLL ==========
        let mut job = CaptchaJob::new(external_id, self.settings.max_polls);
        while job.status == JobStatus::Processing && job.remaining_polls > 0 {
            sleep(self.settings.poll_interval).await;
            job.remaining_polls -= 1;

            let poll = self.client.get_task_result(&job.external_id).await?;
            if poll == JobPoll::Processing {
                info!("⏳ 验证码仍在处理中... (剩余 {} 次)", job.remaining_polls);
            }
            job.apply(poll);
        }

        match (job.status, job.solution_token) {
            (JobStatus::Ready, Some(token)) => {
                self.record_success(day).await;
                Ok(token)
            }
            (JobStatus::Error, _) => Err(CaptchaError::JobFailed {
                task_id: job.external_id,
                message: job.failure.unwrap_or_default(),
            }
            .into()),
            _ => Err(CaptchaError::PollExhausted {
                task_id: job.external_id,
                polls: self.settings.max_polls,
            }
            .into()),
        }
    }

    /// 前置检查，不发任何网络请求
    fn ensure_ready(&self, day: NaiveDate) -> AppResult<()> {
        if !self.client.has_api_key() {
            return Err(ConfigError::MissingCaptchaKey.into());
        }

        let used = self.quota.count_for(day);
        if used >= self.settings.daily_limit {
            return Err(CaptchaError::QuotaExceeded {
                date: day.to_string(),
                used,
                limit: self.settings.daily_limit,
            }
            .into());
        }

        Ok(())
    }

    async fn record_success(&mut self, day: NaiveDate) {
        let count = self.quota.increment(day);
        info!("✅ 验证码求解成功 (今日 {}/{})", count, self.settings.daily_limit);

        if let Err(e) = self.quota_store.save(&self.quota).await {
            warn!("⚠️ 保存验证码额度失败: {}", e);
        }
    }
}
