//! 账号任务处理流程 - 流程层
//!
//! 核心职责：定义"一个账号"的完整处理流程
//!
//! 流程顺序：
//! 1. 获取账号资料（失败则跳过该账号）
//! 2. 获取任务列表（失败则跳过该账号）
//! 3. 过滤出待处理任务（深度优先，只提交没有子任务的任务）
//! 4. 逐个任务：求解验证码 → 提交完成 → 记录进度
//! 5. 每日签到（可选）
//!
//! 账号级、任务级错误都只记录日志；只有致命错误会向上传递。

use crate::clients::{TaskUpdate, WaitlistClient};
use crate::config::Config;
use crate::error::{AppResult, ConfigError};
use crate::infrastructure::build_client;
use crate::models::{ProxyEndpoint, Task};
use crate::services::{CaptchaSolver, ChallengeContext, ProgressMap, ProgressRecord};
use crate::utils::time::today;
use crate::workflow::account_ctx::AccountCtx;
use regex::Regex;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// 单个账号的处理结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountReport {
    pub account_index: usize,
    pub email: Option<String>,
    /// 本轮待处理任务数
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
    pub checked_in: bool,
    /// 资料或任务列表获取失败，账号被跳过
    pub aborted: bool,
}

/// 过滤后的待处理任务
#[derive(Debug, Default)]
pub struct TaskPlan<'a> {
    /// 需要提交的任务（没有子任务），按深度优先顺序
    pub pending: Vec<&'a Task>,
    /// 今日签到任务
    pub check_in: Option<&'a Task>,
}

/// 过滤待处理任务
///
/// 状态不是 started / completed / failed，且 ID 不在已完成记录中的任务才算待处理。
/// 父任务本身不会被提交，只递归处理其待处理的子任务。
/// 标题匹配签到规则的任务单独放到 `check_in`，不进入 `pending`。
pub fn plan_tasks<'a>(
    tasks: &'a [Task],
    record: &ProgressRecord,
    check_in_pattern: Option<&Regex>,
) -> TaskPlan<'a> {
    let mut plan = TaskPlan::default();
    walk_tasks(tasks, record, check_in_pattern, &mut plan);
    plan
}

fn walk_tasks<'a>(
    tasks: &'a [Task],
    record: &ProgressRecord,
    check_in_pattern: Option<&Regex>,
    plan: &mut TaskPlan<'a>,
) {
    for task in tasks {
        let is_check_in = !task.has_children()
            && check_in_pattern.is_some_and(|re| re.is_match(&task.title));

        if is_check_in {
            if plan.check_in.is_none() && !task.status.is_settled() {
                plan.check_in = Some(task);
            }
            continue;
        }

        if task.status.is_settled() || record.is_completed(&task.id) {
            continue;
        }

        if task.has_children() {
            walk_tasks(task.children(), record, check_in_pattern, plan);
        } else {
            plan.pending.push(task);
        }
    }
}

/// 账号任务处理流程
///
/// - 编排完整的账号处理流程
/// - 不持有验证码额度和进度，只借用
pub struct TaskFlow {
    waitlist_base_url: String,
    challenge: ChallengeContext,
    task_delay: Duration,
    http_timeout: Duration,
    check_in_pattern: Option<Regex>,
}

impl TaskFlow {
    /// 创建新的账号处理流程
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let check_in_pattern = if config.check_in_enabled {
            Some(Regex::new(&config.check_in_title_pattern)?)
        } else {
            None
        };

        Ok(Self {
            waitlist_base_url: config.waitlist_api_base_url.clone(),
            challenge: ChallengeContext::from_config(config),
            task_delay: Duration::from_millis(config.task_delay_ms),
            http_timeout: Duration::from_secs(config.http_timeout_secs),
            check_in_pattern,
        })
    }

    /// 处理一个账号
    ///
    /// 进度直接写入 `progress`（按邮箱），由调度层在一轮结束后统一落盘。
    pub async fn run(
        &self,
        ctx: &AccountCtx,
        solver: &mut CaptchaSolver,
        progress: &mut ProgressMap,
    ) -> AppResult<AccountReport> {
        let mut report = AccountReport {
            account_index: ctx.account_index,
            ..Default::default()
        };

        let (client, proxy) = match self.connect(ctx) {
            Some(pair) => pair,
            None => {
                report.aborted = true;
                return Ok(report);
            }
        };

        // ========== 1. 账号资料 ==========
        info!("{} 👤 正在获取账号资料...", ctx);
        let profile = match client.fetch_profile().await {
            Ok(profile) => profile,
            Err(e) => {
                error!("{} ❌ 获取账号资料失败: {}", ctx, e);
                report.aborted = true;
                return Ok(report);
            }
        };
        info!(
            "{} ✨ 邮箱: {}, 昵称: {}",
            ctx,
            profile.email,
            profile.nickname.as_deref().unwrap_or("-")
        );
        report.email = Some(profile.email.clone());

        // ========== 2. 任务列表 ==========
        let tasks = match client.fetch_tasks().await {
            Ok(tasks) => tasks,
            Err(e) => {
                error!("{} ❌ 获取任务列表失败: {}", ctx, e);
                report.aborted = true;
                return Ok(report);
            }
        };
        info!("{} 📋 任务列表获取成功, 共 {} 个任务", ctx, tasks.len());

        // ========== 3. 过滤 ==========
        let record = progress.entry(profile.email.clone()).or_default();
        let plan = plan_tasks(&tasks, record, self.check_in_pattern.as_ref());
        report.pending = plan.pending.len();
        info!(
            "{} 📋 待处理任务: {} (已记录完成 {})",
            ctx,
            plan.pending.len(),
            record.completed_count()
        );

        // ========== 4. 逐个完成 ==========
        for task in &plan.pending {
            if record.is_completed(&task.id) {
                continue;
            }
            info!("{} 🔧 处理任务: {} (ID: {})", ctx, task.title, task.id);

            match self.complete_task(&client, solver, task, proxy).await {
                Ok(update) => {
                    record.mark_completed(&task.id);
                    report.completed += 1;
                    info!(
                        "{} ✅ 任务 {} 已完成: {} ({})",
                        ctx,
                        task.id,
                        update.title.as_deref().unwrap_or(&task.title),
                        update.status.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())
                    );
                }
                Err(e) if e.is_fatal() => {
                    error!("{} 💥 致命错误，停止处理: {}", ctx, e);
                    return Err(e);
                }
                Err(e) => {
                    warn!("{} ⚠️ 任务 {} 处理失败，下轮重试: {}", ctx, task.id, e);
                    report.failed += 1;
                }
            }

            sleep(self.task_delay).await;
        }

        // ========== 5. 每日签到 ==========
        if let Some(task) = plan.check_in {
            let day = today();
            if record.can_check_in(day) {
                info!("{} 📅 每日签到: {} (已签 {} 天)", ctx, task.title, record.check_in_count());
                match self.complete_task(&client, solver, task, proxy).await {
                    Ok(_) => {
                        record.record_check_in(day);
                        report.checked_in = true;
                        info!("{} ✅ 签到成功 ({} 天)", ctx, record.check_in_count());
                    }
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => warn!("{} ⚠️ 签到失败: {}", ctx, e),
                }
                sleep(self.task_delay).await;
            } else {
                info!("{} 📅 今日已签到或已满 7 天，跳过", ctx);
            }
        }

        info!("{} 🎉 全部任务处理完毕", ctx);
        Ok(report)
    }

    /// 求解验证码并提交任务
    async fn complete_task(
        &self,
        client: &WaitlistClient,
        solver: &mut CaptchaSolver,
        task: &Task,
        proxy: Option<&ProxyEndpoint>,
    ) -> AppResult<TaskUpdate> {
        let token = solver.solve(&self.challenge, proxy).await?;
        client.complete_task(&task.id, &token).await
    }

    /// 为账号构建客户端，代理不可用时退回直连
    fn connect<'a>(&self, ctx: &'a AccountCtx) -> Option<(WaitlistClient, Option<&'a ProxyEndpoint>)> {
        let (http, proxy) = match build_client(ctx.proxy.as_ref(), self.http_timeout) {
            Ok(http) => (http, ctx.proxy.as_ref()),
            Err(e) => {
                warn!("{} ⚠️ {}，将不使用代理继续", ctx, e);
                match build_client(None, self.http_timeout) {
                    Ok(http) => (http, None),
                    Err(e) => {
                        error!("{} ❌ 无法创建 HTTP 客户端: {}", ctx, e);
                        return None;
                    }
                }
            }
        };

        let client = WaitlistClient::new(http, &self.waitlist_base_url, ctx.credential.clone());
        Some((client, proxy))
    }
}
