//! 轮次调度器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一轮一轮地处理所有账号。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：加载账号、代理、验证码额度、任务进度
//! 2. **代理分配**：第 i 个账号使用第 `i % 代理数` 个代理，解析失败则直连
//! 3. **顺序处理**：账号之间严格串行，中间固定间隔
//! 4. **进度落盘**：每轮结束保存一次，不按账号保存
//! 5. **定时等待**：随机等待 20-24 小时（可配置），期间定时输出倒计时
//! 6. **致命退出**：缺少验证码 key / 额度耗尽时保存进度后返回错误

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{build_direct_client, mask_proxy_spec, ProxyResolver};
use crate::models::{load_credentials, load_proxy_specs, AccessCredential, ProxyEndpoint};
use crate::services::{CaptchaSolver, ProgressMap, ProgressStore};
use crate::utils::logging::{log_startup, log_sweep_complete, log_sweep_start};
use crate::utils::time::{format_duration, next_run_after, progress_bar};
use crate::workflow::{AccountCtx, AccountReport, TaskFlow};
use chrono::{DateTime, Local};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    credentials: Vec<AccessCredential>,
    proxy_specs: Vec<String>,
    resolver: ProxyResolver,
    solver: CaptchaSolver,
    flow: TaskFlow,
    progress_store: ProgressStore,
    progress: ProgressMap,
    sweep_count: u64,
}

/// 一轮的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepStats {
    pub accounts_total: usize,
    pub accounts_ok: usize,
    pub tasks_completed: usize,
    pub tasks_failed: usize,
    pub check_ins: usize,
}

impl SweepStats {
    fn record(&mut self, report: &AccountReport) {
        if !report.aborted {
            self.accounts_ok += 1;
        }
        self.tasks_completed += report.completed;
        self.tasks_failed += report.failed;
        if report.checked_in {
            self.check_ins += 1;
        }
    }
}

impl App {
    /// 初始化应用：从配置的文件中加载账号和代理
    pub async fn initialize(config: Config) -> AppResult<Self> {
        info!("🔑 正在读取账号 token...");
        let credentials = load_credentials(&config.tokens_file).await?;
        info!("🔑 成功读取 {} 个 token", credentials.len());

        info!("🌐 正在加载代理...");
        let proxy_specs = load_proxy_specs(&config.proxies_file).await;

        Self::with_inputs(config, credentials, proxy_specs).await
    }

    /// 使用已加载的账号和代理初始化
    pub async fn with_inputs(
        config: Config,
        credentials: Vec<AccessCredential>,
        proxy_specs: Vec<String>,
    ) -> AppResult<Self> {
        log_startup(credentials.len(), proxy_specs.len());

        if config.captcha_api_key.trim().is_empty() {
            warn!("⚠️ 未配置 API_KEY_2CAPTCHA，遇到需要验证码的任务时程序将退出");
        }

        let resolver = ProxyResolver::new()?;
        let flow = TaskFlow::new(&config)?;
        let captcha_http = build_direct_client(Duration::from_secs(config.http_timeout_secs))?;
        let solver = CaptchaSolver::from_config(&config, captcha_http).await;
        info!(
            "🧩 今日验证码已用: {}/{}",
            solver.used_today(),
            config.max_captcha_daily
        );

        let progress_store = ProgressStore::new(&config.progress_file);
        let progress = progress_store.load().await;

        Ok(Self {
            config,
            credentials,
            proxy_specs,
            resolver,
            solver,
            flow,
            progress_store,
            progress,
            sweep_count: 0,
        })
    }

    /// 循环运行，正常情况下永不返回
    pub async fn run_forever(&mut self) -> AppResult<()> {
        loop {
            self.run_sweep().await?;

            let next_run = next_run_after(
                Local::now(),
                self.config.sweep_delay_min_hours,
                self.config.sweep_delay_max_hours,
                &mut rand::thread_rng(),
            );
            info!("🕒 下一轮开始时间: {}", next_run.format("%Y-%m-%d %H:%M:%S"));
            self.wait_until(next_run).await;
        }
    }

    /// 执行一轮：依次处理所有账号，结束后保存进度
    pub async fn run_sweep(&mut self) -> AppResult<SweepStats> {
        self.sweep_count += 1;
        log_sweep_start(self.sweep_count, self.credentials.len());

        let mut stats = SweepStats {
            accounts_total: self.credentials.len(),
            ..Default::default()
        };
        let account_delay = Duration::from_millis(self.config.account_delay_ms);

        for index in 0..self.credentials.len() {
            let ctx = AccountCtx::new(
                index + 1,
                self.credentials[index].clone(),
                self.assign_proxy(index),
            );

            match self
                .flow
                .run(&ctx, &mut self.solver, &mut self.progress)
                .await
            {
                Ok(report) => stats.record(&report),
                Err(e) if e.is_fatal() => {
                    error!("💥 致命错误: {}，保存进度后退出", e);
                    self.flush_progress().await;
                    return Err(e);
                }
                Err(e) => error!("{} 💥 账号处理失败: {}", ctx, e),
            }

            sleep(account_delay).await;
        }

        self.flush_progress().await;
        log_sweep_complete(
            self.sweep_count,
            stats.accounts_ok,
            stats.accounts_total,
            stats.tasks_completed,
            stats.tasks_failed,
        );

        Ok(stats)
    }

    /// 为第 `index` 个账号（从 0 开始）分配代理
    ///
    /// 代理池为空或解析失败时返回 `None`（直连）。
    pub fn assign_proxy(&self, index: usize) -> Option<ProxyEndpoint> {
        if self.proxy_specs.is_empty() {
            return None;
        }

        let spec = &self.proxy_specs[index % self.proxy_specs.len()];
        info!("🌐 使用代理: {}", mask_proxy_spec(spec));

        match self.resolver.resolve(spec) {
            Ok(endpoint) => Some(endpoint),
            Err(e) => {
                warn!("⚠️ {}，该账号将不使用代理", e);
                None
            }
        }
    }

    /// 当前内存中的任务进度
    pub fn progress(&self) -> &ProgressMap {
        &self.progress
    }

    pub fn solver(&self) -> &CaptchaSolver {
        &self.solver
    }

    async fn flush_progress(&self) {
        if let Err(e) = self.progress_store.save(&self.progress).await {
            error!("❌ 保存任务进度失败: {}", e);
        }
    }

    /// 等待到指定时间，期间按间隔输出倒计时
    async fn wait_until(&self, next_run: DateTime<Local>) {
        let total = (next_run - Local::now()).to_std().unwrap_or_default();
        let tick = Duration::from_secs(self.config.countdown_interval_secs.max(1));

        loop {
            let remaining = (next_run - Local::now()).to_std().unwrap_or_default();
            if remaining.is_zero() {
                break;
            }

            info!(
                "⏰ 距离下一轮: {} [{}]",
                format_duration(remaining),
                progress_bar(total.saturating_sub(remaining), total)
            );
            sleep(remaining.min(tick)).await;
        }

        info!("🚀 倒计时结束，开始下一轮");
    }
}
