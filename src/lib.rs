//! # Waitlist Task Runner
//!
//! 自动为多个账号领取任务平台奖励任务的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure / Clients）
//! - `infrastructure/` - 代理解析、HTTP 客户端构建，不做业务判断
//! - `clients/` - 任务平台 API、验证码服务 API 的收发
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `CaptchaSolver` - 验证码求解（含每日额度）
//! - `ProgressStore` - 任务进度持久化
//! - `QuotaStore` - 验证码额度持久化
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个账号"的完整处理流程
//! - `AccountCtx` - 上下文封装（账号索引 + token + 代理）
//! - `TaskFlow` - 流程编排（资料 → 任务列表 → 过滤 → 验证码 → 提交 → 记录）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/scheduler` - 轮次调度、代理分配、进度落盘、定时等待

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::ProxyResolver;
pub use models::{AccessCredential, AccountProfile, ProxyEndpoint, ProxyProtocol, Task, TaskId, TaskStatus};
pub use orchestrator::{App, SweepStats};
pub use services::{CaptchaSolver, ChallengeContext, ProgressMap, ProgressRecord, ProgressStore};
pub use workflow::{AccountCtx, AccountReport, TaskFlow};
