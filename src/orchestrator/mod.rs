//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责按轮次调度所有账号，是整个系统的"指挥中心"。
//!
//! ### `scheduler` - 轮次调度器
//! - 管理应用生命周期（初始化、循环运行）
//! - 为每个账号按顺序轮流分配代理
//! - 每轮结束后统一保存任务进度
//! - 计算并等待下一轮开始时间
//! - 遇到致命错误时先保存进度再退出
//!
//! ## 层次关系
//!
//! ```text
//! scheduler (处理 Vec<AccessCredential>)
//!     ↓
//! workflow::TaskFlow (处理单个账号)
//!     ↓
//! services (能力层：captcha / progress / quota)
//!     ↓
//! clients + infrastructure (HTTP、代理)
//! ```

pub mod scheduler;

pub use scheduler::{App, SweepStats};
