pub mod account_ctx;
pub mod task_flow;

pub use account_ctx::AccountCtx;
pub use task_flow::{plan_tasks, AccountReport, TaskFlow, TaskPlan};
