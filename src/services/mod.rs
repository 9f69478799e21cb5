pub mod captcha_solver;
pub mod progress_store;
pub mod quota_store;

pub use captcha_solver::{CaptchaSolver, ChallengeContext, SolverSettings};
pub use progress_store::{ProgressMap, ProgressRecord, ProgressStore, MAX_CHECK_IN_DAYS};
pub use quota_store::{QuotaRecord, QuotaStore};
