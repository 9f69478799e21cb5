pub mod captcha_client;
pub mod waitlist_client;

pub use captcha_client::{CaptchaClient, CaptchaTaskRequest, JobPoll};
pub use waitlist_client::{TaskUpdate, WaitlistClient};
