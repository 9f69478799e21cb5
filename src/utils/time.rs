//! 时间相关辅助函数

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use rand::Rng;
use std::time::Duration;

/// 本地时区的今天
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// 两轮之间最长等待（一年），超出的配置值按此截断
pub const MAX_SWEEP_DELAY_HOURS: u64 = 24 * 366;

/// 计算下一轮开始时间：`now` 之后 `[min_hours, max_hours]` 小时内均匀随机
///
/// 两个边界相等时为固定间隔；结果总是严格晚于 `now`。
/// 边界超过 [`MAX_SWEEP_DELAY_HOURS`] 时按上限处理。
pub fn next_run_after<Tz: TimeZone, R: Rng + ?Sized>(
    now: DateTime<Tz>,
    min_hours: u64,
    max_hours: u64,
    rng: &mut R,
) -> DateTime<Tz> {
    let min_hours = min_hours.min(MAX_SWEEP_DELAY_HOURS);
    let max_hours = max_hours.min(MAX_SWEEP_DELAY_HOURS);
    let (low, high) = if min_hours <= max_hours {
        (min_hours, max_hours)
    } else {
        (max_hours, min_hours)
    };
    let min_secs = (low * 3600).max(1);
    let max_secs = (high * 3600).max(min_secs);

    let delay_secs = rng.gen_range(min_secs..=max_secs);
    now + chrono::Duration::seconds(delay_secs as i64)
}

/// `1h 2m 3s` 格式
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}h {}m {}s", total / 3600, (total % 3600) / 60, total % 60)
}

/// 十格进度条
pub fn progress_bar(elapsed: Duration, total: Duration) -> String {
    let filled = if total.is_zero() {
        10
    } else {
        ((elapsed.as_secs_f64() / total.as_secs_f64()) * 10.0).floor().clamp(0.0, 10.0) as usize
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}
