//! 日志工具模块
//!
//! 提供日志初始化和格式化输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 日志
///
/// 优先使用 `RUST_LOG`，否则根据 `verbose` 选择 debug / info。
/// 重复调用是安全的（测试中会多次调用）。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `accounts`: 账号数量
/// - `proxies`: 代理数量
pub fn log_startup(accounts: usize, proxies: usize) {
    info!("{}", "═".repeat(60));
    info!("🚀 程序启动 - 任务自动领取");
    info!("🔑 账号数量: {}", accounts);
    info!("🌐 代理数量: {}", proxies);
    info!("{}", "═".repeat(60));
}

/// 记录一轮开始
pub fn log_sweep_start(sweep: u64, accounts: usize) {
    info!("\n{}", "─".repeat(60));
    info!("📦 开始第 {} 轮, 共 {} 个账号", sweep, accounts);
    info!("{}", "─".repeat(60));
}

/// 记录一轮结束后的统计
///
/// # 参数
/// - `sweep`: 轮次
/// - `accounts_ok`: 正常处理的账号数
/// - `accounts_total`: 账号总数
/// - `tasks_completed`: 本轮完成的任务数
/// - `tasks_failed`: 本轮失败的任务数
pub fn log_sweep_complete(
    sweep: u64,
    accounts_ok: usize,
    accounts_total: usize,
    tasks_completed: usize,
    tasks_failed: usize,
) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 轮完成: 账号 {}/{}", sweep, accounts_ok, accounts_total);
    info!("✅ 完成任务: {}", tasks_completed);
    info!("❌ 失败任务: {}", tasks_failed);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
