use anyhow::{Context, Result};
use waitlist_task_runner::utils::logging;
use waitlist_task_runner::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load().context("加载配置失败")?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用（只有致命错误才会返回）
    let mut app = App::initialize(config).await.context("初始化失败")?;
    app.run_forever().await.context("程序终止")?;

    Ok(())
}
