use anyhow::{Context, Result};
use pdf_metadata_extractor::utils::logging;
use pdf_metadata_extractor::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：环境变量 + .env（缺少 API Key 时直接退出）
    let config = Config::from_env().context("加载配置失败")?;

    // 初始化日志
    logging::init(&config)?;

    // 初始化并运行应用
    App::initialize(config).await?.run().await?;

    Ok(())
}
