use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use abi::Config;
use booking_service::start_server;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;
    let config = Config::resolve()?;
    start_server(&config).await
}

fn init_logger() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(env_filter)
        .try_init()?;
    Ok(())
}
