use anyhow::Result;
use reporter::{config::Config, daily, mailer::ReportMailer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let mailer = ReportMailer::smtp(&config)?;

    if let Err(e) = daily::run_daily(&config, &mailer).await {
        error!("run_daily failed: {:?}", e);
    }

    info!("Daily report run complete.");
    Ok(())
}
