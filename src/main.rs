use daltonview::config::AppConfig;
use daltonview::error::AppError;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    tracing_subscriber::fmt()
        .with_max_level(config.log_level()?)
        .init();

    daltonview::run(config).await
}
