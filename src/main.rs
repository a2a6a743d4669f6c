use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    let config = tasknote::config::Config::from_env();
    // Startup banner at info level so something always prints at default
    // verbosity. The signing secret stays out of the log.
    info!(
        target: "tasknote",
        "tasknote starting: http_port={}, db_path='{}', token_ttl_secs={}",
        config.http_port, config.db_path, config.token_ttl_secs
    );

    tasknote::server::run(config).await
}
