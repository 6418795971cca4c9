use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use backend_infrastructure::AppConfig;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "wearrank-backend")]
#[command(about = "Stores item observations and answers bounded wear-rank queries", long_about = None)]
struct Args {
    /// Config file; falls back to WEARRANK_CONFIG, then ./config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding bind_addr
    #[arg(long)]
    bind: Option<String>,

    /// SQLite file or ":memory:", overriding database_path
    #[arg(long)]
    database: Option<String>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    let mut config = AppConfig::load(args.config.as_deref()).await?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }
    config.validate()?;

    backend_bootstrap::run_standalone(config).await
}
