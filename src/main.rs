use std::sync::Arc;

use clap::Parser;
use spiderwiz::{NodeConfig, Runtime, TracingReporter};
use sw_objects::Registry;

#[derive(Parser, Debug)]
#[command(name = "spiderwiz-node", about = "Run a standalone Spiderwiz node")]
struct Cli {
    /// Path to a TOML node config file.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Node name, used when `--config` is omitted.
    #[arg(long, default_value = "spiderwiz-node")]
    name: String,
}

fn main() {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => NodeConfig::load(&path).unwrap_or_else(|e| {
            eprintln!("FATAL: failed to load config '{}': {e}", path.display());
            std::process::exit(1);
        }),
        None => NodeConfig::from_str(&format!("name = \"{}\"", cli.name)).expect("default config is always valid"),
    };

    let rt = tokio::runtime::Runtime::new().expect("failed to start tokio runtime");
    rt.block_on(async move {
        let name = config.name.clone();
        let runtime = Runtime::new(config, Registry::new(), Arc::new(TracingReporter));
        tracing::info!(node = %name, uuid = %runtime.self_uuid(), "spiderwiz node started");

        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutting down");
    });
}
