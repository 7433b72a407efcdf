//! Interactive route lookup session.
//!
//! Takes the API key as its only argument and drives the session on a
//! current-thread runtime; blocking task bodies run on the runtime's
//! bounded blocking pool, sized from configuration.

use clap::Parser;
use tracing::info;

use route_scout::config::AppConfig;
use route_scout::logging;
use route_scout::session::Session;

#[derive(Parser)]
#[command(name = "route-scout")]
#[command(about = "Look up transit routes interactively, with on-disk result caching")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// API key for the timetable service
    api_key: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();

    let config = AppConfig::from_env()?;
    info!(
        workers = config.worker_threads,
        cache_dir = %config.cache_dir.display(),
        "starting route-scout"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .max_blocking_threads(config.worker_threads)
        .build()?;

    runtime.block_on(async {
        let session = Session::new(&config, cli.api_key)?;
        session.run().await
    })?;

    info!("session finished");
    Ok(())
}
