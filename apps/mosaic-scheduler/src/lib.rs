pub mod outbox;
pub mod scheduler;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mosaic_service::Providers;
use mosaic_storage::db::Db;

use crate::scheduler::{Scheduler, SchedulerState};

#[derive(Debug, Parser)]
#[command(
	version = mosaic_cli::VERSION,
	rename_all = "kebab",
	styles = mosaic_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = mosaic_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let state = SchedulerState { cfg: config, db, providers: Providers::default() };
	let mut scheduler = Scheduler::new(state);

	scheduler.start();
	tracing::info!("Scheduler running.");
	tokio::signal::ctrl_c().await?;
	tracing::info!("Stopping after in-flight work completes.");
	scheduler.stop().await;

	Ok(())
}
