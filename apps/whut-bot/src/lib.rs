pub mod discord;

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use whut_service::WhutService;
use whut_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = whut_cli::VERSION,
	rename_all = "kebab",
	styles = whut_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = whut_config::load(&args.config)?;
	init_tracing(&config)?;
	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	tracing::info!("Storage ready.");

	let service = Arc::new(WhutService::new(&config, db)?);

	discord::serve(&config.discord, service).await
}

fn init_tracing(config: &whut_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).init();
	Ok(())
}
