use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = whut_bot::Args::parse();
	whut_bot::run(args).await
}
