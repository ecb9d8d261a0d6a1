use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = mosaic_scheduler::Args::parse();
	mosaic_scheduler::run(args).await
}
