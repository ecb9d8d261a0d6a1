use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = mosaic_api::Args::parse();
	mosaic_api::run(args).await
}
