use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = farmrag::Args::parse();
	farmrag::run(args).await
}
