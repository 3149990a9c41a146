// crates.io
use clap::Parser;
// self
use farmrag_eval::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = Args::parse();
	farmrag_eval::run(args).await
}
