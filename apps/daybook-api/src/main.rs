use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = daybook_api::Args::parse();

	daybook_api::run(args).await
}
