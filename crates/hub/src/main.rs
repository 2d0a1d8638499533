use clap::Parser;
use grid_hub::cli::Cli;
use grid_hub::config::HubConfig;
use grid_hub::{logging, server};

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let config = match HubConfig::resolve(&cli) {
		Ok(config) => config,
		Err(err) => {
			eprintln!("error: {err}");
			std::process::exit(2);
		}
	};

	if let Err(err) = server::run(config).await {
		eprintln!("error: {err:#}");
		std::process::exit(1);
	}
}
