use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "grid-hub")]
#[command(about = "Grid hub - front controller for remote browser sessions")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// JSON configuration file
	#[arg(short, long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Address to listen on
	#[arg(long)]
	pub host: Option<String>,

	/// Port to listen on
	#[arg(short, long)]
	pub port: Option<u16>,

	/// Path prefix of the wire protocol (default /wd/hub)
	#[arg(long, value_name = "PATH")]
	pub prefix: Option<String>,

	/// Node URL to proxy sessions to (repeatable, first one hosts new sessions)
	#[arg(long = "node", value_name = "URL")]
	pub nodes: Vec<String>,
}
