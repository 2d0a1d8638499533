//! Logging setup for the hub binary.

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
///
/// Recovered protocol failures are logged at `warn`, so they show up at every
/// level. `-v` adds session lifecycle, `-vv` forwarded commands and monitor
/// records.
pub fn default_filter(verbosity: u8) -> &'static str {
	match verbosity {
		0 => "warn",
		1 => "warn,grid_hub=info",
		_ => "info,grid_hub=debug",
	}
}

/// Installs the global stderr subscriber.
///
/// A subscriber installed earlier (by an embedding application or a test
/// harness) stays in place.
pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

	let installed = tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.compact()
		.try_init();

	if let Err(err) = installed {
		debug!(target = "grid.hub", error = %err, "keeping existing tracing subscriber");
	}
}
