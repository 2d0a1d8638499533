//! Hub configuration: JSON file plus command-line overrides.

use std::path::Path;
use std::time::Duration;

use grid_protocol::DEFAULT_PATH_PREFIX;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cli::Cli;
use crate::error::{HubError, Result};
use crate::response::DEFAULT_BUFFER_SIZE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HubConfig {
	pub host: String,
	pub port: u16,
	/// Mount point of the wire protocol, without trailing slash.
	pub path_prefix: String,
	/// Nodes commands are proxied to, in preference order.
	pub nodes: Vec<Url>,
	pub response_buffer_size: usize,
	pub max_request_body: usize,
	pub node_timeout_ms: u64,
}

impl Default for HubConfig {
	fn default() -> Self {
		Self {
			host: "0.0.0.0".to_string(),
			port: 4444,
			path_prefix: DEFAULT_PATH_PREFIX.to_string(),
			nodes: Vec::new(),
			response_buffer_size: DEFAULT_BUFFER_SIZE,
			max_request_body: 16 * 1024 * 1024,
			node_timeout_ms: 300_000,
		}
	}
}

impl HubConfig {
	/// Reads a JSON config file; missing keys take their defaults.
	pub fn load(path: &Path) -> Result<Self> {
		let raw = std::fs::read_to_string(path)?;
		let config: Self = serde_json::from_str(&raw)?;
		config.validate()?;
		Ok(config)
	}

	/// Builds the effective config: file (if given) overridden by flags.
	pub fn resolve(cli: &Cli) -> Result<Self> {
		let mut config = match &cli.config {
			Some(path) => Self::load(path)?,
			None => Self::default(),
		};

		if let Some(host) = &cli.host {
			config.host = host.clone();
		}
		if let Some(port) = cli.port {
			config.port = port;
		}
		if let Some(prefix) = &cli.prefix {
			config.path_prefix = prefix.clone();
		}
		if !cli.nodes.is_empty() {
			config.nodes = cli
				.nodes
				.iter()
				.map(|raw| {
					Url::parse(raw).map_err(|source| HubError::InvalidNodeUrl {
						url: raw.clone(),
						source,
					})
				})
				.collect::<Result<_>>()?;
		}

		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if !self.path_prefix.starts_with('/') || self.path_prefix.ends_with('/') {
			return Err(HubError::Config(format!(
				"pathPrefix must start with '/' and not end with one: {:?}",
				self.path_prefix
			)));
		}
		if self.response_buffer_size == 0 {
			return Err(HubError::Config("responseBufferSize must be positive".into()));
		}
		if let Some(node) = self.nodes.iter().find(|node| node.cannot_be_a_base()) {
			return Err(HubError::Config(format!("node url cannot be used as a base: {node}")));
		}
		Ok(())
	}

	pub fn node_timeout(&self) -> Duration {
		Duration::from_millis(self.node_timeout_ms)
	}

	pub fn bind_address(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}
}
