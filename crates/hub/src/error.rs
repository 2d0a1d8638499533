use std::io;

use axum::http::Method;
use grid_protocol::SessionId;
use thiserror::Error;
use url::Url;

use crate::failure::Failure;

pub type Result<T> = std::result::Result<T, HubError>;

#[derive(Debug, Error)]
pub enum HubError {
	#[error("method {method} is not supported for {path}")]
	UnsupportedMethod { method: Method, path: String },

	#[error("malformed command body for {path}: {source}")]
	MalformedBody {
		path: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("new session request carries no capabilities")]
	MissingCapabilities,

	#[error("session [{0}] does not exist")]
	NoSuchSession(SessionId),

	#[error("no node available to host a new session")]
	NoNodeAvailable,

	#[error("node {node} created a session but returned no session id")]
	MissingSessionId { node: Url },

	/// Requests outside the wire-protocol grammar (legacy RC and friends).
	#[error("request protocol not supported by this hub: {path}")]
	UnsupportedProtocol { path: String },

	#[error("request body exceeds {limit} bytes")]
	BodyTooLarge { limit: usize },

	#[error("invalid node url {url}: {source}")]
	InvalidNodeUrl {
		url: String,
		#[source]
		source: url::ParseError,
	},

	#[error("invalid configuration: {0}")]
	Config(String),

	#[error(transparent)]
	Http(#[from] reqwest::Error),

	#[error(transparent)]
	Io(#[from] io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

macro_rules! class_path {
	($variant:literal) => {
		concat!(module_path!(), "::HubError::", $variant)
	};
}

impl HubError {
	/// Fully qualified name of the variant, reported as the failure class.
	pub fn class_name(&self) -> &'static str {
		match self {
			HubError::UnsupportedMethod { .. } => class_path!("UnsupportedMethod"),
			HubError::MalformedBody { .. } => class_path!("MalformedBody"),
			HubError::MissingCapabilities => class_path!("MissingCapabilities"),
			HubError::NoSuchSession(_) => class_path!("NoSuchSession"),
			HubError::NoNodeAvailable => class_path!("NoNodeAvailable"),
			HubError::MissingSessionId { .. } => class_path!("MissingSessionId"),
			HubError::UnsupportedProtocol { .. } => class_path!("UnsupportedProtocol"),
			HubError::BodyTooLarge { .. } => class_path!("BodyTooLarge"),
			HubError::InvalidNodeUrl { .. } => class_path!("InvalidNodeUrl"),
			HubError::Config(_) => class_path!("Config"),
			HubError::Http(_) => class_path!("Http"),
			HubError::Io(_) => class_path!("Io"),
			HubError::Json(_) => class_path!("Json"),
		}
	}
}

/// Failure the front controller hands back to the hosting transport.
///
/// Returned only when no JSON envelope could be written: the request was not
/// a protocol command, the response was already committed, or writing the
/// envelope itself failed.
#[derive(Debug, Error)]
pub enum TransportError {
	#[error("request failed outside protocol error handling: {0}")]
	Unrecovered(#[source] Failure),

	#[error("failed writing error envelope")]
	EnvelopeWrite(#[source] io::Error),
}

impl From<TransportError> for io::Error {
	fn from(err: TransportError) -> Self {
		match err {
			TransportError::EnvelopeWrite(source) => source,
			other => io::Error::other(other),
		}
	}
}
