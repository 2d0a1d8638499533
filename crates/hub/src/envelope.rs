//! Serializes a [`Failure`] into the wire-protocol error envelope.

use grid_protocol::{ErrorEnvelope, SessionId};
use tracing::error;

use crate::failure::Failure;

/// Written if serialization ever fails, so the builder stays total.
const FALLBACK: &[u8] = br#"{"sessionId":null,"status":13,"value":{"message":"failed to serialize error envelope","class":"serde_json::Error","stackTrace":[]}}"#;

/// Builds the UTF-8 JSON error body for `failure`.
///
/// Depends only on its arguments: the same failure and session always give
/// the same bytes.
pub fn build(failure: &Failure, session: Option<&SessionId>) -> Vec<u8> {
	let envelope = ErrorEnvelope::unhandled(session.cloned(), failure.to_value());
	match serde_json::to_vec(&envelope) {
		Ok(bytes) => bytes,
		Err(err) => {
			error!(target = "grid.hub", error = %err, "error envelope serialization failed");
			FALLBACK.to_vec()
		}
	}
}
