use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-side session identifier handed out by a node on session creation.
///
/// Opaque to the hub: it is only compared and echoed back. A valid id is a
/// non-empty path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
	/// Parses a path segment into a session id.
	///
	/// Returns [`None`] for empty segments or values containing `/`.
	pub fn parse(raw: &str) -> Option<Self> {
		if raw.is_empty() || raw.contains('/') {
			return None;
		}
		Some(Self(raw.to_string()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for SessionId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_empty_and_nested_segments() {
		assert!(SessionId::parse("").is_none());
		assert!(SessionId::parse("abc/def").is_none());
		assert_eq!(SessionId::parse("abc-123").unwrap().as_str(), "abc-123");
	}

	#[test]
	fn serializes_as_plain_string() {
		let id = SessionId::parse("4f1c").unwrap();
		assert_eq!(serde_json::to_string(&id).unwrap(), "\"4f1c\"");
	}
}
