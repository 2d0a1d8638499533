//! Command grammar of the wire protocol.
//!
//! Paths are matched relative to the hub prefix (see
//! [`DEFAULT_PATH_PREFIX`](crate::DEFAULT_PATH_PREFIX)):
//!
//! | path                        | route                              |
//! |-----------------------------|------------------------------------|
//! | `/session`                  | [`CommandRoute::NewSession`]       |
//! | `/session/{id}`             | [`CommandRoute::Session`]          |
//! | `/session/{id}/{command..}` | [`CommandRoute::SessionScoped`]    |
//!
//! Anything else is not a protocol command.

use serde_json::{Map, Value};

use crate::session::SessionId;

/// A path recognised as a protocol command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandRoute {
	/// Session creation.
	NewSession,
	/// The session resource itself (info on GET, deletion on DELETE).
	Session(SessionId),
	/// Any command addressed to an existing session.
	SessionScoped {
		session: SessionId,
		/// Remaining path after the session id, without leading slash.
		command: String,
	},
}

impl CommandRoute {
	/// Matches a path that has already had the hub prefix stripped.
	pub fn parse(path: &str) -> Option<Self> {
		let trimmed = path.strip_prefix('/')?;
		let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
		let mut segments = trimmed.splitn(3, '/');

		if segments.next()? != "session" {
			return None;
		}
		let Some(raw_session) = segments.next() else {
			return Some(Self::NewSession);
		};
		let session = SessionId::parse(raw_session)?;

		match segments.next() {
			None => Some(Self::Session(session)),
			Some("") => None,
			Some(command) => Some(Self::SessionScoped {
				session,
				command: command.to_string(),
			}),
		}
	}

	/// Session addressed by the path, if any.
	pub fn session(&self) -> Option<&SessionId> {
		match self {
			Self::NewSession => None,
			Self::Session(session) | Self::SessionScoped { session, .. } => Some(session),
		}
	}
}

/// Extracts the requested capabilities from a new-session payload.
///
/// Looks at `desiredCapabilities` first, then `capabilities`.
pub fn capabilities_of(payload: &Value) -> Option<&Map<String, Value>> {
	["desiredCapabilities", "capabilities"]
		.iter()
		.find_map(|key| payload.get(*key).and_then(Value::as_object))
}
