//! Thread-safe map from session id to the node hosting it.

use dashmap::DashMap;
use grid_protocol::SessionId;
use url::Url;

use crate::error::{HubError, Result};

#[derive(Debug, Default)]
pub struct SessionRegistry {
	sessions: DashMap<SessionId, Url>,
}

impl SessionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&self, session: SessionId, node: Url) {
		self.sessions.insert(session, node);
	}

	/// Returns the node hosting `session`, or [`HubError::NoSuchSession`].
	pub fn lookup(&self, session: &SessionId) -> Result<Url> {
		self.sessions
			.get(session)
			.map(|entry| entry.value().clone())
			.ok_or_else(|| HubError::NoSuchSession(session.clone()))
	}

	pub fn remove(&self, session: &SessionId) -> Option<Url> {
		self.sessions.remove(session).map(|(_, node)| node)
	}

	pub fn len(&self) -> usize {
		self.sessions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sessions.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lookup_unknown_session_is_no_such_session() {
		let registry = SessionRegistry::new();
		let session = SessionId::parse("gone").unwrap();
		match registry.lookup(&session) {
			Err(HubError::NoSuchSession(id)) => assert_eq!(id, session),
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn register_lookup_remove() {
		let registry = SessionRegistry::new();
		let session = SessionId::parse("s1").unwrap();
		let node = Url::parse("http://127.0.0.1:5555").unwrap();

		registry.register(session.clone(), node.clone());
		assert_eq!(registry.len(), 1);
		assert_eq!(registry.lookup(&session).unwrap(), node);
		assert_eq!(registry.remove(&session), Some(node));
		assert!(registry.is_empty());
	}
}
