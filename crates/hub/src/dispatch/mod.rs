//! Execution of classified requests.
//!
//! The front controller only knows the [`Dispatcher`] trait. [`NodeProxy`] is
//! the implementation the hub binary runs: it forwards commands to the node
//! that owns the session, tracked in a [`SessionRegistry`].

mod proxy;
mod registry;

use async_trait::async_trait;
use grid_protocol::SessionId;

pub use proxy::NodeProxy;
pub use registry::SessionRegistry;

use crate::classifier::RequestView;
use crate::failure::Failure;
use crate::response::HttpResponse;

/// State a dispatcher builds up while executing, kept when it fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchContext {
	server_session: Option<SessionId>,
}

impl DispatchContext {
	pub fn new(server_session: Option<SessionId>) -> Self {
		Self { server_session }
	}

	/// Records the session the command is now bound to.
	pub fn resolve_session(&mut self, session: SessionId) {
		self.server_session = Some(session);
	}

	pub fn server_session(&self) -> Option<&SessionId> {
		self.server_session.as_ref()
	}
}

/// Executes a classified request, writing the full response on success.
///
/// Shared by every in-flight request; implementations must be safe to call
/// concurrently.
#[async_trait]
pub trait Dispatcher: Send + Sync {
	async fn execute(
		&self,
		request: &RequestView,
		context: &mut DispatchContext,
		response: &mut HttpResponse,
	) -> Result<(), Failure>;
}
