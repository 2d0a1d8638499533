use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::header::CONTENT_TYPE;
use futures::StreamExt;
use grid_protocol::SessionId;
use grid_protocol::error_codes::describe;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::{DispatchContext, Dispatcher, SessionRegistry};
use crate::classifier::{CommandKind, ProtocolCommand, RequestView};
use crate::error::HubError;
use crate::failure::{Failure, Traced};
use crate::frame;
use crate::request::InboundRequest;
use crate::response::HttpResponse;

/// Forwards protocol commands to backend nodes.
///
/// New sessions always go to the first configured node; every later command
/// goes to the node recorded for its session. Node answers, error envelopes
/// included, are relayed with the node's own status code.
pub struct NodeProxy {
	client: reqwest::Client,
	nodes: Vec<Url>,
	registry: Arc<SessionRegistry>,
}

impl NodeProxy {
	pub fn new(nodes: Vec<Url>, registry: Arc<SessionRegistry>, timeout: Duration) -> crate::error::Result<Self> {
		let client = reqwest::Client::builder().timeout(timeout).build()?;
		Ok(Self {
			client,
			nodes,
			registry,
		})
	}

	async fn new_session(
		&self,
		command: &ProtocolCommand,
		context: &mut DispatchContext,
		response: &mut HttpResponse,
	) -> Result<(), Failure> {
		let node = self
			.nodes
			.first()
			.cloned()
			.ok_or(HubError::NoNodeAvailable)
			.traced(frame!())?;
		let answer = self.forward(&node, &command.request).await.traced(frame!())?;

		let status = answer.status();
		let content_type = answer.headers().get(CONTENT_TYPE).cloned();
		let body = answer.bytes().await.map_err(HubError::from).traced(frame!())?;
		let parsed: Option<Value> = serde_json::from_slice(&body).ok();

		if status.is_success() {
			let session = parsed
				.as_ref()
				.and_then(session_id_of)
				.ok_or_else(|| HubError::MissingSessionId { node: node.clone() })
				.traced(frame!())?;
			info!(target = "grid.hub.proxy", session = %session, node = %node, "session created");
			self.registry.register(session.clone(), node);
			context.resolve_session(session);
		} else {
			let code = parsed.as_ref().and_then(|value| value.get("status")).and_then(Value::as_i64);
			warn!(
				target = "grid.hub.proxy",
				node = %node,
				%status,
				code = ?code,
				reason = code.and_then(|code| i32::try_from(code).ok()).and_then(describe).unwrap_or("unknown"),
				"node refused new session"
			);
		}

		response.set_status(status);
		if let Some(content_type) = content_type {
			response.insert_header(CONTENT_TYPE, content_type);
		}
		response.write(&body).await.map_err(HubError::from).traced(frame!())?;
		response.flush().await.map_err(HubError::from).traced(frame!())
	}

	async fn delete_session(
		&self,
		command: &ProtocolCommand,
		session: &SessionId,
		response: &mut HttpResponse,
	) -> Result<(), Failure> {
		let node = self.registry.lookup(session).traced(frame!())?;
		let answer = self.forward(&node, &command.request).await.traced(frame!())?;
		self.registry.remove(session);
		info!(target = "grid.hub.proxy", session = %session, node = %node, "session deleted");
		relay(answer, response).await.traced(frame!())
	}

	async fn session_command(
		&self,
		command: &ProtocolCommand,
		session: &SessionId,
		response: &mut HttpResponse,
	) -> Result<(), Failure> {
		let node = self.registry.lookup(session).traced(frame!())?;
		let answer = self.forward(&node, &command.request).await.traced(frame!())?;
		relay(answer, response).await.traced(frame!())
	}

	async fn forward(&self, node: &Url, request: &InboundRequest) -> Result<reqwest::Response, HubError> {
		let target = node
			.join(&request.path_and_query())
			.map_err(|source| HubError::InvalidNodeUrl {
				url: node.to_string(),
				source,
			})?;
		debug!(target = "grid.hub.proxy", method = %request.method, url = %target, "forwarding command");

		let mut builder = self.client.request(request.method.clone(), target);
		if let Some(content_type) = request.headers.get(CONTENT_TYPE) {
			builder = builder.header(CONTENT_TYPE, content_type.clone());
		}
		if !request.body.is_empty() {
			builder = builder.body(request.body.clone());
		}
		Ok(builder.send().await?)
	}
}

#[async_trait]
impl Dispatcher for NodeProxy {
	async fn execute(
		&self,
		request: &RequestView,
		context: &mut DispatchContext,
		response: &mut HttpResponse,
	) -> Result<(), Failure> {
		let command = match request {
			RequestView::Protocol(command) => command,
			RequestView::Opaque(request) => {
				return Err(HubError::UnsupportedProtocol {
					path: request.path.clone(),
				})
				.traced(frame!());
			}
		};

		match (&command.kind, &command.session) {
			(CommandKind::NewSession { .. }, _) => self.new_session(command, context, response).await,
			(CommandKind::DeleteSession, Some(session)) => self.delete_session(command, session, response).await,
			(CommandKind::SessionCommand { .. }, Some(session)) => {
				self.session_command(command, session, response).await
			}
			(_, None) => Err(Failure::new(
				std::any::type_name::<ProtocolCommand>(),
				Some("session command without a session id".into()),
			)
			.at(frame!())),
		}
	}
}

/// Copies a node answer into the hub response, streaming the body.
async fn relay(answer: reqwest::Response, response: &mut HttpResponse) -> Result<(), HubError> {
	response.set_status(answer.status());
	if let Some(content_type) = answer.headers().get(CONTENT_TYPE) {
		response.insert_header(CONTENT_TYPE, content_type.clone());
	}

	let mut body = answer.bytes_stream();
	while let Some(chunk) = body.next().await {
		response.write(&chunk?).await?;
	}
	response.flush().await?;
	Ok(())
}

/// Reads the session id from a new-session answer, legacy or W3C shaped.
fn session_id_of(answer: &Value) -> Option<SessionId> {
	answer
		.get("sessionId")
		.or_else(|| answer.get("value").and_then(|value| value.get("sessionId")))
		.and_then(Value::as_str)
		.and_then(SessionId::parse)
}
