//! Decides whether an inbound request is a wire-protocol command.
//!
//! Two steps with different guarantees:
//!
//! - [`Classifier::shape`] looks only at the path and never fails. The front
//!   controller uses it to decide whether a failure may be answered with a
//!   JSON envelope, including failures of the second step.
//! - [`Classifier::classify`] builds the typed [`RequestView`] and rejects
//!   malformed commands.

use axum::http::Method;
use grid_protocol::{CommandRoute, SessionId, capabilities_of};
use serde_json::{Map, Value};

use crate::error::{HubError, Result};
use crate::request::InboundRequest;

/// Best-effort classification from the path alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
	Protocol,
	Opaque,
}

impl RequestShape {
	pub fn is_protocol(self) -> bool {
		matches!(self, RequestShape::Protocol)
	}
}

/// Typed view of an inbound request, produced once per request.
#[derive(Debug, Clone)]
pub enum RequestView {
	Protocol(ProtocolCommand),
	/// Outside the command grammar; failures are left to the transport.
	Opaque(InboundRequest),
}

impl RequestView {
	pub fn request(&self) -> &InboundRequest {
		match self {
			RequestView::Protocol(command) => &command.request,
			RequestView::Opaque(request) => request,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
	NewSession { capabilities: Map<String, Value> },
	DeleteSession,
	/// Any other command on an existing session, including `GET /session/{id}`.
	SessionCommand { command: String },
}

#[derive(Debug, Clone)]
pub struct ProtocolCommand {
	pub kind: CommandKind,
	pub session: Option<SessionId>,
	pub payload: Option<Value>,
	pub request: InboundRequest,
}

#[derive(Debug, Clone)]
pub struct Classifier {
	prefix: String,
}

impl Classifier {
	/// `prefix` is the mount point of the protocol, e.g. `/wd/hub`.
	pub fn new(prefix: impl Into<String>) -> Self {
		Self { prefix: prefix.into() }
	}

	pub fn prefix(&self) -> &str {
		&self.prefix
	}

	pub fn shape(&self, request: &InboundRequest) -> RequestShape {
		match self.route(request) {
			Some(_) => RequestShape::Protocol,
			None => RequestShape::Opaque,
		}
	}

	pub fn classify(&self, request: InboundRequest) -> Result<RequestView> {
		let Some(route) = self.route(&request) else {
			return Ok(RequestView::Opaque(request));
		};

		if !matches!(request.method, Method::GET | Method::POST | Method::DELETE) {
			return Err(unsupported(&request));
		}

		let session = route.session().cloned();
		let command = match route {
			CommandRoute::NewSession => {
				if request.method != Method::POST {
					return Err(unsupported(&request));
				}
				let payload = parse_payload(&request)?.unwrap_or(Value::Null);
				let capabilities = capabilities_of(&payload)
					.cloned()
					.ok_or(HubError::MissingCapabilities)?;
				ProtocolCommand {
					kind: CommandKind::NewSession { capabilities },
					session,
					payload: Some(payload),
					request,
				}
			}
			CommandRoute::Session(_) if request.method == Method::DELETE => ProtocolCommand {
				kind: CommandKind::DeleteSession,
				session,
				payload: None,
				request,
			},
			CommandRoute::Session(_) => session_command(session, String::new(), request)?,
			CommandRoute::SessionScoped { command, .. } => session_command(session, command, request)?,
		};

		Ok(RequestView::Protocol(command))
	}

	fn route(&self, request: &InboundRequest) -> Option<CommandRoute> {
		let rest = request.path.strip_prefix(self.prefix.as_str())?;
		CommandRoute::parse(rest)
	}
}

fn session_command(session: Option<SessionId>, command: String, request: InboundRequest) -> Result<ProtocolCommand> {
	let payload = if request.method == Method::POST {
		parse_payload(&request)?
	} else {
		None
	};
	Ok(ProtocolCommand {
		kind: CommandKind::SessionCommand { command },
		session,
		payload,
		request,
	})
}

/// Parses a JSON body; an empty body is no payload.
fn parse_payload(request: &InboundRequest) -> Result<Option<Value>> {
	if request.body.iter().all(u8::is_ascii_whitespace) {
		return Ok(None);
	}
	serde_json::from_slice(&request.body)
		.map(Some)
		.map_err(|source| HubError::MalformedBody {
			path: request.path.clone(),
			source,
		})
}

fn unsupported(request: &InboundRequest) -> HubError {
	HubError::UnsupportedMethod {
		method: request.method.clone(),
		path: request.path.clone(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn classifier() -> Classifier {
		Classifier::new("/wd/hub")
	}

	fn protocol(view: RequestView) -> ProtocolCommand {
		match view {
			RequestView::Protocol(command) => command,
			RequestView::Opaque(request) => panic!("expected protocol command for {}", request.path),
		}
	}

	#[test]
	fn new_session_carries_capabilities() {
		let request = InboundRequest::new(Method::POST, "/wd/hub/session")
			.with_body(r#"{"desiredCapabilities":{"browserName":"chrome"}}"#);

		let command = protocol(classifier().classify(request).unwrap());
		assert!(command.session.is_none());
		match command.kind {
			CommandKind::NewSession { capabilities } => assert_eq!(capabilities["browserName"], "chrome"),
			other => panic!("unexpected kind {other:?}"),
		}
	}

	#[test]
	fn delete_on_session_resource_is_deletion() {
		let request = InboundRequest::new(Method::DELETE, "/wd/hub/session/abc");
		let command = protocol(classifier().classify(request).unwrap());
		assert_eq!(command.kind, CommandKind::DeleteSession);
		assert_eq!(command.session.unwrap().as_str(), "abc");
	}

	#[test]
	fn session_scoped_post_parses_body() {
		let request = InboundRequest::new(Method::POST, "/wd/hub/session/abc/url").with_body(r#"{"url":"about:blank"}"#);
		let command = protocol(classifier().classify(request).unwrap());
		assert_eq!(
			command.kind,
			CommandKind::SessionCommand {
				command: "url".into()
			}
		);
		assert_eq!(command.payload.unwrap()["url"], "about:blank");
	}

	#[test]
	fn empty_post_body_is_allowed() {
		let request = InboundRequest::new(Method::POST, "/wd/hub/session/abc/refresh");
		let command = protocol(classifier().classify(request).unwrap());
		assert!(command.payload.is_none());
	}

	#[test]
	fn other_paths_are_opaque() {
		let c = classifier();
		for path in ["/selenium-server/driver", "/wd/hub/status", "/grid/api/hub", "/session"] {
			let request = InboundRequest::new(Method::GET, path);
			assert_eq!(c.shape(&request), RequestShape::Opaque, "{path}");
			assert!(matches!(c.classify(request).unwrap(), RequestView::Opaque(_)));
		}
	}

	#[test]
	fn malformed_body_fails_but_keeps_protocol_shape() {
		let c = classifier();
		let request = InboundRequest::new(Method::POST, "/wd/hub/session/abc/element").with_body("{not json");

		assert_eq!(c.shape(&request), RequestShape::Protocol);
		assert!(matches!(c.classify(request), Err(HubError::MalformedBody { .. })));
	}

	#[test]
	fn new_session_requires_post_and_capabilities() {
		let c = classifier();

		let get = InboundRequest::new(Method::GET, "/wd/hub/session");
		assert!(matches!(c.classify(get), Err(HubError::UnsupportedMethod { .. })));

		let empty = InboundRequest::new(Method::POST, "/wd/hub/session").with_body("{}");
		assert!(matches!(c.classify(empty), Err(HubError::MissingCapabilities)));
	}

	#[test]
	fn unsupported_methods_are_rejected() {
		let request = InboundRequest::new(Method::PUT, "/wd/hub/session/abc/url");
		assert!(matches!(classifier().classify(request), Err(HubError::UnsupportedMethod { .. })));
	}
}
