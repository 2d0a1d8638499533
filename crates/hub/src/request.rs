use std::fmt;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request};

use crate::error::HubError;

/// Raw inbound request as received from the transport.
///
/// Built once per HTTP request and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct InboundRequest {
	pub method: Method,
	pub path: String,
	pub query: Option<String>,
	pub headers: HeaderMap,
	pub body: Bytes,
}

impl InboundRequest {
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: None,
			headers: HeaderMap::new(),
			body: Bytes::new(),
		}
	}

	pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
		self.body = body.into();
		self
	}

	/// Collects an HTTP request, refusing bodies larger than `limit` bytes.
	///
	/// A refused request keeps its method, path and headers so the failure can
	/// still be answered in the protocol's format.
	pub async fn from_http(request: Request<Body>, limit: usize) -> Result<Self, UnreadableRequest> {
		let (parts, body) = request.into_parts();
		let mut inbound = Self {
			method: parts.method,
			path: parts.uri.path().to_string(),
			query: parts.uri.query().map(str::to_string),
			headers: parts.headers,
			body: Bytes::new(),
		};

		match axum::body::to_bytes(body, limit).await {
			Ok(body) => {
				inbound.body = body;
				Ok(inbound)
			}
			Err(_) => Err(UnreadableRequest {
				request: inbound,
				error: HubError::BodyTooLarge { limit },
			}),
		}
	}

	/// Path plus query string, as forwarded to a node.
	pub fn path_and_query(&self) -> String {
		match &self.query {
			Some(query) => format!("{}?{}", self.path, query),
			None => self.path.clone(),
		}
	}

	pub fn summary(&self) -> RequestSummary {
		RequestSummary {
			method: self.method.clone(),
			path: self.path.clone(),
			body_len: self.body.len(),
		}
	}
}

/// Request whose body could not be collected, without that body.
#[derive(Debug)]
pub struct UnreadableRequest {
	pub request: InboundRequest,
	pub error: HubError,
}

/// Compact description of a request handed to the observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
	pub method: Method,
	pub path: String,
	pub body_len: usize,
}

impl fmt::Display for RequestSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {} ({} bytes)", self.method, self.path, self.body_len)
	}
}
