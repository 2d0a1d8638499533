//! HTTP hosting for the front controller.
//!
//! Each request body is collected, then handled on its own task writing into
//! a [`ChannelSink`](crate::response::ChannelSink). The axum handler waits for
//! the response head: if the task finishes without ever committing one, the
//! failure was not recoverable in-band and the transport answers with its own
//! plain 500. Failures after commit abort the body stream.
//!
//! Oversized bodies on protocol paths are answered by the front controller
//! like any other failure; elsewhere the transport answers 413 itself.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{MethodRouter, get};
use axum::Router;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::classifier::Classifier;
use crate::config::HubConfig;
use crate::controller::FrontController;
use crate::dispatch::{Dispatcher, NodeProxy, SessionRegistry};
use crate::monitor::GridMonitor;
use crate::request::InboundRequest;
use crate::response::{HttpResponse, channel_sink};

/// Entry point of the legacy RC protocol, served but never proxied.
pub const LEGACY_DRIVER_PATH: &str = "/selenium-server/driver";

pub const HUB_STATUS_PATH: &str = "/grid/api/hub";

/// Everything the HTTP handlers share.
pub struct Hub {
	config: HubConfig,
	controller: FrontController,
	monitor: Arc<GridMonitor>,
	registry: Arc<SessionRegistry>,
}

impl Hub {
	/// Wires the node proxy, registry and monitor described by `config`.
	pub fn from_config(config: HubConfig) -> crate::error::Result<Self> {
		let registry = Arc::new(SessionRegistry::new());
		let proxy = NodeProxy::new(config.nodes.clone(), Arc::clone(&registry), config.node_timeout())?;
		Ok(Self::with_dispatcher(config, Arc::new(proxy), registry))
	}

	pub fn with_dispatcher(config: HubConfig, dispatcher: Arc<dyn Dispatcher>, registry: Arc<SessionRegistry>) -> Self {
		let monitor = Arc::new(GridMonitor::new());
		let controller = FrontController::new(
			Classifier::new(config.path_prefix.clone()),
			dispatcher,
			monitor.clone(),
		);
		Self {
			config,
			controller,
			monitor,
			registry,
		}
	}

	pub fn config(&self) -> &HubConfig {
		&self.config
	}

	pub fn monitor(&self) -> &GridMonitor {
		&self.monitor
	}

	pub fn router(self: Arc<Self>) -> Router {
		let prefix = self.controller.classifier().prefix().to_string();
		let entry: MethodRouter<Arc<Hub>> = get(handle_driver_request)
			.post(handle_driver_request)
			.delete(handle_driver_request);

		Router::new()
			.route(&prefix, entry.clone())
			.route(&format!("{prefix}/{{*rest}}"), entry.clone())
			.route(LEGACY_DRIVER_PATH, entry)
			.route(HUB_STATUS_PATH, get(hub_status))
			.with_state(self)
	}
}

/// Binds the configured address and serves until Ctrl+C or SIGTERM.
pub async fn run(config: HubConfig) -> Result<()> {
	let hub = Arc::new(Hub::from_config(config).context("Failed to set up hub")?);
	let addr = hub.config.bind_address();

	let listener = TcpListener::bind(&addr)
		.await
		.with_context(|| format!("Failed to bind hub to {addr}"))?;

	info!(
		target = "grid.hub",
		addr,
		prefix = %hub.config.path_prefix,
		nodes = hub.config.nodes.len(),
		"hub listening"
	);
	if hub.config.nodes.is_empty() {
		warn!(target = "grid.hub", "no nodes configured, new sessions will fail");
	}

	axum::serve(listener, hub.router())
		.with_graceful_shutdown(shutdown_signal())
		.await
		.context("Hub server error")
}

async fn handle_driver_request(State(hub): State<Arc<Hub>>, request: Request) -> Response {
	let collected = InboundRequest::from_http(request, hub.config.max_request_body).await;
	if let Err(unreadable) = &collected {
		if !hub.controller.classifier().shape(&unreadable.request).is_protocol() {
			warn!(target = "grid.hub", error = %unreadable.error, path = %unreadable.request.path, "rejecting request body");
			return (StatusCode::PAYLOAD_TOO_LARGE, unreadable.error.to_string()).into_response();
		}
	}

	let (sink, head_rx, body) = channel_sink();
	let buffer_size = hub.config.response_buffer_size;
	let task_hub = Arc::clone(&hub);

	tokio::spawn(async move {
		let mut response = HttpResponse::with_buffer_size(sink, buffer_size);
		let handled = match collected {
			Ok(inbound) => task_hub.controller.handle(inbound, &mut response).await,
			Err(unreadable) => task_hub.controller.reject_unreadable(unreadable, &mut response).await,
		};
		match handled {
			Ok(()) => {
				if let Err(err) = response.finish().await {
					debug!(target = "grid.hub", error = %err, "client gone before response completed");
				}
			}
			Err(err) => {
				error!(target = "grid.hub", error = %err, "request failed");
				if response.is_committed() {
					response.abort(err.into()).await;
				}
			}
		}
	});

	match head_rx.await {
		Ok(head) => {
			let mut response = Response::new(body);
			*response.status_mut() = head.status;
			*response.headers_mut() = head.headers;
			response
		}
		Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
	}
}

async fn hub_status(State(hub): State<Arc<Hub>>) -> Json<Value> {
	Json(json!({
		"monitor": hub.monitor.snapshot(),
		"activeSessions": hub.registry.len(),
		"nodes": hub.config().nodes,
	}))
}

async fn shutdown_signal() {
	#[cfg(unix)]
	{
		use tokio::signal::unix::{SignalKind, signal};

		match signal(SignalKind::terminate()) {
			Ok(mut sigterm) => {
				tokio::select! {
					_ = tokio::signal::ctrl_c() => info!(target = "grid.hub", "received Ctrl+C, shutting down"),
					_ = sigterm.recv() => info!(target = "grid.hub", "received SIGTERM, shutting down"),
				}
			}
			Err(err) => {
				warn!(target = "grid.hub", error = %err, "failed to install SIGTERM handler");
				let _ = tokio::signal::ctrl_c().await;
			}
		}
	}

	#[cfg(not(unix))]
	{
		let _ = tokio::signal::ctrl_c().await;
		info!(target = "grid.hub", "received Ctrl+C, shutting down");
	}
}
