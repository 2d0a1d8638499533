//! Observability sink for completed driver requests.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::request::RequestSummary;
use crate::response::ResponseSummary;

/// Receives one record per successfully handled request.
///
/// Called concurrently from every request task; must not fail.
pub trait RequestObserver: Send + Sync {
	fn record(&self, request: &RequestSummary, response: &ResponseSummary);
}

/// Default observer: counts handled requests and remembers the last one.
#[derive(Debug, Default)]
pub struct GridMonitor {
	handled: AtomicU64,
	last: Mutex<Option<(String, String)>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
	pub handled_driver_requests: u64,
	pub last_request: Option<String>,
	pub last_response: Option<String>,
}

impl GridMonitor {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn snapshot(&self) -> MonitorSnapshot {
		let last = self.last.lock().clone();
		let (last_request, last_response) = match last {
			Some((request, response)) => (Some(request), Some(response)),
			None => (None, None),
		};
		MonitorSnapshot {
			handled_driver_requests: self.handled.load(Ordering::Relaxed),
			last_request,
			last_response,
		}
	}
}

impl RequestObserver for GridMonitor {
	fn record(&self, request: &RequestSummary, response: &ResponseSummary) {
		self.handled.fetch_add(1, Ordering::Relaxed);
		*self.last.lock() = Some((request.to_string(), response.to_string()));
		debug!(target = "grid.hub.monitor", request = %request, response = %response, "driver request handled");
	}
}
