//! Test doubles for the front controller's collaborators.
//!
//! - [`RecordingSink`]: a [`ResponseSink`] that keeps everything sent to it
//! - [`MockDispatcher`]: a [`Dispatcher`] with scripted [`Behavior`]
//! - [`RecordingObserver`]: a [`RequestObserver`] that keeps its records
//!
//! # Example
//!
//! ```ignore
//! let (sink, recording) = RecordingSink::new();
//! let mut response = HttpResponse::new(sink);
//! controller.handle(request, &mut response).await?;
//! assert_eq!(recording.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
//! ```

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};
use grid_protocol::SessionId;
use parking_lot::Mutex;

use crate::classifier::RequestView;
use crate::dispatch::{DispatchContext, Dispatcher};
use crate::failure::Failure;
use crate::monitor::RequestObserver;
use crate::request::RequestSummary;
use crate::response::{HttpResponse, ResponseSink, ResponseSummary};

#[derive(Debug, Default)]
struct Recorded {
	head: Option<(StatusCode, HeaderMap)>,
	body: Vec<u8>,
	aborted: Option<String>,
}

/// Sink that records the head, body and abort of a response.
pub struct RecordingSink {
	recorded: Arc<Mutex<Recorded>>,
	fail_chunks: bool,
}

/// Read handle onto what a [`RecordingSink`] received.
#[derive(Clone)]
pub struct Recording {
	recorded: Arc<Mutex<Recorded>>,
}

impl RecordingSink {
	pub fn new() -> (Self, Recording) {
		Self::build(false)
	}

	/// Accepts the head but fails every body chunk, like a client that hung up.
	pub fn failing() -> (Self, Recording) {
		Self::build(true)
	}

	fn build(fail_chunks: bool) -> (Self, Recording) {
		let recorded = Arc::new(Mutex::new(Recorded::default()));
		let sink = Self {
			recorded: Arc::clone(&recorded),
			fail_chunks,
		};
		(sink, Recording { recorded })
	}
}

#[async_trait]
impl ResponseSink for RecordingSink {
	async fn send_head(&mut self, status: StatusCode, headers: HeaderMap) -> io::Result<()> {
		let mut recorded = self.recorded.lock();
		if recorded.head.is_some() {
			return Err(io::Error::other("head sent twice"));
		}
		recorded.head = Some((status, headers));
		Ok(())
	}

	async fn send_chunk(&mut self, chunk: Bytes) -> io::Result<()> {
		if self.fail_chunks {
			return Err(io::Error::new(io::ErrorKind::BrokenPipe, "client connection closed"));
		}
		self.recorded.lock().body.extend_from_slice(&chunk);
		Ok(())
	}

	async fn abort(&mut self, error: io::Error) {
		self.recorded.lock().aborted = Some(error.to_string());
	}
}

impl Recording {
	pub fn head(&self) -> Option<(StatusCode, HeaderMap)> {
		self.recorded.lock().head.clone()
	}

	pub fn status(&self) -> Option<StatusCode> {
		self.recorded.lock().head.as_ref().map(|(status, _)| *status)
	}

	pub fn header(&self, name: &str) -> Option<String> {
		let recorded = self.recorded.lock();
		let (_, headers) = recorded.head.as_ref()?;
		headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
	}

	pub fn body(&self) -> Vec<u8> {
		self.recorded.lock().body.clone()
	}

	pub fn body_json(&self) -> serde_json::Value {
		serde_json::from_slice(&self.body()).unwrap_or(serde_json::Value::Null)
	}

	pub fn aborted(&self) -> Option<String> {
		self.recorded.lock().aborted.clone()
	}
}

/// What a [`MockDispatcher`] does when executed.
#[derive(Debug, Clone)]
pub enum Behavior {
	/// Writes a complete response.
	Respond { status: StatusCode, body: Vec<u8> },
	Fail(Failure),
	/// Writes `body`, flushing it first when `flush` is set, then fails.
	WriteThenFail {
		status: StatusCode,
		body: Vec<u8>,
		flush: bool,
		failure: Failure,
	},
	/// Binds the command to a session, then fails.
	ResolveThenFail { session: SessionId, failure: Failure },
	Panic(String),
}

pub struct MockDispatcher {
	behavior: Behavior,
	calls: AtomicUsize,
}

impl MockDispatcher {
	pub fn new(behavior: Behavior) -> Self {
		Self {
			behavior,
			calls: AtomicUsize::new(0),
		}
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl Dispatcher for MockDispatcher {
	async fn execute(
		&self,
		_request: &RequestView,
		context: &mut DispatchContext,
		response: &mut HttpResponse,
	) -> Result<(), Failure> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		match &self.behavior {
			Behavior::Respond { status, body } => {
				response.set_status(*status);
				response.write(body).await.map_err(Failure::from_error)?;
				response.flush().await.map_err(Failure::from_error)
			}
			Behavior::Fail(failure) => Err(failure.clone()),
			Behavior::WriteThenFail {
				status,
				body,
				flush,
				failure,
			} => {
				response.set_status(*status);
				response.write(body).await.map_err(Failure::from_error)?;
				if *flush {
					response.flush().await.map_err(Failure::from_error)?;
				}
				Err(failure.clone())
			}
			Behavior::ResolveThenFail { session, failure } => {
				context.resolve_session(session.clone());
				Err(failure.clone())
			}
			Behavior::Panic(message) => panic!("{message}"),
		}
	}
}

/// Observer that keeps every record it receives.
#[derive(Default)]
pub struct RecordingObserver {
	records: Mutex<Vec<(RequestSummary, ResponseSummary)>>,
}

impl RecordingObserver {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn records(&self) -> Vec<(RequestSummary, ResponseSummary)> {
		self.records.lock().clone()
	}
}

impl RequestObserver for RecordingObserver {
	fn record(&self, request: &RequestSummary, response: &ResponseSummary) {
		self.records.lock().push((request.clone(), *response));
	}
}
