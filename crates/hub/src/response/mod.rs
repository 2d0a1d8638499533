//! HTTP response with servlet-style commit semantics.
//!
//! Writers fill a buffer; the status line and headers go out together with the
//! first flush, which happens explicitly or once the buffer outgrows its
//! configured size. From then on the response is *committed*: status and
//! header changes are ignored and [`HttpResponse::reset`] fails.
//!
//! The connection side is abstracted by [`ResponseSink`] so the same response
//! can feed an axum body stream ([`ChannelSink`]) or a test recorder.

mod channel;

use std::fmt;
use std::io;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{HeaderMap, StatusCode};
use thiserror::Error;
use tracing::trace;

pub use channel::{ChannelSink, ResponseHead, channel_sink};

pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Connection-side half of a response.
#[async_trait]
pub trait ResponseSink: Send {
	/// Sends status and headers. Called at most once per response.
	async fn send_head(&mut self, status: StatusCode, headers: HeaderMap) -> io::Result<()>;

	async fn send_chunk(&mut self, chunk: Bytes) -> io::Result<()>;

	/// Terminates a committed response abnormally.
	async fn abort(&mut self, _error: io::Error) {}
}

#[derive(Debug, Error)]
#[error("response already committed")]
pub struct ResponseCommitted;

pub struct HttpResponse {
	status: StatusCode,
	headers: HeaderMap,
	buffer: Vec<u8>,
	buffer_size: usize,
	committed: bool,
	bytes_sent: u64,
	sink: Box<dyn ResponseSink>,
}

impl HttpResponse {
	pub fn new(sink: impl ResponseSink + 'static) -> Self {
		Self::with_buffer_size(sink, DEFAULT_BUFFER_SIZE)
	}

	pub fn with_buffer_size(sink: impl ResponseSink + 'static, buffer_size: usize) -> Self {
		Self {
			status: StatusCode::OK,
			headers: HeaderMap::new(),
			buffer: Vec::new(),
			buffer_size: buffer_size.max(1),
			committed: false,
			bytes_sent: 0,
			sink: Box::new(sink),
		}
	}

	pub fn status(&self) -> StatusCode {
		self.status
	}

	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	pub fn is_committed(&self) -> bool {
		self.committed
	}

	pub fn set_status(&mut self, status: StatusCode) {
		if self.committed {
			trace!(target = "grid.hub.response", %status, "ignoring status change on committed response");
			return;
		}
		self.status = status;
	}

	pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
		if self.committed {
			trace!(target = "grid.hub.response", header = %name, "ignoring header change on committed response");
			return;
		}
		self.headers.insert(name, value);
	}

	/// Buffers `data`, flushing once the buffer reaches its size.
	pub async fn write(&mut self, data: &[u8]) -> io::Result<()> {
		self.buffer.extend_from_slice(data);
		if self.buffer.len() >= self.buffer_size {
			self.flush().await?;
		}
		Ok(())
	}

	/// Commits the head if needed and sends buffered bytes.
	pub async fn flush(&mut self) -> io::Result<()> {
		if !self.committed {
			// Committed from here on, even if the head write fails.
			self.committed = true;
			self.sink.send_head(self.status, self.headers.clone()).await?;
		}
		if !self.buffer.is_empty() {
			let chunk = Bytes::from(std::mem::take(&mut self.buffer));
			self.bytes_sent += chunk.len() as u64;
			self.sink.send_chunk(chunk).await?;
		}
		Ok(())
	}

	/// Discards status, headers and buffered body of an uncommitted response.
	pub fn reset(&mut self) -> Result<(), ResponseCommitted> {
		if self.committed {
			return Err(ResponseCommitted);
		}
		self.status = StatusCode::OK;
		self.headers.clear();
		self.buffer.clear();
		Ok(())
	}

	/// Flushes whatever is left; an untouched response commits as an empty 200.
	pub async fn finish(mut self) -> io::Result<()> {
		self.flush().await
	}

	/// Ends a response that can no longer be completed.
	pub async fn abort(mut self, error: io::Error) {
		self.buffer.clear();
		self.sink.abort(error).await;
	}

	pub fn summary(&self) -> ResponseSummary {
		ResponseSummary {
			status: self.status,
			committed: self.committed,
			bytes_written: self.bytes_sent + self.buffer.len() as u64,
		}
	}
}

impl fmt::Debug for HttpResponse {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("HttpResponse")
			.field("status", &self.status)
			.field("committed", &self.committed)
			.field("buffered", &self.buffer.len())
			.field("bytes_sent", &self.bytes_sent)
			.finish()
	}
}

/// Compact description of a response handed to the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseSummary {
	pub status: StatusCode,
	pub committed: bool,
	/// Bytes sent plus bytes still buffered.
	pub bytes_written: u64,
}

impl fmt::Display for ResponseSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} ({} bytes", self.status.as_u16(), self.bytes_written)?;
		if !self.committed {
			f.write_str(", uncommitted")?;
		}
		f.write_str(")")
	}
}
