use std::io;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, StatusCode};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;

use super::ResponseSink;

/// Chunks queued between the handling task and the body stream.
const CHANNEL_DEPTH: usize = 16;

/// Status and headers of a committed response.
#[derive(Debug)]
pub struct ResponseHead {
	pub status: StatusCode,
	pub headers: HeaderMap,
}

/// Sink feeding an axum response: the head through a `oneshot`, body chunks
/// through a bounded channel turned into a [`Body`] stream.
pub struct ChannelSink {
	head: Option<oneshot::Sender<ResponseHead>>,
	chunks: mpsc::Sender<io::Result<Bytes>>,
}

/// Creates a sink plus the receiving ends the transport waits on.
///
/// The head receiver resolves with an error if the sink is dropped before a
/// head was sent, i.e. the response was never committed.
pub fn channel_sink() -> (ChannelSink, oneshot::Receiver<ResponseHead>, Body) {
	let (head_tx, head_rx) = oneshot::channel();
	let (chunk_tx, chunk_rx) = mpsc::channel(CHANNEL_DEPTH);
	let sink = ChannelSink {
		head: Some(head_tx),
		chunks: chunk_tx,
	};
	let body = Body::from_stream(ReceiverStream::new(chunk_rx));
	(sink, head_rx, body)
}

fn disconnected() -> io::Error {
	io::Error::new(io::ErrorKind::BrokenPipe, "client connection closed")
}

#[async_trait]
impl ResponseSink for ChannelSink {
	async fn send_head(&mut self, status: StatusCode, headers: HeaderMap) -> io::Result<()> {
		let head = self
			.head
			.take()
			.ok_or_else(|| io::Error::other("response head already sent"))?;
		head.send(ResponseHead { status, headers })
			.map_err(|_| disconnected())
	}

	async fn send_chunk(&mut self, chunk: Bytes) -> io::Result<()> {
		self.chunks.send(Ok(chunk)).await.map_err(|_| disconnected())
	}

	async fn abort(&mut self, error: io::Error) {
		let _ = self.chunks.send(Err(error)).await;
	}
}
