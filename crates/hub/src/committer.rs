//! Writes an error envelope to an uncommitted response.

use std::io;

use axum::http::StatusCode;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use grid_protocol::JSON_CONTENT_TYPE;

use crate::response::HttpResponse;

/// Frames `payload` as a 500 JSON response and flushes it.
///
/// The flush runs even when the write fails; the first error is returned.
pub async fn commit(response: &mut HttpResponse, payload: &[u8]) -> io::Result<()> {
	response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
	response.insert_header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
	response.insert_header(CONTENT_LENGTH, HeaderValue::from(payload.len()));

	let written = response.write(payload).await;
	let flushed = response.flush().await;
	written.and(flushed)
}
