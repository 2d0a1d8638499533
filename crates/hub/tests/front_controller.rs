//! Failure handling of the front controller against scripted dispatchers.

use std::io;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use grid_hub::classifier::Classifier;
use grid_hub::error::{HubError, TransportError};
use grid_hub::failure::Failure;
use grid_hub::request::{InboundRequest, UnreadableRequest};
use grid_hub::response::HttpResponse;
use grid_hub::testing::{Behavior, MockDispatcher, RecordingObserver, RecordingSink};
use grid_hub::FrontController;
use grid_protocol::error_codes::UNHANDLED_ERROR;
use grid_protocol::{JSON_CONTENT_TYPE, SessionId};
use serde_json::Value;

struct Harness {
	controller: FrontController,
	dispatcher: Arc<MockDispatcher>,
	observer: Arc<RecordingObserver>,
}

fn harness(behavior: Behavior) -> Harness {
	let dispatcher = Arc::new(MockDispatcher::new(behavior));
	let observer = Arc::new(RecordingObserver::new());
	let controller = FrontController::new(Classifier::new("/wd/hub"), dispatcher.clone(), observer.clone());
	Harness {
		controller,
		dispatcher,
		observer,
	}
}

fn session(id: &str) -> SessionId {
	SessionId::parse(id).unwrap()
}

fn no_such_session(id: &str) -> Failure {
	Failure::from(HubError::NoSuchSession(session(id)))
}

fn command(method: Method, path: &str) -> InboundRequest {
	InboundRequest::new(method, path)
}

#[tokio::test]
async fn success_is_recorded_exactly_once() {
	let h = harness(Behavior::Respond {
		status: StatusCode::OK,
		body: br#"{"sessionId":"abc","status":0,"value":"http://x"}"#.to_vec(),
	});
	let (sink, recording) = RecordingSink::new();
	let mut response = HttpResponse::new(sink);

	h.controller
		.handle(command(Method::GET, "/wd/hub/session/abc/url"), &mut response)
		.await
		.unwrap();

	assert_eq!(recording.status(), Some(StatusCode::OK));
	assert_eq!(recording.body_json()["value"], "http://x");

	let records = h.observer.records();
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].0.path, "/wd/hub/session/abc/url");
	assert!(records[0].1.committed);
}

#[tokio::test]
async fn failure_before_commit_becomes_error_envelope() {
	let h = harness(Behavior::Fail(no_such_session("abc")));
	let (sink, recording) = RecordingSink::new();
	let mut response = HttpResponse::new(sink);

	let request = command(Method::POST, "/wd/hub/session/abc/url").with_body(r#"{"url":"http://example.com"}"#);
	h.controller.handle(request, &mut response).await.unwrap();

	assert_eq!(recording.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
	assert_eq!(recording.header("content-type").as_deref(), Some(JSON_CONTENT_TYPE));
	let body = recording.body();
	assert_eq!(recording.header("content-length"), Some(body.len().to_string()));

	let envelope: Value = serde_json::from_slice(&body).unwrap();
	assert_eq!(envelope["sessionId"], "abc");
	assert_eq!(envelope["status"], UNHANDLED_ERROR);
	assert_eq!(envelope["value"]["class"], "grid_hub::error::HubError::NoSuchSession");
	assert_eq!(envelope["value"]["message"], "session [abc] does not exist");

	let trace = envelope["value"]["stackTrace"].as_array().unwrap();
	let outermost = trace.last().unwrap();
	assert_eq!(outermost["className"], "grid_hub::controller::FrontController");
	assert_eq!(outermost["methodName"], "run");
	assert!(outermost["lineNumber"].as_i64().unwrap() > 0);

	assert!(h.observer.records().is_empty());
}

#[tokio::test]
async fn buffered_partial_answer_is_discarded() {
	let h = harness(Behavior::WriteThenFail {
		status: StatusCode::OK,
		body: b"partial answer".to_vec(),
		flush: false,
		failure: no_such_session("abc"),
	});
	let (sink, recording) = RecordingSink::new();
	let mut response = HttpResponse::new(sink);

	h.controller
		.handle(command(Method::GET, "/wd/hub/session/abc/title"), &mut response)
		.await
		.unwrap();

	assert_eq!(recording.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
	let body = String::from_utf8(recording.body()).unwrap();
	assert!(!body.contains("partial answer"), "stale bytes leaked: {body}");
	assert_eq!(recording.body_json()["status"], UNHANDLED_ERROR);
}

#[tokio::test]
async fn failure_after_commit_is_left_to_transport() {
	let failure = no_such_session("abc");
	let h = harness(Behavior::WriteThenFail {
		status: StatusCode::OK,
		body: b"already sent".to_vec(),
		flush: true,
		failure: failure.clone(),
	});
	let (sink, recording) = RecordingSink::new();
	let mut response = HttpResponse::new(sink);

	let err = h
		.controller
		.handle(command(Method::GET, "/wd/hub/session/abc/source"), &mut response)
		.await
		.unwrap_err();

	match err {
		TransportError::Unrecovered(unrecovered) => assert_eq!(unrecovered.class(), failure.class()),
		other => panic!("unexpected error {other:?}"),
	}
	assert_eq!(recording.status(), Some(StatusCode::OK));
	assert_eq!(recording.body(), b"already sent");
	assert!(h.observer.records().is_empty());
}

#[tokio::test]
async fn opaque_request_failure_is_left_to_transport() {
	let h = harness(Behavior::Fail(no_such_session("abc")));
	let (sink, recording) = RecordingSink::new();
	let mut response = HttpResponse::new(sink);

	let err = h
		.controller
		.handle(command(Method::GET, "/selenium-server/driver"), &mut response)
		.await
		.unwrap_err();

	assert!(matches!(err, TransportError::Unrecovered(_)));
	assert_eq!(h.dispatcher.calls(), 1);
	assert!(recording.head().is_none());
	assert!(!response.is_committed());
}

#[tokio::test]
async fn dispatcher_panic_is_answered_in_band() {
	let h = harness(Behavior::Panic("node table corrupted".into()));
	let (sink, recording) = RecordingSink::new();
	let mut response = HttpResponse::new(sink);

	h.controller
		.handle(command(Method::GET, "/wd/hub/session/abc/url"), &mut response)
		.await
		.unwrap();

	let envelope = recording.body_json();
	assert_eq!(recording.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
	assert_eq!(envelope["value"]["class"], "grid_hub::failure::DispatcherPanic");
	assert_eq!(envelope["value"]["message"], "node table corrupted");
	assert_eq!(envelope["sessionId"], "abc");
}

#[tokio::test]
async fn classification_failure_without_session_has_null_session_id() {
	let h = harness(Behavior::Respond {
		status: StatusCode::OK,
		body: Vec::new(),
	});
	let (sink, recording) = RecordingSink::new();
	let mut response = HttpResponse::new(sink);

	let request = command(Method::POST, "/wd/hub/session").with_body("{not json");
	h.controller.handle(request, &mut response).await.unwrap();

	let envelope = recording.body_json();
	assert_eq!(h.dispatcher.calls(), 0);
	assert!(envelope["sessionId"].is_null());
	assert_eq!(envelope["value"]["class"], "grid_hub::error::HubError::MalformedBody");
}

#[tokio::test]
async fn classification_failure_ignores_path_session() {
	let h = harness(Behavior::Respond {
		status: StatusCode::OK,
		body: Vec::new(),
	});

	let (sink, recording) = RecordingSink::new();
	let mut response = HttpResponse::new(sink);
	let request = command(Method::POST, "/wd/hub/session/abc/element").with_body("{not json");
	h.controller.handle(request, &mut response).await.unwrap();

	let envelope = recording.body_json();
	assert!(envelope["sessionId"].is_null(), "got {}", envelope["sessionId"]);
	assert_eq!(envelope["value"]["class"], "grid_hub::error::HubError::MalformedBody");

	let (sink, recording) = RecordingSink::new();
	let mut response = HttpResponse::new(sink);
	h.controller
		.handle(command(Method::PUT, "/wd/hub/session/abc/url"), &mut response)
		.await
		.unwrap();

	let envelope = recording.body_json();
	assert!(envelope["sessionId"].is_null());
	assert_eq!(envelope["value"]["class"], "grid_hub::error::HubError::UnsupportedMethod");
	assert_eq!(h.dispatcher.calls(), 0);
}

#[tokio::test]
async fn unreadable_protocol_body_becomes_envelope() {
	let h = harness(Behavior::Respond {
		status: StatusCode::OK,
		body: Vec::new(),
	});
	let (sink, recording) = RecordingSink::new();
	let mut response = HttpResponse::new(sink);

	let unreadable = UnreadableRequest {
		request: command(Method::POST, "/wd/hub/session/abc/url"),
		error: HubError::BodyTooLarge { limit: 8 },
	};
	h.controller.reject_unreadable(unreadable, &mut response).await.unwrap();

	let envelope = recording.body_json();
	assert_eq!(recording.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
	assert_eq!(recording.header("content-type").as_deref(), Some(JSON_CONTENT_TYPE));
	assert!(envelope["sessionId"].is_null());
	assert_eq!(envelope["value"]["class"], "grid_hub::error::HubError::BodyTooLarge");
	assert_eq!(envelope["value"]["stackTrace"][0]["methodName"], "reject_unreadable");
	assert_eq!(h.dispatcher.calls(), 0);
	assert!(h.observer.records().is_empty());
}

#[tokio::test]
async fn unreadable_opaque_body_is_left_to_transport() {
	let h = harness(Behavior::Respond {
		status: StatusCode::OK,
		body: Vec::new(),
	});
	let (sink, recording) = RecordingSink::new();
	let mut response = HttpResponse::new(sink);

	let unreadable = UnreadableRequest {
		request: command(Method::POST, "/selenium-server/driver"),
		error: HubError::BodyTooLarge { limit: 8 },
	};
	let err = h.controller.reject_unreadable(unreadable, &mut response).await.unwrap_err();

	assert!(matches!(err, TransportError::Unrecovered(_)));
	assert!(recording.head().is_none());
}

#[tokio::test]
async fn envelope_uses_session_resolved_during_dispatch() {
	let h = harness(Behavior::ResolveThenFail {
		session: session("fresh-session"),
		failure: Failure::new("grid_hub::dispatch::NodeProxy", Some("node refused capabilities".into())),
	});
	let (sink, recording) = RecordingSink::new();
	let mut response = HttpResponse::new(sink);

	let request = command(Method::POST, "/wd/hub/session").with_body(r#"{"desiredCapabilities":{"browserName":"firefox"}}"#);
	h.controller.handle(request, &mut response).await.unwrap();

	let envelope = recording.body_json();
	assert_eq!(envelope["sessionId"], "fresh-session");
	assert_eq!(envelope["value"]["message"], "node refused capabilities");
}

#[tokio::test]
async fn envelope_write_failure_is_reported() {
	let h = harness(Behavior::Fail(no_such_session("abc")));
	let (sink, recording) = RecordingSink::failing();
	let mut response = HttpResponse::new(sink);

	let err = h
		.controller
		.handle(command(Method::DELETE, "/wd/hub/session/abc"), &mut response)
		.await
		.unwrap_err();

	match err {
		TransportError::EnvelopeWrite(source) => assert_eq!(source.kind(), io::ErrorKind::BrokenPipe),
		other => panic!("unexpected error {other:?}"),
	}
	assert_eq!(recording.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
}

#[tokio::test]
async fn concurrent_requests_do_not_share_state() {
	let h = harness(Behavior::Fail(Failure::new("grid_hub::Boom", None)));
	let (sink_a, recording_a) = RecordingSink::new();
	let (sink_b, recording_b) = RecordingSink::new();
	let mut response_a = HttpResponse::new(sink_a);
	let mut response_b = HttpResponse::new(sink_b);

	let (a, b) = tokio::join!(
		h.controller.handle(command(Method::GET, "/wd/hub/session/aaa/url"), &mut response_a),
		h.controller.handle(command(Method::GET, "/wd/hub/session/bbb/url"), &mut response_b),
	);
	a.unwrap();
	b.unwrap();

	assert_eq!(recording_a.body_json()["sessionId"], "aaa");
	assert_eq!(recording_b.body_json()["sessionId"], "bbb");
	assert!(recording_a.body_json()["value"]["message"].is_null());
	assert_eq!(h.dispatcher.calls(), 2);
}
