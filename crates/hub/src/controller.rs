//! Front controller: the single entry point for driver requests.
//!
//! Classification and dispatch run in one guarded region that also catches
//! panics. What happens to a failure depends on two facts known at the catch
//! site:
//!
//! | request shape | response committed | result                                |
//! |---------------|--------------------|---------------------------------------|
//! | protocol      | no                 | reset, JSON error envelope, `Ok(())`  |
//! | protocol      | yes                | [`TransportError::Unrecovered`]       |
//! | opaque        | either             | [`TransportError::Unrecovered`]       |
//!
//! The envelope's `sessionId` is the session the command was bound to once
//! classification succeeded. Failures while reading or classifying the
//! request report `null`.
//!
//! Only fully successful requests are reported to the [`RequestObserver`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::classifier::{Classifier, ProtocolCommand, RequestShape, RequestView};
use crate::committer;
use crate::dispatch::{DispatchContext, Dispatcher};
use crate::envelope;
use crate::error::TransportError;
use crate::failure::{Failure, Traced};
use crate::frame;
use crate::monitor::RequestObserver;
use crate::request::{InboundRequest, RequestSummary, UnreadableRequest};
use crate::response::HttpResponse;

/// Result of the guarded classify-and-dispatch step.
#[derive(Debug)]
pub enum Outcome {
	Success,
	Failure {
		failure: Failure,
		context: DispatchContext,
	},
}

pub struct FrontController {
	classifier: Classifier,
	dispatcher: Arc<dyn Dispatcher>,
	observer: Arc<dyn RequestObserver>,
}

impl FrontController {
	pub fn new(classifier: Classifier, dispatcher: Arc<dyn Dispatcher>, observer: Arc<dyn RequestObserver>) -> Self {
		Self {
			classifier,
			dispatcher,
			observer,
		}
	}

	pub fn classifier(&self) -> &Classifier {
		&self.classifier
	}

	/// Handles one request, writing either the dispatcher's answer or an error envelope.
	///
	/// # Errors
	///
	/// Returns [`TransportError`] when the failure cannot be reported in-band:
	/// the request is not a protocol command, the response was already
	/// committed, or writing the envelope failed.
	pub async fn handle(&self, request: InboundRequest, response: &mut HttpResponse) -> Result<(), TransportError> {
		let shape = self.classifier.shape(&request);
		let summary = request.summary();

		match self.run(request, response).await {
			Outcome::Success => {
				self.observer.record(&summary, &response.summary());
				Ok(())
			}
			Outcome::Failure { failure, context } => self.recover(shape, &summary, failure, &context, response).await,
		}
	}

	/// Answers a request whose body could not be collected.
	///
	/// Goes through the same recovery as [`handle`](Self::handle): a protocol
	/// command gets an error envelope with a `null` session id.
	pub async fn reject_unreadable(
		&self,
		unreadable: UnreadableRequest,
		response: &mut HttpResponse,
	) -> Result<(), TransportError> {
		let UnreadableRequest { request, error } = unreadable;
		let shape = self.classifier.shape(&request);
		let failure = Failure::from(error).at(frame!());
		self.recover(shape, &request.summary(), failure, &DispatchContext::default(), response)
			.await
	}

	async fn recover(
		&self,
		shape: RequestShape,
		summary: &RequestSummary,
		failure: Failure,
		context: &DispatchContext,
		response: &mut HttpResponse,
	) -> Result<(), TransportError> {
		if !shape.is_protocol() || response.is_committed() {
			debug!(
				target = "grid.hub",
				request = %summary,
				?shape,
				committed = response.is_committed(),
				"failure left to the transport"
			);
			return Err(TransportError::Unrecovered(failure));
		}

		warn!(
			target = "grid.hub",
			request = %summary,
			session = ?context.server_session().map(|s| s.as_str()),
			failure = %failure,
			"answering protocol command with error envelope"
		);
		if response.reset().is_err() {
			return Err(TransportError::Unrecovered(failure));
		}
		let payload = envelope::build(&failure, context.server_session());
		committer::commit(response, &payload)
			.await
			.map_err(TransportError::EnvelopeWrite)
	}

	/// Classifies and dispatches, turning every error and panic into an [`Outcome`].
	async fn run(&self, request: InboundRequest, response: &mut HttpResponse) -> Outcome {
		let mut context = DispatchContext::default();

		let guarded = AssertUnwindSafe(async {
			let view = self.classifier.classify(request).traced(frame!())?;
			if let RequestView::Protocol(ProtocolCommand {
				session: Some(session), ..
			}) = &view
			{
				context.resolve_session(session.clone());
			}
			self.dispatcher
				.execute(&view, &mut context, response)
				.await
				.traced(frame!())
		})
		.catch_unwind()
		.await;

		let failure = match guarded {
			Ok(Ok(())) => return Outcome::Success,
			Ok(Err(failure)) => failure,
			Err(panic) => Failure::from_panic(panic).at(frame!()),
		};
		Outcome::Failure { failure, context }
	}
}
