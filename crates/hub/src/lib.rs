//! Front controller of the grid hub.
//!
//! Every driver request goes through [`FrontController::handle`]: it is
//! classified, handed to a [`Dispatcher`](dispatch::Dispatcher), and any
//! failure on a protocol command that has not reached the wire yet is turned
//! into a JSON error envelope.

pub mod classifier;
pub mod cli;
pub mod committer;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod failure;
pub mod logging;
pub mod monitor;
pub mod request;
pub mod response;
pub mod server;
pub mod testing;

pub use classifier::{Classifier, RequestShape, RequestView};
pub use config::HubConfig;
pub use controller::{FrontController, Outcome};
pub use error::{HubError, TransportError};
pub use failure::Failure;
pub use request::InboundRequest;
pub use response::HttpResponse;
pub use server::Hub;
