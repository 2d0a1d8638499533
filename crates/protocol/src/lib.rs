//! Wire types for the grid hub's JSON wire protocol.
//!
//! This crate holds the pieces of the protocol that both the hub and its
//! tests need to agree on byte-for-byte:
//!
//! - [`SessionId`] - opaque server session token
//! - [`CommandRoute`] - the command grammar recognised under the hub prefix
//! - [`ErrorEnvelope`] - the JSON body sent for unhandled failures
//! - [`error_codes`] - numeric protocol status codes

pub mod command;
pub mod envelope;
pub mod error_codes;
pub mod session;

pub use command::{CommandRoute, capabilities_of};
pub use envelope::{ErrorEnvelope, FailureValue, StackFrame};
pub use session::SessionId;

/// Media type for every JSON body the hub produces itself.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Path prefix under which protocol commands are served by default.
pub const DEFAULT_PATH_PREFIX: &str = "/wd/hub";
