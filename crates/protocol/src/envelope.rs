//! JSON error envelope returned for failed protocol commands.
//!
//! Every field is always serialized: a missing session, message or file name
//! is written as `null`, an empty trace as `[]`. Clients of the wire protocol
//! rely on the shape being fixed.
//!
//! ```json
//! {
//!   "sessionId": "4f1c...",
//!   "status": 13,
//!   "value": {
//!     "message": "session [4f1c...] does not exist",
//!     "class": "grid_hub::error::HubError::NoSuchSession",
//!     "stackTrace": [
//!       { "fileName": "crates/hub/src/dispatch/proxy.rs", "className": "grid_hub::dispatch::proxy::NodeProxy",
//!         "methodName": "session_command", "lineNumber": 104 }
//!     ]
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error_codes;
use crate::session::SessionId;

/// Top-level error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
	pub session_id: Option<SessionId>,
	pub status: i32,
	pub value: FailureValue,
}

impl ErrorEnvelope {
	/// Wraps a failure with the fixed [`error_codes::UNHANDLED_ERROR`] status.
	pub fn unhandled(session_id: Option<SessionId>, value: FailureValue) -> Self {
		Self {
			session_id,
			status: error_codes::UNHANDLED_ERROR,
			value,
		}
	}
}

/// Description of the failure itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureValue {
	pub message: Option<String>,
	/// Fully qualified name of the failure type.
	pub class: String,
	pub stack_trace: Vec<StackFrame>,
}

/// One frame of a failure's trace, innermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackFrame {
	pub file_name: Option<String>,
	pub class_name: String,
	pub method_name: String,
	pub line_number: i32,
}
