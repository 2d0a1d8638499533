//! Numeric status codes of the JSON wire protocol.
//!
//! Nodes report these in the `status` field of every response. The hub only
//! ever produces [`UNHANDLED_ERROR`] itself; the rest are listed so callers can
//! tell a node-reported failure apart from a hub failure.

pub const SUCCESS: i32 = 0;
pub const NO_SUCH_SESSION: i32 = 6;
pub const NO_SUCH_ELEMENT: i32 = 7;
pub const NO_SUCH_FRAME: i32 = 8;
pub const UNKNOWN_COMMAND: i32 = 9;
pub const STALE_ELEMENT_REFERENCE: i32 = 10;
pub const ELEMENT_NOT_VISIBLE: i32 = 11;
pub const INVALID_ELEMENT_STATE: i32 = 12;
/// Failure the hub could not map to anything more specific.
pub const UNHANDLED_ERROR: i32 = 13;
pub const ELEMENT_NOT_SELECTABLE: i32 = 15;
pub const JAVASCRIPT_ERROR: i32 = 17;
pub const XPATH_LOOKUP_ERROR: i32 = 19;
pub const TIMEOUT: i32 = 21;
pub const NO_SUCH_WINDOW: i32 = 23;
pub const INVALID_COOKIE_DOMAIN: i32 = 24;
pub const UNABLE_TO_SET_COOKIE: i32 = 25;
pub const UNEXPECTED_ALERT_PRESENT: i32 = 26;
pub const NO_ALERT_PRESENT: i32 = 27;
pub const ASYNC_SCRIPT_TIMEOUT: i32 = 28;
pub const INVALID_ELEMENT_COORDINATES: i32 = 29;
pub const IME_NOT_AVAILABLE: i32 = 30;
pub const IME_ENGINE_ACTIVATION_FAILED: i32 = 31;
pub const INVALID_SELECTOR_ERROR: i32 = 32;
pub const SESSION_NOT_CREATED: i32 = 33;
pub const MOVE_TARGET_OUT_OF_BOUNDS: i32 = 34;

const NAMES: &[(i32, &str)] = &[
	(SUCCESS, "success"),
	(NO_SUCH_SESSION, "no such session"),
	(NO_SUCH_ELEMENT, "no such element"),
	(NO_SUCH_FRAME, "no such frame"),
	(UNKNOWN_COMMAND, "unknown command"),
	(STALE_ELEMENT_REFERENCE, "stale element reference"),
	(ELEMENT_NOT_VISIBLE, "element not visible"),
	(INVALID_ELEMENT_STATE, "invalid element state"),
	(UNHANDLED_ERROR, "unhandled error"),
	(ELEMENT_NOT_SELECTABLE, "element not selectable"),
	(JAVASCRIPT_ERROR, "javascript error"),
	(XPATH_LOOKUP_ERROR, "xpath lookup error"),
	(TIMEOUT, "timeout"),
	(NO_SUCH_WINDOW, "no such window"),
	(INVALID_COOKIE_DOMAIN, "invalid cookie domain"),
	(UNABLE_TO_SET_COOKIE, "unable to set cookie"),
	(UNEXPECTED_ALERT_PRESENT, "unexpected alert open"),
	(NO_ALERT_PRESENT, "no such alert"),
	(ASYNC_SCRIPT_TIMEOUT, "script timeout"),
	(INVALID_ELEMENT_COORDINATES, "invalid element coordinates"),
	(IME_NOT_AVAILABLE, "ime not available"),
	(IME_ENGINE_ACTIVATION_FAILED, "ime engine activation failed"),
	(INVALID_SELECTOR_ERROR, "invalid selector"),
	(SESSION_NOT_CREATED, "session not created"),
	(MOVE_TARGET_OUT_OF_BOUNDS, "move target out of bounds"),
];

/// Returns the short protocol name for a status code.
pub fn describe(code: i32) -> Option<&'static str> {
	NAMES.iter().find(|(c, _)| *c == code).map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;

	#[test]
	fn codes_are_unique() {
		let codes: HashSet<i32> = NAMES.iter().map(|(c, _)| *c).collect();
		assert_eq!(codes.len(), NAMES.len());
	}

	#[test]
	fn unhandled_error_is_its_own_code() {
		let clashes = NAMES.iter().filter(|(c, _)| *c == UNHANDLED_ERROR).count();
		assert_eq!(clashes, 1);
		assert_eq!(describe(UNHANDLED_ERROR), Some("unhandled error"));
		assert_eq!(describe(14), None);
	}
}
