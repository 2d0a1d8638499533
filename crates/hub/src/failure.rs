//! Failures raised while classifying or dispatching a command.
//!
//! A [`Failure`] is what the front controller turns into an error envelope:
//! a class name, an optional message and a trace of [`StackFrame`]s. Frames
//! are collected explicitly as the failure bubbles up, innermost first:
//!
//! ```ignore
//! let node = self.registry.lookup(&session).traced(frame!())?;
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::fmt;

use grid_protocol::{FailureValue, StackFrame};

use crate::error::HubError;

/// Marker type naming panics caught inside the dispatch region.
pub struct DispatcherPanic;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
	class: Cow<'static, str>,
	message: Option<String>,
	stack_trace: Vec<StackFrame>,
}

impl Failure {
	pub fn new(class: impl Into<Cow<'static, str>>, message: Option<String>) -> Self {
		Self {
			class: class.into(),
			message,
			stack_trace: Vec::new(),
		}
	}

	/// Wraps any error, using its Rust type name as the class.
	pub fn from_error<E>(err: E) -> Self
	where
		E: std::error::Error + 'static,
	{
		Self::new(std::any::type_name::<E>(), non_empty(err.to_string()))
	}

	/// Wraps the payload of a panic caught while dispatching.
	pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
		let message = payload
			.downcast_ref::<&'static str>()
			.map(|s| s.to_string())
			.or_else(|| payload.downcast_ref::<String>().cloned());
		Self::new(std::any::type_name::<DispatcherPanic>(), message)
	}

	/// Appends a frame as the failure moves outwards.
	pub fn at(mut self, frame: StackFrame) -> Self {
		self.stack_trace.push(frame);
		self
	}

	pub fn class(&self) -> &str {
		&self.class
	}

	pub fn message(&self) -> Option<&str> {
		self.message.as_deref()
	}

	pub fn stack_trace(&self) -> &[StackFrame] {
		&self.stack_trace
	}

	pub fn to_value(&self) -> FailureValue {
		FailureValue {
			message: self.message.clone(),
			class: self.class.to_string(),
			stack_trace: self.stack_trace.clone(),
		}
	}
}

impl fmt::Display for Failure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.message {
			Some(message) => write!(f, "{}: {}", self.class, message),
			None => f.write_str(&self.class),
		}
	}
}

impl std::error::Error for Failure {}

impl From<HubError> for Failure {
	fn from(err: HubError) -> Self {
		Self::new(err.class_name(), non_empty(err.to_string()))
	}
}

fn non_empty(message: String) -> Option<String> {
	if message.is_empty() { None } else { Some(message) }
}

/// Converts a result's error into a [`Failure`] and records a frame on it.
pub trait Traced<T> {
	fn traced(self, frame: StackFrame) -> Result<T, Failure>;
}

impl<T, E> Traced<T> for Result<T, E>
where
	E: Into<Failure>,
{
	fn traced(self, frame: StackFrame) -> Result<T, Failure> {
		self.map_err(|err| err.into().at(frame))
	}
}

/// Builds a [`StackFrame`] for the function the macro is expanded in.
#[macro_export]
macro_rules! frame {
	() => {{
		fn here() {}
		$crate::failure::function_frame(std::any::type_name_of_val(&here), file!(), line!())
	}};
}

/// Splits a function path such as `crate::module::Type::method::{{closure}}::here`
/// into a frame's class and method names.
#[doc(hidden)]
pub fn function_frame(function_path: &str, file: &'static str, line: u32) -> StackFrame {
	let mut segments = split_path(function_path);
	segments.pop();
	while segments.last().is_some_and(|s| s.starts_with("{{")) {
		segments.pop();
	}

	let method = segments.pop().unwrap_or("<unknown>").to_string();
	let class = match segments.last() {
		Some(last) if last.starts_with('<') => impl_self_type(last).to_string(),
		_ => segments.join("::"),
	};

	StackFrame {
		file_name: Some(file.to_string()),
		class_name: class,
		method_name: method,
		line_number: i32::try_from(line).unwrap_or(i32::MAX),
	}
}

/// Splits on `::` outside of angle brackets.
fn split_path(path: &str) -> Vec<&str> {
	let mut segments = Vec::new();
	let mut depth = 0usize;
	let mut start = 0;
	let bytes = path.as_bytes();
	let mut i = 0;

	while i < bytes.len() {
		match bytes[i] {
			b'<' => depth += 1,
			b'>' => depth = depth.saturating_sub(1),
			b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
				segments.push(&path[start..i]);
				i += 2;
				start = i;
				continue;
			}
			_ => {}
		}
		i += 1;
	}
	segments.push(&path[start..]);
	segments
}

/// `<impl a::Trait for a::Type>` -> `a::Type`, `<a::Type>` -> `a::Type`.
fn impl_self_type(segment: &str) -> &str {
	let inner = segment
		.trim_start_matches('<')
		.trim_end_matches('>')
		.trim_start_matches("impl ");
	match inner.rsplit_once(" for ") {
		Some((_, self_type)) => self_type,
		None => inner.split(" as ").next().unwrap_or(inner),
	}
}
