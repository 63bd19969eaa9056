// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Call-stack frames and wrapped exceptions.

use serde::{Deserialize, Serialize};
use std::panic::Location;

/// One positional argument recorded on a stack frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FrameArg {
	Null,
	Bool(bool),
	Integer(i64),
	Float(f64),
	String(String),
	/// Arrays, maps and objects. Never descended into by argument redaction.
	Structured(serde_json::Value),
	Exception(ExceptionInfo),
}

impl FrameArg {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_integer(&self) -> Option<i64> {
		match self {
			Self::Integer(i) => Some(*i),
			_ => None,
		}
	}
}

/// A single call-stack entry. Every field may be missing; native and
/// runtime frames frequently lack a file and line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktraceFrame {
	pub file: Option<String>,
	pub line: Option<u32>,
	pub function: Option<String>,
	/// Owning type (or module path) of `function`.
	pub class: Option<String>,
	#[serde(default)]
	pub args: Vec<FrameArg>,
}

impl BacktraceFrame {
	pub fn new(function: impl Into<String>) -> Self {
		Self {
			function: Some(function.into()),
			..Default::default()
		}
	}

	/// A frame carrying only a location.
	pub fn location(file: Option<String>, line: Option<u32>) -> Self {
		Self {
			file,
			line,
			..Default::default()
		}
	}

	pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
		self.file = Some(file.into());
		self.line = Some(line);
		self
	}

	pub fn in_class(mut self, class: impl Into<String>) -> Self {
		self.class = Some(class.into());
		self
	}

	pub fn with_args(mut self, args: Vec<FrameArg>) -> Self {
		self.args = args;
		self
	}

	/// True when neither file nor line is known.
	pub fn has_no_location(&self) -> bool {
		self.file.as_deref().map_or(true, str::is_empty) && self.line.map_or(true, |l| l == 0)
	}

	/// First exception passed to this frame, if any.
	pub fn exception_argument(&self) -> Option<&ExceptionInfo> {
		self.args.first().and_then(|arg| match arg {
			FrameArg::Exception(e) => Some(e),
			_ => None,
		})
	}

	/// `Class::function` or just the function name.
	pub fn qualified_function(&self) -> Option<String> {
		match (&self.class, &self.function) {
			(Some(class), Some(function)) => Some(format!("{class}::{function}")),
			(None, Some(function)) => Some(function.clone()),
			_ => None,
		}
	}
}

/// An error wrapped by an [`crate::Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExceptionInfo {
	/// Type name of the error.
	pub kind: String,
	pub message: String,
	/// Where the error was raised or captured.
	pub file: Option<String>,
	pub line: Option<u32>,
}

impl ExceptionInfo {
	pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			kind: kind.into(),
			message: message.into(),
			file: None,
			line: None,
		}
	}

	pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
		self.file = Some(file.into());
		self.line = Some(line);
		self
	}

	/// Wraps a Rust error, recording the caller's location as the raise site.
	#[track_caller]
	pub fn from_error<E>(error: &E) -> Self
	where
		E: std::error::Error + ?Sized,
	{
		let location = Location::caller();
		Self {
			kind: std::any::type_name_of_val(error).to_string(),
			message: error.to_string(),
			file: Some(location.file().to_string()),
			line: Some(location.line()),
		}
	}

	/// The single synthetic frame stored for exception events.
	pub fn frame(&self) -> BacktraceFrame {
		BacktraceFrame::location(self.file.clone(), self.line)
	}
}
