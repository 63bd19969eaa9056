// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolution of the originating call site from a raw call stack.
//!
//! The stack is scanned outward from the innermost frame. Frames up to and
//! including the logger's entry point are skipped, followed by any frames
//! that carry no useful location (dispatch wrappers, error-handler shims,
//! native frames). The first remaining frame is the origin; everything
//! outward from it becomes the stored backtrace.

use logship_core::{BacktraceFrame, ExceptionInfo, FrameArg};
use logship_redact::redact_frame_arguments;
use tracing::trace;

/// Identifies a frame by function name and, optionally, owning type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameMatcher {
	pub class: Option<String>,
	pub function: String,
}

impl FrameMatcher {
	pub fn new(class: Option<&str>, function: &str) -> Self {
		Self {
			class: class.map(str::to_string),
			function: function.to_string(),
		}
	}

	pub fn matches(&self, frame: &BacktraceFrame) -> bool {
		if frame.function.as_deref() != Some(self.function.as_str()) {
			return false;
		}
		match &self.class {
			Some(class) => frame.class.as_deref() == Some(class.as_str()),
			None => true,
		}
	}
}

const LOGGER_TYPE: &str = "logship_pipeline::logger::Logger";

#[derive(Debug, Clone)]
pub struct LocatorConfig {
	/// Innermost frame belonging to the logger itself.
	pub log_entry: FrameMatcher,
	/// Convenience wrapper that forwards to `log_entry`.
	pub dispatch_wrapper: FrameMatcher,
	/// Entry point that logs an exception passed as its first argument.
	pub exception_entry: FrameMatcher,
	/// `None` keeps every outward frame.
	pub max_frames: Option<usize>,
}

impl Default for LocatorConfig {
	fn default() -> Self {
		Self {
			log_entry: FrameMatcher::new(Some(LOGGER_TYPE), "dispatch"),
			dispatch_wrapper: FrameMatcher::new(Some(LOGGER_TYPE), "log"),
			exception_entry: FrameMatcher::new(Some(LOGGER_TYPE), "log_exception"),
			max_frames: Some(logship_config::DEFAULT_MAX_BACKTRACE_LINES),
		}
	}
}

/// Result of locating the origin of a log call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Located {
	pub file: Option<String>,
	pub line: Option<u32>,
	pub backtrace: Vec<BacktraceFrame>,
	/// Set when the stack showed an exception being logged.
	pub exception: Option<ExceptionInfo>,
}

#[derive(Debug, Clone, Default)]
pub struct FrameLocator {
	config: LocatorConfig,
}

impl FrameLocator {
	pub fn new(config: LocatorConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &LocatorConfig {
		&self.config
	}

	/// Locates the origin in `frames` (innermost first).
	pub fn locate(&self, frames: &[BacktraceFrame]) -> Located {
		let Some(entry) = frames.iter().position(|f| self.config.log_entry.matches(f)) else {
			trace!(frames = frames.len(), "no logger entry frame, using innermost frame");
			return self.finish(frames, 0);
		};

		let mut frames = frames.to_vec();
		let mut anchor = entry;
		let mut index = entry + 1;

		while index < frames.len() {
			let frame = &frames[index];

			if self.config.dispatch_wrapper.matches(frame) {
				anchor = index;
				index += 1;
				continue;
			}

			if self.config.exception_entry.matches(frame) {
				if let Some(exception) = frame.exception_argument() {
					return self.locate_exception(exception);
				}
				anchor = index;
				index += 1;
				continue;
			}

			if is_error_handler(frame) {
				trace!(index, "skipping error handler frame");
				anchor = index;
				index += 1;
				continue;
			}

			if frame.has_no_location() {
				let (file, line) = frames
					.get(index + 1)
					.map(|next| (next.file.clone(), next.line))
					.unwrap_or((None, None));
				frames[index].file = file;
				frames[index].line = line;
				anchor = index;
				index += 1;
				continue;
			}

			return self.finish(&frames, index);
		}

		// Ran out of frames: the last skipped frame is the best we have.
		self.finish(&frames, anchor)
	}

	/// The one-frame result used whenever an exception is being logged.
	pub fn locate_exception(&self, exception: &ExceptionInfo) -> Located {
		Located {
			file: exception.file.clone(),
			line: exception.line,
			backtrace: vec![exception.frame()],
			exception: Some(exception.clone()),
		}
	}

	fn finish(&self, frames: &[BacktraceFrame], origin: usize) -> Located {
		let Some(frame) = frames.get(origin) else {
			return Located::default();
		};

		let outward = &frames[origin + 1..];
		let keep = self
			.config
			.max_frames
			.map_or(outward.len(), |max| max.min(outward.len()));
		let mut backtrace = outward[..keep].to_vec();
		redact_frame_arguments(&mut backtrace);

		Located {
			file: frame.file.clone(),
			line: frame.line,
			backtrace,
			exception: None,
		}
	}
}

/// An error-handler shim receives `(code, message, file, line[, context])`
/// where file/line repeat the frame's own location.
fn is_error_handler(frame: &BacktraceFrame) -> bool {
	if !matches!(frame.args.len(), 4 | 5) {
		return false;
	}
	let file_matches = match (&frame.args[2], frame.file.as_deref()) {
		(FrameArg::String(arg), Some(file)) => arg == file,
		(FrameArg::Null, None) => true,
		_ => false,
	};
	let line_matches = match (&frame.args[3], frame.line) {
		(FrameArg::Integer(arg), Some(line)) => *arg == i64::from(line),
		(FrameArg::Null, None) => true,
		_ => false,
	};
	file_matches && line_matches
}
