// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Conversion of logship events into Sentry protocol events.

use std::time::SystemTime;

use logship_core::{BacktraceFrame, Event};
use sentry::protocol::{Event as SentryEvent, Exception, Frame, Stacktrace};
use sentry::Level;

pub const PLATFORM: &str = "other";

/// Function prefixes never reported as application code.
pub const IN_APP_EXCLUDE: &[&str] = &[
	"std::",
	"core::",
	"alloc::",
	"<std::",
	"<core::",
	"<alloc::",
	"tokio::",
	"futures::",
	"tracing::",
	"backtrace::",
	"sentry::",
	"logship_",
	"<logship_",
	"rust_begin_unwind",
	"__rust_",
];

/// Per-sink settings applied while converting.
#[derive(Debug, Clone, Copy)]
pub struct FrameOptions<'a> {
	/// Prefix stripped from absolute file paths to form `filename`.
	pub base_path: Option<&'a str>,
	pub in_app_exclude: &'a [&'static str],
}

/// Exception events become an exception value with a one-frame trace at
/// the raise site. Everything else becomes a message carrying the stored
/// backtrace, oldest call first, with the event's own location innermost.
pub fn to_sentry_event(event: &Event, level: Level, logger: &str, frames: FrameOptions<'_>) -> SentryEvent<'static> {
	let mut converted = SentryEvent {
		level,
		logger: Some(logger.to_string()),
		platform: PLATFORM.into(),
		timestamp: SystemTime::from(event.timestamp),
		server_name: event.hostname.clone().map(Into::into),
		..Default::default()
	};

	match &event.exception {
		Some(exception) => {
			let trace = Stacktrace {
				frames: vec![convert_frame(&exception.frame(), frames)],
				..Default::default()
			};
			converted.exception = vec![Exception {
				ty: exception.kind.clone(),
				value: Some(exception.message.clone()),
				stacktrace: Some(trace),
				..Default::default()
			}]
			.into();
		}
		None => {
			let mut trace: Vec<Frame> = event
				.backtrace_frames()
				.iter()
				.rev()
				.map(|frame| convert_frame(frame, frames))
				.collect();
			let origin = BacktraceFrame::location(event.file.clone(), event.line);
			trace.push(convert_frame(&origin, frames));

			converted.message = Some(event.message.clone());
			converted.stacktrace = Some(Stacktrace {
				frames: trace,
				..Default::default()
			});
		}
	}

	converted
}

fn convert_frame(frame: &BacktraceFrame, options: FrameOptions<'_>) -> Frame {
	let function = frame.qualified_function();
	let in_app = function
		.as_deref()
		.map(|name| !options.in_app_exclude.iter().any(|prefix| name.starts_with(prefix)));
	Frame {
		module: frame.class.clone(),
		filename: frame.file.as_deref().map(|file| relative_path(file, options.base_path)),
		abs_path: frame.file.clone(),
		lineno: frame.line.map(u64::from),
		function,
		in_app,
		..Default::default()
	}
}

fn relative_path(file: &str, base_path: Option<&str>) -> String {
	match base_path.and_then(|base| file.strip_prefix(base)) {
		Some(rest) => rest.trim_start_matches('/').to_string(),
		None => file.to_string(),
	}
}
