// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The enriched log record passed to every sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::frame::{BacktraceFrame, ExceptionInfo};
use crate::priority::Priority;

/// One log record.
///
/// An event is created per log call, populated once by the enricher and then
/// handed to each matched sink in turn. `store_code` doubles as the
/// "already enriched" marker: once it is set, only `backtrace_enabled` may
/// change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
	pub timestamp: DateTime<Utc>,
	pub message: String,
	pub priority: Option<Priority>,
	pub priority_name: Option<String>,
	pub request_id: Option<String>,
	pub file: Option<String>,
	pub line: Option<u32>,
	/// Whether the sink currently being notified wants the backtrace.
	pub backtrace_enabled: bool,
	/// `None` until the stack has been resolved.
	pub backtrace: Option<Vec<BacktraceFrame>>,
	pub exception: Option<ExceptionInfo>,
	pub store_code: Option<String>,
	pub admin_user_id: Option<String>,
	pub admin_user_name: Option<String>,
	/// Seconds since the request started.
	pub time_elapsed: Option<f64>,
	pub request_method: Option<String>,
	pub request_uri: Option<String>,
	pub http_user_agent: Option<String>,
	pub http_host: Option<String>,
	pub http_cookie: Option<String>,
	pub request_data: Option<String>,
	pub session_data: Option<String>,
	pub remote_address: Option<String>,
	pub hostname: Option<String>,
}

impl Event {
	pub fn new(priority: Priority, message: impl Into<String>) -> Self {
		let mut event = Self::blank(message);
		event.set_priority(priority);
		event
	}

	/// An event with no priority; sinks decide how to treat it.
	pub fn blank(message: impl Into<String>) -> Self {
		Self {
			timestamp: Utc::now(),
			message: message.into(),
			priority: None,
			priority_name: None,
			request_id: None,
			file: None,
			line: None,
			backtrace_enabled: false,
			backtrace: None,
			exception: None,
			store_code: None,
			admin_user_id: None,
			admin_user_name: None,
			time_elapsed: None,
			request_method: None,
			request_uri: None,
			http_user_agent: None,
			http_host: None,
			http_cookie: None,
			request_data: None,
			session_data: None,
			remote_address: None,
			hostname: None,
		}
	}

	/// An ERR event wrapping `exception`; its message is the exception text.
	pub fn from_exception(exception: ExceptionInfo) -> Self {
		let mut event = Self::new(Priority::Err, exception.message.clone());
		event.exception = Some(exception);
		event
	}

	pub fn set_priority(&mut self, priority: Priority) {
		self.priority = Some(priority);
		self.priority_name = Some(priority.name().to_string());
	}

	pub fn is_enriched(&self) -> bool {
		self.store_code.is_some()
	}

	/// Stored backtrace frames, empty when none were resolved.
	pub fn backtrace_frames(&self) -> &[BacktraceFrame] {
		self.backtrace.as_deref().unwrap_or(&[])
	}
}
