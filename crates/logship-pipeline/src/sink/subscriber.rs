// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use logship_core::{Event, Priority, Sink, WriteError};
use tracing::{debug, error, info, warn};

/// Forwards events to the `tracing` subscriber installed by the host.
#[derive(Debug, Clone)]
pub struct TracingSink {
	code: String,
}

impl TracingSink {
	pub fn new(code: impl Into<String>) -> Self {
		Self { code: code.into() }
	}
}

impl Default for TracingSink {
	fn default() -> Self {
		Self::new("tracing")
	}
}

macro_rules! emit {
	($level:ident, $event:expr, $code:expr) => {
		$level!(
			target: "logship",
			sink = %$code,
			priority = $event.priority_name.as_deref().unwrap_or("ERR"),
			request_id = $event.request_id.as_deref().unwrap_or_default(),
			store = $event.store_code.as_deref().unwrap_or_default(),
			file = $event.file.as_deref().unwrap_or_default(),
			line = $event.line.unwrap_or_default(),
			frames = if $event.backtrace_enabled { $event.backtrace_frames().len() } else { 0 },
			"{}",
			$event.message
		)
	};
}

impl Sink for TracingSink {
	fn code(&self) -> &str {
		&self.code
	}

	fn write(&self, event: &mut Event) -> Result<(), WriteError> {
		match event.priority.unwrap_or(Priority::Err) {
			Priority::Emerg | Priority::Alert | Priority::Crit | Priority::Err => {
				emit!(error, event, self.code)
			}
			Priority::Warn => emit!(warn, event, self.code),
			Priority::Notice | Priority::Info => emit!(info, event, self.code),
			Priority::Debug => emit!(debug, event, self.code),
		}
		Ok(())
	}
}
