// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use logship_core::{Event, Priority};

/// Per-sink maximum priority. Events less severe than `max` are skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorityFilter {
	pub max: Option<Priority>,
}

impl PriorityFilter {
	pub fn new(max: Option<Priority>) -> Self {
		Self { max }
	}

	/// Events without a priority are treated as errors.
	pub fn allows(&self, event: &Event) -> bool {
		match self.max {
			Some(max) => event.priority.unwrap_or(Priority::Err).within(max),
			None => true,
		}
	}
}
