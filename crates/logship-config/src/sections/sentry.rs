// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sentry sink configuration section.

use logship_core::Priority;
use serde::{Deserialize, Serialize};

use super::general::{parse_priority_threshold, GeneralConfig};

pub const DEFAULT_SENTRY_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SentryConfigLayer {
	pub dsn: Option<String>,
	pub environment: Option<String>,
	/// A priority name/code, or `"default"` to use `general.priority`.
	pub priority: Option<String>,
	/// Local path prefix stripped from reported file names.
	pub base_path: Option<String>,
	pub request_timeout_secs: Option<u64>,
}

impl SentryConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.dsn.is_some() {
			self.dsn = other.dsn;
		}
		if other.environment.is_some() {
			self.environment = other.environment;
		}
		if other.priority.is_some() {
			self.priority = other.priority;
		}
		if other.base_path.is_some() {
			self.base_path = other.base_path;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
	}

	pub fn finalize(self) -> SentryConfig {
		SentryConfig {
			dsn: non_blank(self.dsn),
			environment: non_blank(self.environment),
			priority: self
				.priority
				.and_then(|raw| parse_priority_threshold("sentry.priority", &raw)),
			base_path: non_blank(self.base_path),
			request_timeout_secs: self
				.request_timeout_secs
				.unwrap_or(DEFAULT_SENTRY_TIMEOUT_SECS),
		}
	}
}

fn non_blank(value: Option<String>) -> Option<String> {
	value
		.map(|v| v.trim().to_string())
		.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentryConfig {
	/// No DSN means the sink stays permanently unavailable.
	pub dsn: Option<String>,
	pub environment: Option<String>,
	/// `None` inherits the general priority.
	pub priority: Option<Priority>,
	pub base_path: Option<String>,
	pub request_timeout_secs: u64,
}

impl Default for SentryConfig {
	fn default() -> Self {
		SentryConfigLayer::default().finalize()
	}
}

impl SentryConfig {
	pub fn is_enabled(&self) -> bool {
		self.dsn.is_some()
	}

	/// Effective maximum priority for the sink.
	pub fn threshold(&self, general: &GeneralConfig) -> Option<Priority> {
		self.priority.or(general.priority)
	}
}
