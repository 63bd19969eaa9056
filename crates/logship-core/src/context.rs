// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request context consumed during enrichment.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::SystemTime;

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
	pub user_id: String,
	pub user_name: String,
}

/// An administrative session. `user` is `None` while not logged in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
	pub user: Option<SessionIdentity>,
}

/// When the current request started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStart {
	/// High-resolution start time.
	Precise(SystemTime),
	/// Unix seconds, when only whole-second resolution is available.
	Seconds(u64),
}

/// Everything the enricher reads about the current request.
///
/// A snapshot without `method` is treated as a non-HTTP invocation (CLI, cron).
#[derive(Debug, Clone, Default)]
pub struct RequestSnapshot {
	pub store_code: String,
	pub method: Option<String>,
	pub uri: Option<String>,
	/// Header names are matched case-insensitively.
	pub headers: HashMap<String, String>,
	pub query: serde_json::Map<String, serde_json::Value>,
	pub post: serde_json::Map<String, serde_json::Value>,
	pub files: serde_json::Map<String, serde_json::Value>,
	pub raw_body: Option<String>,
	pub session_id: Option<String>,
	pub session: Option<serde_json::Map<String, serde_json::Value>>,
	/// Direct peer address.
	pub remote_addr: Option<String>,
	/// `Some` when the request belongs to the admin area and a session exists.
	pub admin: Option<AdminSession>,
	/// Authenticated API session user.
	pub api_user: Option<SessionIdentity>,
	pub started_at: Option<RequestStart>,
}

impl RequestSnapshot {
	pub fn new(store_code: impl Into<String>) -> Self {
		Self {
			store_code: store_code.into(),
			..Default::default()
		}
	}

	/// Non-empty header value, matched case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
			.filter(|value| !value.is_empty())
	}

	pub fn is_http(&self) -> bool {
		self.method.as_deref().is_some_and(|m| !m.is_empty())
	}
}

/// Supplies the current request context.
pub trait ContextProvider: Send + Sync {
	fn snapshot(&self) -> RequestSnapshot;
}

impl ContextProvider for RequestSnapshot {
	fn snapshot(&self) -> RequestSnapshot {
		self.clone()
	}
}
