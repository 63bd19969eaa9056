// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Dot-separated key-path masking of nested request payloads.

use std::fmt;

use serde_json::{Map, Value};
use tracing::trace;

/// Replacement for masked payload values.
pub const MASK: &str = "*****";

/// A parsed key path such as `billing.cc_number` or `items.0.secret`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPath {
	segments: Vec<String>,
}

impl KeyPath {
	/// Parses a dotted path. Returns `None` for blank input.
	pub fn parse(raw: &str) -> Option<Self> {
		let raw = raw.trim();
		if raw.is_empty() {
			return None;
		}
		Some(Self {
			segments: raw.split('.').map(str::to_string).collect(),
		})
	}

	pub fn segments(&self) -> &[String] {
		&self.segments
	}

	/// Masks the value at this path in `root`. Returns whether a value was
	/// replaced; missing or non-container intermediates are skipped.
	pub fn mask(&self, root: &mut Value) -> bool {
		let Some((last, parents)) = self.segments.split_last() else {
			return false;
		};

		let mut current = root;
		for segment in parents {
			current = match step(current, segment) {
				Some(next) => next,
				None => return false,
			};
		}

		match step(current, last) {
			Some(slot) => {
				*slot = Value::String(MASK.to_string());
				true
			}
			None => false,
		}
	}
}

impl fmt::Display for KeyPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.segments.join("."))
	}
}

fn step<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
	match value {
		Value::Object(map) => map.get_mut(segment),
		Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
		_ => None,
	}
}

/// Masks a fixed set of key paths in payload maps.
#[derive(Debug, Clone, Default)]
pub struct KeyPathRedactor {
	paths: Vec<KeyPath>,
}

impl KeyPathRedactor {
	pub fn new<I, S>(paths: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self {
			paths: paths
				.into_iter()
				.filter_map(|p| KeyPath::parse(p.as_ref()))
				.collect(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.paths.is_empty()
	}

	pub fn paths(&self) -> &[KeyPath] {
		&self.paths
	}

	/// Applies every configured path to `value` in place.
	pub fn redact(&self, value: &mut Value) {
		for path in &self.paths {
			if path.mask(value) {
				trace!(path = %path, "masked payload value");
			}
		}
	}

	/// Applies every configured path to a top-level payload map in place.
	pub fn redact_map(&self, map: &mut Map<String, Value>) {
		if self.paths.is_empty() {
			return;
		}
		let mut value = Value::Object(std::mem::take(map));
		self.redact(&mut value);
		if let Value::Object(redacted) = value {
			*map = redacted;
		}
	}

	/// Redacts a raw request body when it is a JSON object; any other body is
	/// returned unchanged.
	pub fn redact_raw_body(&self, body: &str) -> String {
		if self.paths.is_empty() {
			return body.to_string();
		}
		match serde_json::from_str::<Value>(body) {
			Ok(mut value @ Value::Object(_)) => {
				self.redact(&mut value);
				value.to_string()
			}
			_ => body.to_string(),
		}
	}
}
