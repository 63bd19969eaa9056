// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

/// Ad hoc extra data attached to every external dispatch.
///
/// Cloning is cheap and shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct ExtraRegistry {
	inner: Arc<RwLock<Map<String, Value>>>,
}

impl ExtraRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&self, key: impl Into<String>, value: Value) {
		self.inner.write().insert(key.into(), value);
	}

	pub fn remove(&self, key: &str) {
		self.inner.write().remove(key);
	}

	pub fn clear(&self) {
		self.inner.write().clear();
	}

	pub fn snapshot(&self) -> Map<String, Value> {
		self.inner.read().clone()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.read().is_empty()
	}
}
