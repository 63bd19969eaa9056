// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types shared across the pipeline.

use thiserror::Error;

/// Errors raised while parsing core values.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("invalid priority: {0}")]
	InvalidPriority(String),
}

/// The only error a sink may return from [`crate::Sink::write`].
///
/// Sinks normalize whatever went wrong (transport failure, serialization,
/// bad state) into this one type so the original error's concrete type never
/// reaches the caller of the log call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("log write failed: {message}")]
pub struct WriteError {
	message: String,
}

impl WriteError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}

	/// Text of the underlying failure.
	pub fn message(&self) -> &str {
		&self.message
	}
}
