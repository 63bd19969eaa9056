// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Sentry sink.

use thiserror::Error;

/// Result type alias for Sentry operations.
pub type Result<T> = std::result::Result<T, SentryError>;

/// Errors raised while setting up the client or capturing an event.
#[derive(Debug, Error)]
pub enum SentryError {
	/// The DSN could not be parsed.
	#[error("invalid DSN: {0}")]
	InvalidDsn(#[from] sentry::types::ParseDsnError),

	/// The HTTP client backing the transport could not be built.
	#[error("HTTP client setup failed: {0}")]
	HttpClient(#[from] reqwest::Error),

	/// The client accepted the event but did not queue it for delivery.
	#[error("event was discarded before sending")]
	Discarded,
}
