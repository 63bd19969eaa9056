// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// A routing rule that could not be compiled. The rule stays in place and
/// never matches.
#[derive(Debug, Error)]
pub enum RoutingError {
	#[error("target rule {index} has an invalid pattern '{pattern}': {source}")]
	InvalidPattern {
		index: usize,
		pattern: String,
		#[source]
		source: regex::Error,
	},
}
