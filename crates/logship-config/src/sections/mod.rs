// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections.

mod general;
mod sentry;

pub use general::{
	parse_priority_threshold, parse_target_map_json, GeneralConfig, GeneralConfigLayer,
	RedactionScope, TargetRuleConfig, DEFAULT_MAX_BACKTRACE_LINES, DEFAULT_MAX_DATA_LENGTH,
};
pub use sentry::{SentryConfig, SentryConfigLayer, DEFAULT_SENTRY_TIMEOUT_SECS};
