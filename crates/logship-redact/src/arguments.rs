// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Argument scrubbing for frames of credential-handling functions.

use logship_core::{BacktraceFrame, FrameArg};

/// Replacement for string arguments of sensitive frames.
pub const ARGUMENT_MARKER: &str = "**redacted**";

/// Functions whose string arguments are assumed to carry credentials.
pub const SENSITIVE_FUNCTIONS: &[&str] = &["login", "authenticate", "setPassword", "validatePassword"];

/// Matches on the last path segment, so `Session::login` and
/// `auth::session::login` both count.
pub fn is_sensitive_function(function: &str) -> bool {
	let name = function.rsplit("::").next().unwrap_or(function);
	SENSITIVE_FUNCTIONS.contains(&name)
}

/// Replaces string arguments of sensitive frames with [`ARGUMENT_MARKER`].
/// Structured arguments are left alone.
pub fn redact_frame_arguments(frames: &mut [BacktraceFrame]) {
	for frame in frames.iter_mut() {
		let sensitive = frame
			.function
			.as_deref()
			.is_some_and(is_sensitive_function);
		if !sensitive {
			continue;
		}
		for arg in frame.args.iter_mut() {
			if let FrameArg::String(value) = arg {
				*value = ARGUMENT_MARKER.to_string();
			}
		}
	}
}
