// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sensitive-data masking for log events.
//!
//! Two independent mechanisms:
//! - [`KeyPathRedactor`] masks configured dot-separated key paths inside
//!   request payloads.
//! - [`redact_frame_arguments`] blanks string arguments of frames belonging
//!   to credential-handling functions.

pub mod arguments;
pub mod payload;

pub use arguments::{is_sensitive_function, redact_frame_arguments, ARGUMENT_MARKER, SENSITIVE_FUNCTIONS};
pub use payload::{KeyPath, KeyPathRedactor, MASK};
