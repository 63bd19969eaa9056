// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::error::WriteError;
use crate::event::Event;

/// A log destination.
///
/// Sinks receive an already enriched event and may mutate it further (the
/// external sink infers a priority, for instance). Any failure is reported as
/// a [`WriteError`].
pub trait Sink: Send + Sync {
	/// Target code this sink is registered under.
	fn code(&self) -> &str;

	fn write(&self, event: &mut Event) -> Result<(), WriteError>;
}
