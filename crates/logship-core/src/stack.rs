// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use crate::frame::BacktraceFrame;

/// Supplies the current call stack, innermost frame first.
pub trait StackSnapshotProvider: Send + Sync {
	fn capture(&self) -> Vec<BacktraceFrame>;
}

/// A fixed stack, for hosts that record frames themselves and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticStack(pub Vec<BacktraceFrame>);

impl StackSnapshotProvider for StaticStack {
	fn capture(&self) -> Vec<BacktraceFrame> {
		self.0.clone()
	}
}
