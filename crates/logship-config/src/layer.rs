// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::sections::{GeneralConfigLayer, SentryConfigLayer};

/// Partial configuration produced by one source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LoggerConfigLayer {
	pub general: Option<GeneralConfigLayer>,
	pub sentry: Option<SentryConfigLayer>,
}

impl LoggerConfigLayer {
	/// Overlays `other` on top of `self`, field by field.
	pub fn merge(&mut self, other: Self) {
		if let Some(general) = other.general {
			match self.general.as_mut() {
				Some(base) => base.merge(general),
				None => self.general = Some(general),
			}
		}
		if let Some(sentry) = other.sentry {
			match self.sentry.as_mut() {
				Some(base) => base.merge(sentry),
				None => self.sentry = Some(sentry),
			}
		}
	}
}
