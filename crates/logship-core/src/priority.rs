// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Syslog-style log priorities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// RFC 5424 severity. A larger numeric value is less severe.
///
/// The derived ordering follows the numeric value, so `Priority::Debug >
/// Priority::Err` reads as "debug is further down the scale than error".
#[derive(
	Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
	Emerg = 0,
	Alert = 1,
	Crit = 2,
	#[default]
	Err = 3,
	Warn = 4,
	Notice = 5,
	Info = 6,
	Debug = 7,
}

impl Priority {
	/// Returns the numeric syslog code.
	pub fn as_u8(&self) -> u8 {
		*self as u8
	}

	pub fn from_u8(value: u8) -> Option<Self> {
		match value {
			0 => Some(Self::Emerg),
			1 => Some(Self::Alert),
			2 => Some(Self::Crit),
			3 => Some(Self::Err),
			4 => Some(Self::Warn),
			5 => Some(Self::Notice),
			6 => Some(Self::Info),
			7 => Some(Self::Debug),
			_ => None,
		}
	}

	/// Upper-case name as stored in `Event::priority_name`.
	pub fn name(&self) -> &'static str {
		match self {
			Self::Emerg => "EMERG",
			Self::Alert => "ALERT",
			Self::Crit => "CRIT",
			Self::Err => "ERR",
			Self::Warn => "WARN",
			Self::Notice => "NOTICE",
			Self::Info => "INFO",
			Self::Debug => "DEBUG",
		}
	}

	/// Returns true when `self` passes a "maximum priority" threshold.
	pub fn within(&self, threshold: Priority) -> bool {
		self.as_u8() <= threshold.as_u8()
	}

	/// Returns all priorities from most to least severe.
	pub fn all() -> &'static [Priority] {
		&[
			Self::Emerg,
			Self::Alert,
			Self::Crit,
			Self::Err,
			Self::Warn,
			Self::Notice,
			Self::Info,
			Self::Debug,
		]
	}
}

impl fmt::Display for Priority {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.name())
	}
}

impl FromStr for Priority {
	type Err = CoreError;

	/// Accepts the numeric code or a case-insensitive name. Common long
	/// spellings (`error`, `warning`, `critical`, `emergency`) are accepted
	/// too.
	fn from_str(s: &str) -> Result<Self, CoreError> {
		let trimmed = s.trim();
		if let Ok(code) = trimmed.parse::<u8>() {
			return Priority::from_u8(code).ok_or_else(|| CoreError::InvalidPriority(s.to_string()));
		}
		match trimmed.to_ascii_lowercase().as_str() {
			"emerg" | "emergency" => Ok(Priority::Emerg),
			"alert" => Ok(Priority::Alert),
			"crit" | "critical" => Ok(Priority::Crit),
			"err" | "error" => Ok(Priority::Err),
			"warn" | "warning" => Ok(Priority::Warn),
			"notice" => Ok(Priority::Notice),
			"info" => Ok(Priority::Info),
			"debug" => Ok(Priority::Debug),
			_ => Err(CoreError::InvalidPriority(s.to_string())),
		}
	}
}
