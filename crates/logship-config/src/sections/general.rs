// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! General logger configuration section: targets, routing and enrichment.

use std::collections::BTreeMap;

use logship_core::Priority;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;

pub const DEFAULT_MAX_BACKTRACE_LINES: usize = 10;
pub const DEFAULT_MAX_DATA_LENGTH: usize = 1000;

/// One routing rule as written in configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetRuleConfig {
	pub pattern: String,
	pub target: String,
	#[serde(default)]
	pub backtrace: bool,
	#[serde(default)]
	pub stop_on_match: bool,
}

/// Which request payload sources go through the key-path redactor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RedactionScope {
	pub query: bool,
	pub post: bool,
	pub files: bool,
	/// Only applied when the raw body is a JSON object.
	pub raw_body: bool,
}

impl Default for RedactionScope {
	fn default() -> Self {
		Self {
			query: true,
			post: true,
			files: false,
			raw_body: false,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfigLayer {
	pub targets: Option<Vec<String>>,
	pub target_map: Option<Vec<TargetRuleConfig>>,
	pub priority: Option<String>,
	pub target_priorities: Option<BTreeMap<String, String>>,
	pub max_backtrace_lines: Option<usize>,
	pub max_data_length: Option<usize>,
	pub pretty_print: Option<bool>,
	pub add_session_data: Option<bool>,
	pub filter_request_data: Option<Vec<String>>,
	pub redact_sources: Option<RedactionScope>,
}

impl GeneralConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.targets.is_some() {
			self.targets = other.targets;
		}
		if other.target_map.is_some() {
			self.target_map = other.target_map;
		}
		if other.priority.is_some() {
			self.priority = other.priority;
		}
		if other.target_priorities.is_some() {
			self.target_priorities = other.target_priorities;
		}
		if other.max_backtrace_lines.is_some() {
			self.max_backtrace_lines = other.max_backtrace_lines;
		}
		if other.max_data_length.is_some() {
			self.max_data_length = other.max_data_length;
		}
		if other.pretty_print.is_some() {
			self.pretty_print = other.pretty_print;
		}
		if other.add_session_data.is_some() {
			self.add_session_data = other.add_session_data;
		}
		if other.filter_request_data.is_some() {
			self.filter_request_data = other.filter_request_data;
		}
		if other.redact_sources.is_some() {
			self.redact_sources = other.redact_sources;
		}
	}

	pub fn finalize(self) -> GeneralConfig {
		let targets = self
			.targets
			.unwrap_or_default()
			.into_iter()
			.map(|t| t.trim().to_string())
			.filter(|t| !t.is_empty())
			.collect();

		let target_priorities = self
			.target_priorities
			.unwrap_or_default()
			.into_iter()
			.filter_map(|(target, raw)| {
				let key = format!("general.target_priorities.{target}");
				parse_priority_threshold(&key, &raw).map(|p| (target, p))
			})
			.collect();

		let max_backtrace_lines = match self
			.max_backtrace_lines
			.unwrap_or(DEFAULT_MAX_BACKTRACE_LINES)
		{
			0 => None,
			n => Some(n),
		};

		let max_data_length = match self.max_data_length {
			Some(0) | None => DEFAULT_MAX_DATA_LENGTH,
			Some(n) => n,
		};

		let filter_request_data = self
			.filter_request_data
			.unwrap_or_default()
			.into_iter()
			.map(|k| k.trim().to_string())
			.filter(|k| !k.is_empty())
			.collect();

		GeneralConfig {
			targets,
			target_map: self.target_map.unwrap_or_default(),
			priority: self
				.priority
				.and_then(|raw| parse_priority_threshold("general.priority", &raw)),
			target_priorities,
			max_backtrace_lines,
			max_data_length,
			pretty_print: self.pretty_print.unwrap_or(false),
			add_session_data: self.add_session_data.unwrap_or(false),
			filter_request_data,
			redact_sources: self.redact_sources.unwrap_or_default(),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneralConfig {
	/// Enabled target codes; events with no routed target go to all of them.
	pub targets: Vec<String>,
	pub target_map: Vec<TargetRuleConfig>,
	/// Global maximum priority; `None` lets everything through.
	pub priority: Option<Priority>,
	pub target_priorities: BTreeMap<String, Priority>,
	/// `None` keeps every frame.
	pub max_backtrace_lines: Option<usize>,
	pub max_data_length: usize,
	pub pretty_print: bool,
	pub add_session_data: bool,
	/// Dot-separated key paths masked in request payloads.
	pub filter_request_data: Vec<String>,
	pub redact_sources: RedactionScope,
}

impl Default for GeneralConfig {
	fn default() -> Self {
		GeneralConfigLayer::default().finalize()
	}
}

impl GeneralConfig {
	/// Maximum priority for a target: its own override, else the global one.
	pub fn priority_for(&self, target: &str) -> Option<Priority> {
		self.target_priorities.get(target).copied().or(self.priority)
	}
}

/// Parses a priority threshold. `"default"` and blank values mean "inherit"
/// and yield `None`; unparseable values are logged and also yield `None`.
pub fn parse_priority_threshold(key: &str, raw: &str) -> Option<Priority> {
	let trimmed = raw.trim();
	if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("default") {
		return None;
	}
	match trimmed.parse() {
		Ok(priority) => Some(priority),
		Err(e) => {
			warn!(key, error = %e, "ignoring invalid priority threshold");
			None
		}
	}
}

/// Parses a JSON-encoded rule list, e.g. from an environment variable.
pub fn parse_target_map_json(json: &str) -> Result<Vec<TargetRuleConfig>, ConfigError> {
	serde_json::from_str(json).map_err(|e| ConfigError::TargetMap(e.to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = GeneralConfigLayer::default().finalize();
		assert!(config.targets.is_empty());
		assert!(config.target_map.is_empty());
		assert_eq!(config.priority, None);
		assert_eq!(config.max_backtrace_lines, Some(DEFAULT_MAX_BACKTRACE_LINES));
		assert_eq!(config.max_data_length, DEFAULT_MAX_DATA_LENGTH);
		assert!(!config.pretty_print);
		assert!(!config.add_session_data);
		assert_eq!(config.redact_sources, RedactionScope::default());
	}

	#[test]
	fn test_zero_backtrace_lines_means_unlimited() {
		let layer = GeneralConfigLayer {
			max_backtrace_lines: Some(0),
			..Default::default()
		};
		assert_eq!(layer.finalize().max_backtrace_lines, None);
	}

	#[test]
	fn test_zero_data_length_falls_back_to_default() {
		let layer = GeneralConfigLayer {
			max_data_length: Some(0),
			..Default::default()
		};
		assert_eq!(layer.finalize().max_data_length, DEFAULT_MAX_DATA_LENGTH);
	}

	#[test]
	fn test_priority_for_prefers_target_override() {
		let mut target_priorities = BTreeMap::new();
		target_priorities.insert("sentry".to_string(), "warn".to_string());
		target_priorities.insert("file".to_string(), "default".to_string());
		let layer = GeneralConfigLayer {
			priority: Some("3".to_string()),
			target_priorities: Some(target_priorities),
			..Default::default()
		};
		let config = layer.finalize();

		assert_eq!(config.priority_for("sentry"), Some(Priority::Warn));
		assert_eq!(config.priority_for("file"), Some(Priority::Err));
		assert_eq!(config.priority_for("db"), Some(Priority::Err));
	}

	#[test]
	fn test_invalid_priority_is_ignored() {
		let layer = GeneralConfigLayer {
			priority: Some("chatty".to_string()),
			..Default::default()
		};
		assert_eq!(layer.finalize().priority, None);
	}

	#[test]
	fn test_filter_keys_are_trimmed() {
		let layer = GeneralConfigLayer {
			filter_request_data: Some(vec![
				" billing.cc_number ".to_string(),
				String::new(),
				"password".to_string(),
			]),
			..Default::default()
		};
		assert_eq!(
			layer.finalize().filter_request_data,
			vec!["billing.cc_number".to_string(), "password".to_string()]
		);
	}

	#[test]
	fn test_merge_overwrites_and_preserves() {
		let mut base = GeneralConfigLayer {
			targets: Some(vec!["file".to_string()]),
			pretty_print: Some(true),
			..Default::default()
		};
		base.merge(GeneralConfigLayer {
			targets: Some(vec!["sentry".to_string()]),
			..Default::default()
		});
		assert_eq!(base.targets, Some(vec!["sentry".to_string()]));
		assert_eq!(base.pretty_print, Some(true));
	}

	#[test]
	fn test_parse_target_map_json() {
		let rules = parse_target_map_json(
			r#"[{"pattern":"exception\\.log","target":"sentry","backtrace":true,"stop_on_match":true},
			    {"pattern":".*","target":"file"}]"#,
		)
		.unwrap();
		assert_eq!(rules.len(), 2);
		assert!(rules[0].backtrace);
		assert!(rules[0].stop_on_match);
		assert!(!rules[1].backtrace);

		assert!(matches!(
			parse_target_map_json("{not json"),
			Err(ConfigError::TargetMap(_))
		));
	}

	#[test]
	fn test_toml_target_map() {
		let layer: GeneralConfigLayer = toml::from_str(
			r#"
targets = ["file", "sentry"]
priority = "ERR"

[[target_map]]
pattern = "payment.*"
target = "sentry"
backtrace = true

[redact_sources]
files = true
"#,
		)
		.unwrap();
		let config = layer.finalize();
		assert_eq!(config.targets, vec!["file".to_string(), "sentry".to_string()]);
		assert_eq!(config.target_map[0].target, "sentry");
		assert!(!config.target_map[0].stop_on_match);
		assert!(config.redact_sources.query);
		assert!(config.redact_sources.files);
	}

	mod proptests {
		use super::*;
		use proptest::prelude::*;

		proptest! {
			#[test]
			fn finalized_data_length_is_never_zero(raw in proptest::option::of(0usize..10_000)) {
				let layer = GeneralConfigLayer {
					max_data_length: raw,
					..Default::default()
				};
				prop_assert!(layer.finalize().max_data_length > 0);
			}

			#[test]
			fn numeric_thresholds_round_trip(code in 0u8..=7) {
				let parsed = parse_priority_threshold("k", &code.to_string());
				prop_assert_eq!(parsed.map(|p| p.as_u8()), Some(code));
			}
		}
	}
}
