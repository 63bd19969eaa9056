// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, trace, warn};

use crate::error::ConfigError;
use crate::layer::LoggerConfigLayer;
use crate::sections::{parse_target_map_json, GeneralConfigLayer, SentryConfigLayer};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<LoggerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<LoggerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(LoggerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/logship/logship.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<LoggerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(LoggerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: LoggerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: LOGSHIP_<FIELD> for general settings, LOGSHIP_SENTRY_<FIELD>
/// for the Sentry sink.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<LoggerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(LoggerConfigLayer {
			general: Some(load_general_from_env()?),
			sentry: Some(load_sentry_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid usize value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn split_list(raw: &str, separators: &[char]) -> Vec<String> {
	raw.split(separators)
		.map(|s| s.trim().to_string())
		.filter(|s| !s.is_empty())
		.collect()
}

/// Parses `target=priority` pairs separated by commas.
fn parse_target_priorities(raw: &str) -> BTreeMap<String, String> {
	split_list(raw, &[','])
		.into_iter()
		.filter_map(|pair| {
			let (target, priority) = pair.split_once('=')?;
			Some((target.trim().to_string(), priority.trim().to_string()))
		})
		.collect()
}

fn load_general_from_env() -> Result<GeneralConfigLayer, ConfigError> {
	let target_map = env_var("LOGSHIP_TARGET_MAP").map(|json| match parse_target_map_json(&json) {
		Ok(rules) => rules,
		Err(e) => {
			warn!(error = %e, "LOGSHIP_TARGET_MAP is not a valid rule list, routing nothing");
			Vec::new()
		}
	});

	Ok(GeneralConfigLayer {
		targets: env_var("LOGSHIP_TARGETS").map(|s| split_list(&s, &[','])),
		target_map,
		priority: env_var("LOGSHIP_PRIORITY"),
		target_priorities: env_var("LOGSHIP_TARGET_PRIORITIES")
			.map(|s| parse_target_priorities(&s)),
		max_backtrace_lines: env_usize("LOGSHIP_MAX_BACKTRACE_LINES")?,
		max_data_length: env_usize("LOGSHIP_MAX_DATA_LENGTH")?,
		pretty_print: env_bool("LOGSHIP_PRETTY_PRINT"),
		add_session_data: env_bool("LOGSHIP_ADD_SESSION_DATA"),
		filter_request_data: env_var("LOGSHIP_FILTER_REQUEST_DATA")
			.map(|s| split_list(&s, &['\n', ','])),
		redact_sources: None,
	})
}

fn load_sentry_from_env() -> Result<SentryConfigLayer, ConfigError> {
	Ok(SentryConfigLayer {
		dsn: env_var("LOGSHIP_SENTRY_DSN"),
		environment: env_var("LOGSHIP_SENTRY_ENVIRONMENT"),
		priority: env_var("LOGSHIP_SENTRY_PRIORITY"),
		base_path: env_var("LOGSHIP_SENTRY_BASE_PATH"),
		request_timeout_secs: env_u64("LOGSHIP_SENTRY_REQUEST_TIMEOUT_SECS")?,
	})
}
