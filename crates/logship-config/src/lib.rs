// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Layered configuration for the logship logger.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Priority threshold parsing with `"default"` inheritance
//! - Consistent environment variable naming (`LOGSHIP_*`)
//!
//! # Usage
//!
//! ```ignore
//! use logship_config::load_config;
//!
//! let config = load_config()?;
//! println!("routing {} rules", config.general.target_map.len());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::LoggerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info, warn};

/// Fully resolved logger configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoggerConfig {
	pub general: GeneralConfig,
	pub sentry: SentryConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`LOGSHIP_*`)
/// 2. Config file (`/etc/logship/logship.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<LoggerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<LoggerConfig, ConfigError> {
	let mut merged = LoggerConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<LoggerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<LoggerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = LoggerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: LoggerConfigLayer) -> Result<LoggerConfig, ConfigError> {
	let mut general = layer.general.unwrap_or_default().finalize();
	let sentry = layer.sentry.unwrap_or_default().finalize();

	drop_invalid_rules(&mut general);

	info!(
		targets = general.targets.len(),
		rules = general.target_map.len(),
		priority = ?general.priority,
		max_backtrace_lines = ?general.max_backtrace_lines,
		redacted_keys = general.filter_request_data.len(),
		sentry_enabled = sentry.is_enabled(),
		"Logger configuration loaded"
	);

	Ok(LoggerConfig { general, sentry })
}

/// Rules must name a target and a pattern. Broken rules are dropped with a
/// warning so the remaining routing still loads.
fn drop_invalid_rules(general: &mut GeneralConfig) {
	let mut index = 0;
	general.target_map.retain(|rule| {
		let problem = if rule.target.trim().is_empty() {
			Some("target must not be empty")
		} else if rule.pattern.is_empty() {
			Some("pattern must not be empty")
		} else {
			None
		};
		if let Some(problem) = problem {
			warn!(
				key = %format!("general.target_map[{index}]"),
				pattern = %rule.pattern,
				problem,
				"Ignoring invalid target rule"
			);
		}
		index += 1;
		problem.is_none()
	});
}
