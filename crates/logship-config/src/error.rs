// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config file {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config file {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },

	#[error("invalid target map: {0}")]
	TargetMap(String),
}
