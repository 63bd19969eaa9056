// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Sentry sink for logship.
//!
//! Maps log priorities to Sentry levels, infers a priority from common
//! message prefixes, and captures events through a `sentry` client bound
//! to the configured DSN.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use logship_pipeline::{Logger, PriorityFilter};
//! use logship_sentry::SentrySinkBuilder;
//!
//! let config = logship_config::load_config()?;
//! let sentry = SentrySinkBuilder::from_config(&config)
//!     .tag("instance_uid", "shop-eu-1")
//!     .build();
//! let logger = Logger::builder(config.general.clone())
//!     .sink_with_filter(Arc::new(sentry), PriorityFilter::default())
//!     .build();
//! ```

pub mod convert;
pub mod error;
pub mod severity;
pub mod sink;

pub use convert::{to_sentry_event, FrameOptions, IN_APP_EXCLUDE};
pub use error::{Result, SentryError};
pub use sentry::{Level, Scope};
pub use severity::{infer_priority, level_for, resolve_priority};
pub use sink::{SentrySink, SentrySinkBuilder, DEFAULT_SINK_CODE};
