// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Log event enrichment and multi-sink dispatch.
//!
//! A [`Logger`] call flows through:
//! 1. [`TargetRouter`]: channel name → ordered targets with backtrace flags
//! 2. [`PriorityFilter`]: per-sink maximum priority
//! 3. [`Enricher`]: call site via [`FrameLocator`], request context,
//!    redacted payloads; performed once per event
//! 4. [`logship_core::Sink::write`] for each selected sink
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use logship_pipeline::{Logger, TracingSink};
//!
//! let config = logship_config::load_config()?;
//! let logger = Logger::builder(config.general)
//!     .sink(Arc::new(TracingSink::new("system")))
//!     .build();
//! logger.log("system.log", logship_core::Priority::Warn, "disk almost full")?;
//! ```

pub mod enrich;
pub mod error;
pub mod filter;
pub mod locator;
pub mod logger;
pub mod router;
pub mod sink;
pub mod stack;

pub use enrich::{generate_request_id, Enricher, EnrichmentSettings};
pub use error::RoutingError;
pub use filter::PriorityFilter;
pub use locator::{FrameLocator, FrameMatcher, Located, LocatorConfig};
pub use logger::{Logger, LoggerBuilder};
pub use router::{RoutedTargets, TargetMap, TargetRouter, TargetRule};
pub use sink::TracingSink;
pub use stack::BacktraceStack;
