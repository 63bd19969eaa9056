// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the logship log enrichment and dispatch pipeline.
//!
//! This crate provides the shared vocabulary used by the pipeline and every
//! sink implementation:
//!
//! - [`Event`]: the enriched log record handed to sinks
//! - [`Priority`]: syslog-style severity (0 = emergency .. 7 = debug)
//! - [`BacktraceFrame`] / [`FrameArg`] / [`ExceptionInfo`]: call-stack data
//! - [`ContextProvider`] / [`RequestSnapshot`]: the current request context
//! - [`StackSnapshotProvider`]: the current call stack
//! - [`Sink`] / [`WriteError`]: the single write contract for destinations
//! - [`ExtraRegistry`]: process-wide ad hoc extra data for external sinks

pub mod context;
pub mod error;
pub mod event;
pub mod extra;
pub mod frame;
pub mod priority;
pub mod sink;
pub mod stack;

pub use context::{AdminSession, ContextProvider, RequestSnapshot, RequestStart, SessionIdentity};
pub use error::{CoreError, WriteError};
pub use event::Event;
pub use extra::ExtraRegistry;
pub use frame::{BacktraceFrame, ExceptionInfo, FrameArg};
pub use priority::Priority;
pub use sink::Sink;
pub use stack::{StackSnapshotProvider, StaticStack};
