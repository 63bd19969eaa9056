// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The logging entry point: routes, filters, enriches and dispatches.

use std::sync::Arc;

use logship_config::{GeneralConfig, LoggerConfig};
use logship_core::{
	ContextProvider, Event, ExceptionInfo, Priority, RequestSnapshot, Sink,
	StackSnapshotProvider, WriteError,
};
use tracing::{debug, trace, warn};

use crate::enrich::Enricher;
use crate::filter::PriorityFilter;
use crate::locator::LocatorConfig;
use crate::router::TargetRouter;
use crate::stack::BacktraceStack;

struct RegisteredSink {
	sink: Arc<dyn Sink>,
	filter: PriorityFilter,
}

/// Dispatches log events to registered sinks.
///
/// Each call routes the channel name through the target map; when no rule
/// matches, every default target receives the event with backtraces off.
/// The event is enriched once, right before the first sink that accepts
/// it, and then written to each selected sink in order. A failing sink
/// does not stop the remaining ones; the first failure is returned.
pub struct Logger {
	router: TargetRouter,
	enricher: Enricher,
	sinks: Vec<RegisteredSink>,
	default_targets: Vec<String>,
}

impl Logger {
	pub fn builder(config: GeneralConfig) -> LoggerBuilder {
		LoggerBuilder::new(config)
	}

	/// Logs `message` on `channel` at `priority`.
	#[inline(never)]
	pub fn log(
		&self,
		channel: &str,
		priority: Priority,
		message: impl Into<String>,
	) -> Result<(), WriteError> {
		let mut event = Event::new(priority, message);
		self.dispatch(channel, &mut event)
	}

	/// Logs `error` on `channel` at ERR, reporting the caller's location.
	#[inline(never)]
	#[track_caller]
	pub fn log_exception<E>(&self, channel: &str, error: &E) -> Result<(), WriteError>
	where
		E: std::error::Error + ?Sized,
	{
		let mut event = Event::from_exception(ExceptionInfo::from_error(error));
		self.dispatch(channel, &mut event)
	}

	/// Sends a caller-built event through routing, filtering and enrichment.
	#[inline(never)]
	pub fn dispatch(&self, channel: &str, event: &mut Event) -> Result<(), WriteError> {
		let routed = self.router.route(channel);
		let selected: Vec<(&str, bool)> = if routed.is_empty() {
			trace!(channel, "no target rule matched, using default targets");
			self.default_targets
				.iter()
				.map(|code| (code.as_str(), false))
				.collect()
		} else {
			routed.iter().collect()
		};

		let mut first_error = None;
		for (code, backtrace) in selected {
			let Some(registered) = self.sinks.iter().find(|s| s.sink.code() == code) else {
				debug!(channel, sink = code, "no sink registered for target");
				continue;
			};

			if !registered.filter.allows(event) {
				trace!(sink = code, priority = ?event.priority, "event below sink threshold");
				continue;
			}

			self.enricher.enrich(event, backtrace);

			if let Err(e) = registered.sink.write(event) {
				warn!(channel, sink = code, error = %e, "sink write failed");
				first_error.get_or_insert(e);
			}
		}

		match first_error {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}

	pub fn enricher(&self) -> &Enricher {
		&self.enricher
	}

	pub fn router(&self) -> &TargetRouter {
		&self.router
	}

	pub fn sink_codes(&self) -> impl Iterator<Item = &str> {
		self.sinks.iter().map(|s| s.sink.code())
	}
}

impl std::fmt::Debug for Logger {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Logger")
			.field("router", &self.router)
			.field("sinks", &self.sink_codes().collect::<Vec<_>>())
			.field("default_targets", &self.default_targets)
			.finish()
	}
}

pub struct LoggerBuilder {
	config: GeneralConfig,
	locator: LocatorConfig,
	context: Arc<dyn ContextProvider>,
	stack: Arc<dyn StackSnapshotProvider>,
	sinks: Vec<RegisteredSink>,
}

impl LoggerBuilder {
	pub fn new(config: GeneralConfig) -> Self {
		Self {
			config,
			locator: LocatorConfig::default(),
			context: Arc::new(RequestSnapshot::new("default")),
			stack: Arc::new(BacktraceStack),
			sinks: Vec::new(),
		}
	}

	pub fn from_config(config: &LoggerConfig) -> Self {
		Self::new(config.general.clone())
	}

	pub fn context(mut self, context: Arc<dyn ContextProvider>) -> Self {
		self.context = context;
		self
	}

	pub fn stack(mut self, stack: Arc<dyn StackSnapshotProvider>) -> Self {
		self.stack = stack;
		self
	}

	pub fn locator(mut self, locator: LocatorConfig) -> Self {
		self.locator = locator;
		self
	}

	/// Registers a sink filtered at its configured priority.
	pub fn sink(self, sink: Arc<dyn Sink>) -> Self {
		let filter = PriorityFilter::new(self.config.priority_for(sink.code()));
		self.sink_with_filter(sink, filter)
	}

	/// Registers a sink with an explicit filter. Sinks that apply their own
	/// threshold typically use `PriorityFilter::default()`.
	pub fn sink_with_filter(mut self, sink: Arc<dyn Sink>, filter: PriorityFilter) -> Self {
		self.sinks.push(RegisteredSink { sink, filter });
		self
	}

	pub fn build(self) -> Logger {
		let default_targets = if self.config.targets.is_empty() {
			self.sinks.iter().map(|s| s.sink.code().to_string()).collect()
		} else {
			self.config.targets.clone()
		};

		let enricher = Enricher::from_config(&self.config, self.locator, self.context, self.stack);

		debug!(
			sinks = self.sinks.len(),
			default_targets = default_targets.len(),
			"logger built"
		);

		Logger {
			router: TargetRouter::new(self.config.target_map),
			enricher,
			sinks: self.sinks,
			default_targets,
		}
	}
}
