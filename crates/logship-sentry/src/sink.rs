// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The Sentry sink.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use logship_config::{LoggerConfig, SentryConfig, DEFAULT_SENTRY_TIMEOUT_SECS};
use logship_core::{ContextProvider, Event, ExtraRegistry, Priority, Sink, WriteError};
use sentry::protocol::Event as SentryEvent;
use sentry::transports::ReqwestHttpTransport;
use sentry::types::Dsn;
use sentry::{Client, ClientOptions, Hub, Scope, Transport, TransportFactory, User};
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::convert::{to_sentry_event, FrameOptions, IN_APP_EXCLUDE};
use crate::error::{Result, SentryError};
use crate::severity::{level_for, resolve_priority};

pub const DEFAULT_SINK_CODE: &str = "sentry";
pub const UNKNOWN_STORE: &str = "unknown";

type ScopeHook = Box<dyn Fn(&mut Scope) + Send + Sync>;
type BeforeSend = Arc<dyn Fn(SentryEvent<'static>) -> Option<SentryEvent<'static>> + Send + Sync>;

/// Forwards events to Sentry.
///
/// The client is set up on the first write. Without a DSN, or when setup
/// fails, the sink stays unavailable for its lifetime and every write is a
/// silent no-op.
///
/// Register this sink with an unrestricted `PriorityFilter` in the pipeline:
/// it applies its own threshold after inferring priorities from messages.
pub struct SentrySink {
	code: String,
	dsn: Option<String>,
	environment: Option<String>,
	base_path: Option<String>,
	timeout: Duration,
	threshold: Option<Priority>,
	context: Option<Arc<dyn ContextProvider>>,
	extra: ExtraRegistry,
	transport: Option<Arc<dyn TransportFactory>>,
	before_send: Option<BeforeSend>,
	hooks: Vec<ScopeHook>,
	connection: OnceLock<Option<Connection>>,
}

struct Connection {
	client: Arc<Client>,
	/// Holds the default scope configured at initialization.
	hub: Arc<Hub>,
	session_user: Option<User>,
}

impl SentrySink {
	pub fn builder() -> SentrySinkBuilder {
		SentrySinkBuilder::new()
	}

	/// Whether the sink has been initialized and can deliver events.
	/// `None` until the first write.
	pub fn is_available(&self) -> Option<bool> {
		self.connection.get().map(Option::is_some)
	}

	pub fn threshold(&self) -> Option<Priority> {
		self.threshold
	}

	pub fn extra(&self) -> &ExtraRegistry {
		&self.extra
	}

	/// Waits up to `timeout` for queued events to be sent. Returns `true`
	/// when nothing is left in the queue.
	pub fn flush(&self, timeout: Duration) -> bool {
		match self.connection.get() {
			Some(Some(connection)) => connection.client.flush(Some(timeout)),
			_ => true,
		}
	}

	fn connection(&self) -> Option<&Connection> {
		self.connection
			.get_or_init(|| match self.connect() {
				Ok(connection) => connection,
				Err(e) => {
					warn!(sink = %self.code, error = %e, "Sentry sink disabled");
					None
				}
			})
			.as_ref()
	}

	fn connect(&self) -> Result<Option<Connection>> {
		let Some(raw) = self.dsn.as_deref() else {
			debug!(sink = %self.code, "Sentry sink has no DSN; disabled");
			return Ok(None);
		};
		let dsn: Dsn = raw.parse()?;

		let transport = match &self.transport {
			Some(factory) => Arc::clone(factory),
			None => self.http_transport()?,
		};

		let options = ClientOptions {
			dsn: Some(dsn),
			environment: self.environment.clone().map(Into::into),
			attach_stacktrace: true,
			send_default_pii: true,
			in_app_exclude: IN_APP_EXCLUDE.to_vec(),
			before_send: self.before_send.clone(),
			transport: Some(transport),
			..Default::default()
		};
		let client = Arc::new(Client::from(options));
		let hub = Arc::new(Hub::new(Some(Arc::clone(&client)), Arc::new(Scope::default())));

		let session_user = self.session_user();
		hub.configure_scope(|scope| {
			scope.set_user(session_user.clone());
			for hook in &self.hooks {
				hook(scope);
			}
		});

		info!(sink = %self.code, environment = ?self.environment, "Sentry sink initialized");
		Ok(Some(Connection {
			client,
			hub,
			session_user,
		}))
	}

	fn http_transport(&self) -> Result<Arc<dyn TransportFactory>> {
		let http = reqwest::Client::builder().timeout(self.timeout).build()?;
		let factory = move |options: &ClientOptions| -> Arc<dyn Transport> {
			Arc::new(ReqwestHttpTransport::with_client(options, http.clone()))
		};
		Ok(Arc::new(factory))
	}

	/// Session id, client address and session data of the current request.
	fn session_user(&self) -> Option<User> {
		let request = self.context.as_ref()?.snapshot();
		let session_id = request.session_id.filter(|id| !id.is_empty())?;
		let mut user = User {
			id: Some(session_id),
			ip_address: request.remote_addr.and_then(|addr| addr.parse().ok()),
			..Default::default()
		};
		if let Some(session) = request.session {
			user.other.insert("data".to_string(), Value::Object(session));
		}
		Some(user)
	}

	fn configure_event_scope(&self, scope: &mut Scope, event: &Event, connection: &Connection) {
		scope.set_tag("target", &self.code);
		if let Some(request_id) = &event.request_id {
			scope.set_tag("request_id", request_id);
		}
		scope.set_tag("store", event.store_code.as_deref().unwrap_or(UNKNOWN_STORE));

		if let Some(elapsed) = event.time_elapsed {
			scope.set_extra("time_elapsed", Value::from(elapsed));
		}
		for (key, value) in self.extra.snapshot() {
			scope.set_extra(&key, value);
		}

		if event.admin_user_id.is_some() || event.admin_user_name.is_some() {
			let mut user = connection.session_user.clone().unwrap_or_default();
			user.id = event.admin_user_id.clone();
			user.username = event.admin_user_name.clone();
			scope.set_user(Some(user));
		}
	}

	/// Captures `event`, returning `Ok(false)` when it was not sent because
	/// the sink is unavailable or the event is below the threshold.
	pub fn capture(&self, event: &mut Event) -> Result<bool> {
		let Some(connection) = self.connection() else {
			return Ok(false);
		};

		let priority = resolve_priority(event);
		if let Some(max) = self.threshold {
			if !priority.within(max) {
				trace!(sink = %self.code, priority = priority.name(), "Below Sentry threshold");
				return Ok(false);
			}
		}

		let frames = FrameOptions {
			base_path: self.base_path.as_deref(),
			in_app_exclude: &connection.client.options().in_app_exclude,
		};
		let payload = to_sentry_event(event, level_for(priority), &self.code, frames);

		let hub = Hub::new_from_top(Arc::clone(&connection.hub));
		let event_id = hub.with_scope(
			|scope| self.configure_event_scope(scope, event, connection),
			|| hub.capture_event(payload),
		);
		if event_id.is_nil() {
			return Err(SentryError::Discarded);
		}

		debug!(sink = %self.code, %event_id, priority = priority.name(), "Captured event");
		Ok(true)
	}
}

impl Sink for SentrySink {
	fn code(&self) -> &str {
		&self.code
	}

	fn write(&self, event: &mut Event) -> std::result::Result<(), WriteError> {
		self.capture(event).map(|_| ()).map_err(|e| WriteError::new(e.to_string()))
	}
}

impl fmt::Debug for SentrySink {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SentrySink")
			.field("code", &self.code)
			.field("enabled", &self.dsn.is_some())
			.field("environment", &self.environment)
			.field("threshold", &self.threshold)
			.field("available", &self.is_available())
			.finish()
	}
}

/// Builder for [`SentrySink`].
pub struct SentrySinkBuilder {
	code: String,
	config: SentryConfig,
	threshold: Option<Priority>,
	context: Option<Arc<dyn ContextProvider>>,
	extra: ExtraRegistry,
	transport: Option<Arc<dyn TransportFactory>>,
	before_send: Option<BeforeSend>,
	hooks: Vec<ScopeHook>,
}

impl Default for SentrySinkBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl SentrySinkBuilder {
	pub fn new() -> Self {
		Self {
			code: DEFAULT_SINK_CODE.to_string(),
			config: SentryConfig::default(),
			threshold: None,
			context: None,
			extra: ExtraRegistry::new(),
			transport: None,
			before_send: None,
			hooks: Vec::new(),
		}
	}

	/// Takes DSN, environment, base path, timeout and the threshold (which
	/// falls back to the general priority) from `config`.
	pub fn from_config(config: &LoggerConfig) -> Self {
		Self::new()
			.threshold(config.sentry.threshold(&config.general))
			.config(config.sentry.clone())
	}

	pub fn config(mut self, config: SentryConfig) -> Self {
		self.config = config;
		self
	}

	/// The target code this sink is registered under.
	pub fn code(mut self, code: impl Into<String>) -> Self {
		self.code = code.into();
		self
	}

	pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
		self.config.dsn = Some(dsn.into());
		self
	}

	pub fn environment(mut self, environment: impl Into<String>) -> Self {
		self.config.environment = Some(environment.into());
		self
	}

	pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
		self.config.base_path = Some(base_path.into());
		self
	}

	pub fn threshold(mut self, threshold: Option<Priority>) -> Self {
		self.threshold = threshold;
		self
	}

	pub fn context(mut self, context: Arc<dyn ContextProvider>) -> Self {
		self.context = Some(context);
		self
	}

	/// Shares an extra-data registry with the rest of the application.
	pub fn extra(mut self, extra: ExtraRegistry) -> Self {
		self.extra = extra;
		self
	}

	/// Replaces the HTTP transport, e.g. with `sentry::test::TestTransport`.
	pub fn transport(mut self, transport: Arc<dyn TransportFactory>) -> Self {
		self.transport = Some(transport);
		self
	}

	/// Last chance to modify or drop an event. A dropped event surfaces as
	/// a write error.
	pub fn before_send<F>(mut self, callback: F) -> Self
	where
		F: Fn(SentryEvent<'static>) -> Option<SentryEvent<'static>> + Send + Sync + 'static,
	{
		self.before_send = Some(Arc::new(callback));
		self
	}

	/// Runs `hook` against the default scope once, during initialization.
	pub fn on_init<F>(mut self, hook: F) -> Self
	where
		F: Fn(&mut Scope) + Send + Sync + 'static,
	{
		self.hooks.push(Box::new(hook));
		self
	}

	/// Adds a tag to every event, e.g. an installation identifier.
	pub fn tag(self, key: impl Into<String>, value: impl Into<String>) -> Self {
		let key = key.into();
		let value = value.into();
		self.on_init(move |scope| scope.set_tag(&key, &value))
	}

	pub fn build(self) -> SentrySink {
		let timeout_secs = match self.config.request_timeout_secs {
			0 => DEFAULT_SENTRY_TIMEOUT_SECS,
			secs => secs,
		};
		SentrySink {
			code: self.code,
			dsn: self.config.dsn,
			environment: self.config.environment,
			base_path: self.config.base_path,
			timeout: Duration::from_secs(timeout_secs),
			threshold: self.threshold,
			context: self.context,
			extra: self.extra,
			transport: self.transport,
			before_send: self.before_send,
			hooks: self.hooks,
			connection: OnceLock::new(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use logship_core::{ExceptionInfo, RequestSnapshot};
	use sentry::test::TestTransport;
	use sentry::Level;
	use serde_json::json;
	use std::sync::atomic::{AtomicUsize, Ordering};

	const DSN: &str = "https://public@sentry.invalid/1";

	fn sink_with(transport: &Arc<TestTransport>) -> SentrySinkBuilder {
		SentrySink::builder().dsn(DSN).transport(Arc::new(Arc::clone(transport)))
	}

	#[test]
	fn test_without_dsn_is_permanently_unavailable() {
		let transport = TestTransport::new();
		let sink = SentrySink::builder()
			.transport(Arc::new(Arc::clone(&transport)))
			.build();
		assert_eq!(sink.is_available(), None);

		let mut event = Event::new(Priority::Crit, "x");
		assert!(sink.write(&mut event).is_ok());
		assert_eq!(sink.is_available(), Some(false));
		assert!(sink.write(&mut event).is_ok());
		assert!(transport.fetch_and_clear_events().is_empty());
	}

	#[test]
	fn test_invalid_dsn_disables_sink() {
		let sink = SentrySink::builder().dsn("not a dsn").build();
		let mut event = Event::new(Priority::Crit, "x");
		assert!(sink.write(&mut event).is_ok());
		assert_eq!(sink.is_available(), Some(false));
	}

	#[test]
	fn test_initializes_once() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = Arc::clone(&calls);
		let transport = TestTransport::new();
		let sink = sink_with(&transport)
			.on_init(move |_| {
				counter.fetch_add(1, Ordering::SeqCst);
			})
			.build();

		for _ in 0..3 {
			sink.write(&mut Event::new(Priority::Err, "x")).unwrap();
		}
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert_eq!(sink.is_available(), Some(true));
		assert_eq!(transport.fetch_and_clear_events().len(), 3);
	}

	#[test]
	fn test_message_inference_and_level() {
		let transport = TestTransport::new();
		let sink = sink_with(&transport).build();

		let mut event = Event::blank("Warning: cache is cold");
		sink.write(&mut event).unwrap();
		assert_eq!(event.priority, Some(Priority::Warn));

		let mut event = Event::blank("unexpected state");
		sink.write(&mut event).unwrap();

		let events = transport.fetch_and_clear_events();
		assert_eq!(events[0].level, Level::Warning);
		assert_eq!(events[0].message.as_deref(), Some("Warning: cache is cold"));
		assert_eq!(events[1].level, Level::Error);
	}

	#[test]
	fn test_threshold_drops_less_severe_events() {
		let transport = TestTransport::new();
		let sink = sink_with(&transport).threshold(Some(Priority::Warn)).build();

		let mut notice = Event::new(Priority::Err, "Notice: undefined index");
		assert!(!sink.capture(&mut notice).unwrap());
		assert_eq!(notice.priority, Some(Priority::Notice));

		let mut crit = Event::new(Priority::Crit, "database gone");
		assert!(sink.capture(&mut crit).unwrap());

		let events = transport.fetch_and_clear_events();
		assert_eq!(events.len(), 1);
		assert_eq!(events[0].level, Level::Fatal);
	}

	#[test]
	fn test_event_scope() {
		let transport = TestTransport::new();
		let extra = ExtraRegistry::new();
		extra.set("order_id", json!(1001));
		let sink = sink_with(&transport)
			.code("errors")
			.environment("production")
			.extra(extra)
			.tag("instance_uid", "abc")
			.build();

		let mut event = Event::new(Priority::Err, "payment failed");
		event.request_id = Some("Req1".to_string());
		event.time_elapsed = Some(1.5);
		event.admin_user_id = Some("7".to_string());
		event.admin_user_name = Some("admin".to_string());
		sink.write(&mut event).unwrap();

		let events = transport.fetch_and_clear_events();
		let sent = &events[0];
		assert_eq!(sent.logger.as_deref(), Some("errors"));
		assert_eq!(sent.environment.as_deref(), Some("production"));
		assert_eq!(sent.tags["target"], "errors");
		assert_eq!(sent.tags["request_id"], "Req1");
		assert_eq!(sent.tags["store"], UNKNOWN_STORE);
		assert_eq!(sent.tags["instance_uid"], "abc");
		assert_eq!(sent.extra["time_elapsed"], json!(1.5));
		assert_eq!(sent.extra["order_id"], json!(1001));
		let user = sent.user.as_ref().unwrap();
		assert_eq!(user.id.as_deref(), Some("7"));
		assert_eq!(user.username.as_deref(), Some("admin"));
	}

	#[test]
	fn test_event_scope_does_not_leak_between_captures() {
		let transport = TestTransport::new();
		let sink = sink_with(&transport).build();

		let mut first = Event::new(Priority::Err, "first");
		first.request_id = Some("Req1".to_string());
		first.admin_user_id = Some("7".to_string());
		sink.write(&mut first).unwrap();
		sink.write(&mut Event::new(Priority::Err, "second")).unwrap();

		let events = transport.fetch_and_clear_events();
		assert!(!events[1].tags.contains_key("request_id"));
		assert!(events[1].user.is_none());
	}

	#[test]
	fn test_session_user_in_default_scope() {
		let transport = TestTransport::new();
		let mut request = RequestSnapshot::new("default");
		request.session_id = Some("sess-9".to_string());
		request.remote_addr = Some("10.1.1.1".to_string());
		let mut session = serde_json::Map::new();
		session.insert("cart".to_string(), json!(3));
		request.session = Some(session);

		let sink = sink_with(&transport).context(Arc::new(request)).build();
		let mut event = Event::new(Priority::Err, "x");
		event.store_code = Some("default".to_string());
		sink.write(&mut event).unwrap();

		let events = transport.fetch_and_clear_events();
		let user = events[0].user.as_ref().unwrap();
		assert_eq!(user.id.as_deref(), Some("sess-9"));
		assert_eq!(user.ip_address, Some("10.1.1.1".parse().unwrap()));
		assert_eq!(user.other["data"]["cart"], json!(3));
		assert_eq!(events[0].tags["store"], "default");
	}

	#[test]
	fn test_exception_capture() {
		let transport = TestTransport::new();
		let sink = sink_with(&transport).build();
		let mut event = Event::from_exception(
			ExceptionInfo::new("shop::PaymentError", "card declined").at("src/pay.rs", 77),
		);
		sink.write(&mut event).unwrap();

		let events = transport.fetch_and_clear_events();
		let exception = &events[0].exception.values[0];
		assert_eq!(exception.ty, "shop::PaymentError");
		assert_eq!(exception.value.as_deref(), Some("card declined"));
		assert!(events[0].message.is_none());
	}

	#[test]
	fn test_discarded_event_becomes_write_error() {
		let transport = TestTransport::new();
		let sink = sink_with(&transport).before_send(|_| None).build();
		let err = sink.write(&mut Event::new(Priority::Err, "x")).unwrap_err();
		assert_eq!(err.message(), "event was discarded before sending");
		assert_eq!(err.to_string(), "log write failed: event was discarded before sending");
		assert!(transport.fetch_and_clear_events().is_empty());
	}

	#[test]
	fn test_from_config() {
		let mut config = LoggerConfig::default();
		config.general.priority = Some(Priority::Warn);
		config.sentry.dsn = Some(DSN.to_string());
		config.sentry.environment = Some("qa".to_string());
		let sink = SentrySinkBuilder::from_config(&config).build();
		assert_eq!(sink.threshold(), Some(Priority::Warn));
		assert_eq!(sink.code(), DEFAULT_SINK_CODE);
		assert_eq!(sink.environment.as_deref(), Some("qa"));
	}

	#[test]
	fn test_http_transport_builds_with_timeout() {
		let sink = SentrySink::builder().dsn(DSN).build();
		assert!(sink.http_transport().is_ok());
	}
}
