// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! One-shot population of an [`Event`] with call-site and request context.

use std::sync::{Arc, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD, Engine};
use logship_config::{GeneralConfig, RedactionScope};
use logship_core::{
	ContextProvider, Event, RequestSnapshot, RequestStart, StackSnapshotProvider,
};
use logship_redact::KeyPathRedactor;
use rand::Rng;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::locator::{FrameLocator, Located, LocatorConfig};

pub const REMOTE_ADDRESS_UNAVAILABLE: &str = "unavailable";
pub const HOSTNAME_UNAVAILABLE: &str = "could not determine hostname";
pub const CLI_METHOD: &str = "cli";

/// Enrichment knobs taken from the general configuration section.
#[derive(Debug, Clone)]
pub struct EnrichmentSettings {
	pub max_data_length: usize,
	pub pretty_print: bool,
	pub add_session_data: bool,
	pub redact_sources: RedactionScope,
}

impl Default for EnrichmentSettings {
	fn default() -> Self {
		Self::from_config(&GeneralConfig::default())
	}
}

impl EnrichmentSettings {
	pub fn from_config(config: &GeneralConfig) -> Self {
		Self {
			max_data_length: config.max_data_length,
			pretty_print: config.pretty_print,
			add_session_data: config.add_session_data,
			redact_sources: config.redact_sources,
		}
	}
}

/// Populates events exactly once.
///
/// The store code doubles as the "already enriched" marker: a second call
/// on the same event only updates its backtrace flag.
pub struct Enricher {
	locator: FrameLocator,
	redactor: KeyPathRedactor,
	settings: EnrichmentSettings,
	context: Arc<dyn ContextProvider>,
	stack: Arc<dyn StackSnapshotProvider>,
	request_id: OnceLock<String>,
}

impl Enricher {
	pub fn new(
		context: Arc<dyn ContextProvider>,
		stack: Arc<dyn StackSnapshotProvider>,
	) -> Self {
		Self {
			locator: FrameLocator::default(),
			redactor: KeyPathRedactor::default(),
			settings: EnrichmentSettings::default(),
			context,
			stack,
			request_id: OnceLock::new(),
		}
	}

	/// Builds an enricher with locator truncation, redaction paths and
	/// payload settings taken from `config`.
	pub fn from_config(
		config: &GeneralConfig,
		locator: LocatorConfig,
		context: Arc<dyn ContextProvider>,
		stack: Arc<dyn StackSnapshotProvider>,
	) -> Self {
		Self {
			locator: FrameLocator::new(LocatorConfig {
				max_frames: config.max_backtrace_lines,
				..locator
			}),
			redactor: KeyPathRedactor::new(&config.filter_request_data),
			settings: EnrichmentSettings::from_config(config),
			context,
			stack,
			request_id: OnceLock::new(),
		}
	}

	pub fn with_settings(mut self, settings: EnrichmentSettings) -> Self {
		self.settings = settings;
		self
	}

	pub fn with_redactor(mut self, redactor: KeyPathRedactor) -> Self {
		self.redactor = redactor;
		self
	}

	pub fn with_locator(mut self, locator: FrameLocator) -> Self {
		self.locator = locator;
		self
	}

	/// Identifier shared by every event from this enricher.
	pub fn request_id(&self) -> &str {
		self.request_id.get_or_init(generate_request_id)
	}

	pub fn enrich(&self, event: &mut Event, backtrace_enabled: bool) {
		event.backtrace_enabled = backtrace_enabled;
		if event.is_enriched() {
			return;
		}

		let snapshot = self.context.snapshot();
		event.request_id = Some(self.request_id().to_string());
		event.store_code = Some(snapshot.store_code.clone());

		apply_identity(event, &snapshot);
		event.time_elapsed = snapshot.started_at.and_then(elapsed_since);
		self.apply_location(event);
		apply_request_line(event, &snapshot);

		event.http_user_agent = snapshot.header("user-agent").map(str::to_string);
		event.http_host = snapshot.header("host").map(str::to_string);
		event.http_cookie = snapshot.header("cookie").map(str::to_string);

		event.request_data = self.request_data(&snapshot);
		if self.settings.add_session_data {
			event.session_data = self.session_data(&snapshot);
		}

		event.remote_address = Some(remote_address(&snapshot));
		event.hostname = Some(resolve_hostname());

		debug!(
			store = %snapshot.store_code,
			file = ?event.file,
			line = ?event.line,
			frames = event.backtrace_frames().len(),
			"enriched log event"
		);
	}

	fn apply_location(&self, event: &mut Event) {
		if event.backtrace.is_some() {
			return;
		}

		let located = match &event.exception {
			Some(exception) => self.locator.locate_exception(exception),
			None => self.locator.locate(&self.stack.capture()),
		};

		let Located {
			file,
			line,
			backtrace,
			exception,
		} = located;
		event.file = file;
		event.line = line;
		event.backtrace = Some(backtrace);
		if event.exception.is_none() {
			event.exception = exception;
		}
	}

	fn request_data(&self, snapshot: &RequestSnapshot) -> Option<String> {
		let scope = self.settings.redact_sources;
		let mut sections = Vec::new();

		let mut push_map = |label: &str, map: &Map<String, Value>, redact: bool| {
			if map.is_empty() {
				return;
			}
			let mut map = map.clone();
			if redact {
				self.redactor.redact_map(&mut map);
			}
			if let Some(encoded) = self.encode(&Value::Object(map)) {
				sections.push(format!("  {label}|{}", self.truncate(&encoded)));
			}
		};

		push_map("GET", &snapshot.query, scope.query);
		push_map("POST", &snapshot.post, scope.post);
		push_map("FILES", &snapshot.files, scope.files);

		if let Some(body) = snapshot.raw_body.as_deref().filter(|b| !b.is_empty()) {
			let body = if scope.raw_body {
				self.redactor.redact_raw_body(body)
			} else {
				body.to_string()
			};
			sections.push(format!("  RAWPOST|{}", self.truncate(&body)));
		}

		if sections.is_empty() {
			None
		} else {
			Some(sections.join("\n"))
		}
	}

	fn session_data(&self, snapshot: &RequestSnapshot) -> Option<String> {
		let session = snapshot.session.as_ref().filter(|s| !s.is_empty())?;
		let encoded = self.encode(&Value::Object(session.clone()))?;
		Some(self.truncate(&encoded))
	}

	fn encode(&self, value: &Value) -> Option<String> {
		let encoded = if self.settings.pretty_print {
			serde_json::to_string_pretty(value)
		} else {
			serde_json::to_string(value)
		};
		match encoded {
			Ok(encoded) => Some(encoded),
			Err(e) => {
				trace!(error = %e, "dropping unserializable payload section");
				None
			}
		}
	}

	fn truncate(&self, value: &str) -> String {
		value.chars().take(self.settings.max_data_length).collect()
	}
}

impl std::fmt::Debug for Enricher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Enricher")
			.field("locator", &self.locator)
			.field("redactor", &self.redactor)
			.field("settings", &self.settings)
			.field("request_id", &self.request_id.get())
			.finish()
	}
}

/// Six random bytes, base64 encoded with non-word characters removed.
pub fn generate_request_id() -> String {
	let mut bytes = [0u8; 6];
	rand::thread_rng().fill(&mut bytes);
	STANDARD
		.encode(bytes)
		.chars()
		.filter(|c| c.is_ascii_alphanumeric() || *c == '_')
		.collect()
}

/// Admin identity wins whenever an admin session exists, even a logged-out
/// one; the API session is only consulted outside the admin area.
fn apply_identity(event: &mut Event, snapshot: &RequestSnapshot) {
	let identity = match &snapshot.admin {
		Some(admin) => admin.user.as_ref(),
		None => snapshot.api_user.as_ref(),
	};
	if let Some(user) = identity {
		event.admin_user_id = Some(user.user_id.clone());
		event.admin_user_name = Some(user.user_name.clone());
	}
}

fn elapsed_since(start: RequestStart) -> Option<f64> {
	let now = SystemTime::now();
	match start {
		RequestStart::Precise(started) => now.duration_since(started).ok().map(|d| d.as_secs_f64()),
		RequestStart::Seconds(started) => {
			let now = now.duration_since(UNIX_EPOCH).ok()?.as_secs();
			Some(now.saturating_sub(started) as f64)
		}
	}
}

fn apply_request_line(event: &mut Event, snapshot: &RequestSnapshot) {
	if snapshot.is_http() {
		event.request_method = snapshot.method.clone();
	} else {
		event.request_method = Some(CLI_METHOD.to_string());
	}

	event.request_uri = snapshot
		.uri
		.clone()
		.filter(|uri| !uri.is_empty())
		.or_else(|| {
			std::env::args_os()
				.next()
				.map(|arg| arg.to_string_lossy().into_owned())
		});
}

fn remote_address(snapshot: &RequestSnapshot) -> String {
	snapshot
		.header("x-forwarded-for")
		.map(str::to_string)
		.or_else(|| snapshot.remote_addr.clone().filter(|a| !a.is_empty()))
		.unwrap_or_else(|| REMOTE_ADDRESS_UNAVAILABLE.to_string())
}

fn resolve_hostname() -> String {
	hostname::get()
		.map(|h| h.to_string_lossy().to_string())
		.unwrap_or_else(|_| HOSTNAME_UNAVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
	use super::*;
	use logship_core::{
		AdminSession, BacktraceFrame, ExceptionInfo, Priority, SessionIdentity, StaticStack,
	};
	use serde_json::json;
	use std::time::Duration;

	fn stack() -> Arc<StaticStack> {
		Arc::new(StaticStack(vec![
			BacktraceFrame::new("dispatch")
				.in_class("logship_pipeline::logger::Logger")
				.at("src/logger.rs", 10),
			BacktraceFrame::new("log")
				.in_class("logship_pipeline::logger::Logger")
				.at("src/logger.rs", 5),
			BacktraceFrame::new("checkout").at("src/shop.rs", 42),
			BacktraceFrame::new("main").at("src/main.rs", 3),
		]))
	}

	fn http_snapshot() -> RequestSnapshot {
		let mut snapshot = RequestSnapshot::new("en_us");
		snapshot.method = Some("POST".to_string());
		snapshot.uri = Some("/checkout".to_string());
		snapshot
			.headers
			.insert("User-Agent".to_string(), "curl/8".to_string());
		snapshot.headers.insert("Host".to_string(), "shop.test".to_string());
		snapshot.remote_addr = Some("192.0.2.1".to_string());
		snapshot
	}

	fn enricher(snapshot: RequestSnapshot) -> Enricher {
		Enricher::new(Arc::new(snapshot), stack())
	}

	#[test]
	fn test_request_id_is_word_characters_and_memoized() {
		let enricher = enricher(RequestSnapshot::new("default"));
		let id = enricher.request_id().to_string();
		assert!(!id.is_empty());
		assert!(id.len() <= 8);
		assert!(id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
		assert_eq!(enricher.request_id(), id);
	}

	#[test]
	fn test_populates_location_and_request_fields() {
		let enricher = enricher(http_snapshot());
		let mut event = Event::new(Priority::Err, "payment declined");
		enricher.enrich(&mut event, true);

		assert_eq!(event.store_code.as_deref(), Some("en_us"));
		assert!(event.backtrace_enabled);
		assert_eq!(event.file.as_deref(), Some("src/shop.rs"));
		assert_eq!(event.line, Some(42));
		assert_eq!(event.backtrace_frames().len(), 1);
		assert_eq!(event.request_method.as_deref(), Some("POST"));
		assert_eq!(event.request_uri.as_deref(), Some("/checkout"));
		assert_eq!(event.http_user_agent.as_deref(), Some("curl/8"));
		assert_eq!(event.http_host.as_deref(), Some("shop.test"));
		assert_eq!(event.http_cookie, None);
		assert_eq!(event.remote_address.as_deref(), Some("192.0.2.1"));
		assert!(event.hostname.is_some());
		assert!(event.request_id.is_some());
	}

	#[test]
	fn test_second_enrichment_only_updates_backtrace_flag() {
		let enricher = enricher(http_snapshot());
		let mut event = Event::new(Priority::Err, "x");
		enricher.enrich(&mut event, true);
		let first = event.clone();

		event.file = Some("changed.rs".to_string());
		enricher.enrich(&mut event, false);

		assert!(!event.backtrace_enabled);
		assert_eq!(event.file.as_deref(), Some("changed.rs"));
		assert_eq!(event.line, first.line);
		assert_eq!(event.backtrace, first.backtrace);
		assert_eq!(event.request_id, first.request_id);
	}

	#[test]
	fn test_exception_event_keeps_single_frame() {
		let enricher = enricher(http_snapshot());
		let exception = ExceptionInfo::new("Io", "disk full").at("src/disk.rs", 13);
		let mut event = Event::from_exception(exception.clone());
		enricher.enrich(&mut event, true);

		assert_eq!(event.file.as_deref(), Some("src/disk.rs"));
		assert_eq!(event.line, Some(13));
		assert_eq!(event.backtrace_frames(), &[exception.frame()]);
		assert_eq!(event.exception, Some(exception));
	}

	#[test]
	fn test_forwarded_for_wins_over_peer() {
		let mut snapshot = http_snapshot();
		snapshot
			.headers
			.insert("X-Forwarded-For".to_string(), "203.0.113.9".to_string());
		let mut event = Event::new(Priority::Err, "x");
		enricher(snapshot).enrich(&mut event, false);
		assert_eq!(event.remote_address.as_deref(), Some("203.0.113.9"));
	}

	#[test]
	fn test_missing_remote_address_is_placeholder() {
		let mut event = Event::new(Priority::Err, "x");
		enricher(RequestSnapshot::new("default")).enrich(&mut event, false);
		assert_eq!(event.remote_address.as_deref(), Some(REMOTE_ADDRESS_UNAVAILABLE));
		assert_eq!(event.request_method.as_deref(), Some(CLI_METHOD));
		assert!(event.request_data.is_none());
	}

	#[test]
	fn test_admin_identity_takes_precedence() {
		let mut snapshot = http_snapshot();
		snapshot.admin = Some(AdminSession {
			user: Some(SessionIdentity {
				user_id: "1".to_string(),
				user_name: "admin".to_string(),
			}),
		});
		snapshot.api_user = Some(SessionIdentity {
			user_id: "9".to_string(),
			user_name: "api".to_string(),
		});
		let mut event = Event::new(Priority::Err, "x");
		enricher(snapshot).enrich(&mut event, false);
		assert_eq!(event.admin_user_id.as_deref(), Some("1"));
		assert_eq!(event.admin_user_name.as_deref(), Some("admin"));
	}

	#[test]
	fn test_logged_out_admin_session_hides_api_user() {
		let mut snapshot = http_snapshot();
		snapshot.admin = Some(AdminSession::default());
		snapshot.api_user = Some(SessionIdentity {
			user_id: "9".to_string(),
			user_name: "api".to_string(),
		});
		let mut event = Event::new(Priority::Err, "x");
		enricher(snapshot).enrich(&mut event, false);
		assert_eq!(event.admin_user_id, None);
	}

	#[test]
	fn test_api_identity_outside_admin() {
		let mut snapshot = http_snapshot();
		snapshot.api_user = Some(SessionIdentity {
			user_id: "9".to_string(),
			user_name: "api".to_string(),
		});
		let mut event = Event::new(Priority::Err, "x");
		enricher(snapshot).enrich(&mut event, false);
		assert_eq!(event.admin_user_name.as_deref(), Some("api"));
	}

	#[test]
	fn test_request_data_sections_are_labelled_and_redacted() {
		let mut snapshot = http_snapshot();
		snapshot.query.insert("page".to_string(), json!("2"));
		snapshot
			.post
			.insert("login".to_string(), json!({"username": "bob", "password": "pw"}));
		snapshot
			.files
			.insert("avatar".to_string(), json!({"name": "me.png", "size": 10}));
		snapshot.raw_body = Some("a=b".to_string());

		let config = GeneralConfig {
			filter_request_data: vec!["login.password".to_string()],
			..Default::default()
		};
		let enricher = Enricher::from_config(
			&config,
			LocatorConfig::default(),
			Arc::new(snapshot),
			stack(),
		);
		let mut event = Event::new(Priority::Err, "x");
		enricher.enrich(&mut event, false);

		let data = event.request_data.unwrap();
		let lines: Vec<&str> = data.split('\n').collect();
		assert_eq!(lines.len(), 4);
		assert_eq!(lines[0], r#"  GET|{"page":"2"}"#);
		assert_eq!(lines[1], r#"  POST|{"login":{"password":"*****","username":"bob"}}"#);
		assert!(lines[2].starts_with("  FILES|"));
		assert_eq!(lines[3], "  RAWPOST|a=b");
	}

	#[test]
	fn test_sections_are_truncated_by_characters() {
		let mut snapshot = http_snapshot();
		snapshot.query.insert("q".to_string(), json!("ééééééééé"));
		let enricher = enricher(snapshot).with_settings(EnrichmentSettings {
			max_data_length: 5,
			..Default::default()
		});
		let mut event = Event::new(Priority::Err, "x");
		enricher.enrich(&mut event, false);
		assert_eq!(event.request_data.as_deref(), Some(r#"  GET|{"q":"#));
	}

	#[test]
	fn test_pretty_printed_sections() {
		let mut snapshot = http_snapshot();
		snapshot.query.insert("page".to_string(), json!("2"));
		let pretty = enricher(snapshot.clone()).with_settings(EnrichmentSettings {
			pretty_print: true,
			..Default::default()
		});
		let mut event = Event::new(Priority::Err, "x");
		pretty.enrich(&mut event, false);
		assert_eq!(event.request_data.as_deref(), Some("  GET|{\n  \"page\": \"2\"\n}"));

		let capped = enricher(snapshot).with_settings(EnrichmentSettings {
			pretty_print: true,
			max_data_length: 10,
			..Default::default()
		});
		let mut event = Event::new(Priority::Err, "x");
		capped.enrich(&mut event, false);
		assert_eq!(event.request_data.as_deref(), Some("  GET|{\n  \"page\""));
	}

	#[test]
	fn test_session_data_is_feature_flagged() {
		let mut snapshot = http_snapshot();
		let mut session = Map::new();
		session.insert("cart".to_string(), json!(3));
		snapshot.session = Some(session);

		let mut event = Event::new(Priority::Err, "x");
		enricher(snapshot.clone()).enrich(&mut event, false);
		assert!(event.session_data.is_none());

		let enricher = enricher(snapshot).with_settings(EnrichmentSettings {
			add_session_data: true,
			..Default::default()
		});
		let mut event = Event::new(Priority::Err, "x");
		enricher.enrich(&mut event, false);
		assert_eq!(event.session_data.as_deref(), Some(r#"{"cart":3}"#));
	}

	#[test]
	fn test_elapsed_time() {
		let earlier = SystemTime::now() - Duration::from_secs(2);
		let elapsed = elapsed_since(RequestStart::Precise(earlier)).unwrap();
		assert!(elapsed >= 2.0);

		let secs = earlier.duration_since(UNIX_EPOCH).unwrap().as_secs();
		let elapsed = elapsed_since(RequestStart::Seconds(secs)).unwrap();
		assert!(elapsed >= 2.0);
		assert_eq!(elapsed.fract(), 0.0);
	}
}
