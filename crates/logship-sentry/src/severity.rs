// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Priority to Sentry level mapping and message-based priority inference.

use logship_core::{Event, Priority};
use sentry::Level;

/// Sentry level for a priority.
pub fn level_for(priority: Priority) -> Level {
	match priority {
		Priority::Emerg | Priority::Alert | Priority::Crit => Level::Fatal,
		Priority::Err => Level::Error,
		Priority::Warn => Level::Warning,
		Priority::Notice | Priority::Info => Level::Info,
		Priority::Debug => Level::Debug,
	}
}

const WARNING_PREFIXES: &[&str] = &["warn", "user warn"];
const NOTICE_PREFIXES: &[&str] = &["notice", "user notice", "strict notice", "deprecated"];

/// Infers a priority from well-known message prefixes, case-insensitively.
pub fn infer_priority(message: &str) -> Option<Priority> {
	if WARNING_PREFIXES.iter().any(|p| starts_with_ignore_case(message, p)) {
		Some(Priority::Warn)
	} else if NOTICE_PREFIXES.iter().any(|p| starts_with_ignore_case(message, p)) {
		Some(Priority::Notice)
	} else {
		None
	}
}

/// Applies inference to events that carry no priority or the generic ERR.
///
/// An inferred priority is written back to the event. Returns the priority
/// the event is treated as, ERR when nothing better is known.
pub fn resolve_priority(event: &mut Event) -> Priority {
	if matches!(event.priority, None | Some(Priority::Err)) {
		if let Some(inferred) = infer_priority(&event.message) {
			event.set_priority(inferred);
		}
	}
	event.priority.unwrap_or(Priority::Err)
}

fn starts_with_ignore_case(message: &str, prefix: &str) -> bool {
	message
		.get(..prefix.len())
		.is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_level_table() {
		let expected = [
			(Priority::Emerg, Level::Fatal),
			(Priority::Alert, Level::Fatal),
			(Priority::Crit, Level::Fatal),
			(Priority::Err, Level::Error),
			(Priority::Warn, Level::Warning),
			(Priority::Notice, Level::Info),
			(Priority::Info, Level::Info),
			(Priority::Debug, Level::Debug),
		];
		for (priority, level) in expected {
			assert_eq!(level_for(priority), level, "{priority:?}");
		}
	}

	#[test]
	fn test_infer_prefixes() {
		assert_eq!(infer_priority("Warning: x"), Some(Priority::Warn));
		assert_eq!(infer_priority("USER WARNING: x"), Some(Priority::Warn));
		assert_eq!(infer_priority("Notice: undefined index"), Some(Priority::Notice));
		assert_eq!(infer_priority("Strict Notice: x"), Some(Priority::Notice));
		assert_eq!(infer_priority("Deprecated functionality"), Some(Priority::Notice));
		assert_eq!(infer_priority("disk full"), None);
		assert_eq!(infer_priority("wa"), None);
	}

	#[test]
	fn test_resolve_infers_for_missing_and_err() {
		let mut blank = Event::blank("Warning: low disk");
		assert_eq!(resolve_priority(&mut blank), Priority::Warn);
		assert_eq!(blank.priority_name.as_deref(), Some("WARN"));

		let mut err = Event::new(Priority::Err, "Notice: x");
		assert_eq!(resolve_priority(&mut err), Priority::Notice);

		let mut plain = Event::blank("boom");
		assert_eq!(resolve_priority(&mut plain), Priority::Err);
		assert!(plain.priority.is_none());
	}

	#[test]
	fn test_resolve_keeps_explicit_priority() {
		let mut event = Event::new(Priority::Crit, "Warning: ignored");
		assert_eq!(resolve_priority(&mut event), Priority::Crit);
	}

	proptest! {
		#[test]
		fn explicit_non_err_priority_is_never_changed(code in 0u8..=7, message in ".*") {
			let priority = Priority::from_u8(code).unwrap();
			prop_assume!(priority != Priority::Err);
			let mut event = Event::new(priority, message);
			prop_assert_eq!(resolve_priority(&mut event), priority);
		}
	}
}
