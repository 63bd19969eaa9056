// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Native call-stack capture.

use logship_core::{BacktraceFrame, StackSnapshotProvider};
use rustc_demangle::demangle;

/// Captures the current thread's stack with the `backtrace` crate.
///
/// Frames are demangled and split into an owning path (`class`) and a
/// function name so the locator can recognise logger frames. Frames of the
/// capture machinery itself are dropped. Native frames carry no arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceStack;

impl StackSnapshotProvider for BacktraceStack {
	#[inline(never)]
	fn capture(&self) -> Vec<BacktraceFrame> {
		let backtrace = backtrace::Backtrace::new();
		let mut frames = Vec::new();

		for frame in backtrace.frames() {
			for symbol in frame.symbols() {
				let name = symbol
					.name()
					.and_then(|name| name.as_str())
					.map(|raw| format!("{:#}", demangle(raw)));
				let (class, function) = match name.as_deref() {
					Some(name) => split_symbol(name),
					None => (None, None),
				};
				frames.push(BacktraceFrame {
					file: symbol.filename().map(|path| path.display().to_string()),
					line: symbol.lineno(),
					function,
					class,
					args: Vec::new(),
				});
			}
		}

		frames
			.into_iter()
			.skip_while(|frame| frame.qualified_function().as_deref().map_or(true, is_capture_frame))
			.collect()
	}
}

fn is_capture_frame(name: &str) -> bool {
	name.starts_with("backtrace::")
		|| name.starts_with("<backtrace::")
		|| name.contains("logship_pipeline::stack::")
}

/// Splits `a::b::Type::method` into `(Some("a::b::Type"), Some("method"))`,
/// ignoring a trailing generic argument list.
pub fn split_symbol(symbol: &str) -> (Option<String>, Option<String>) {
	let symbol = strip_generic_suffix(symbol);
	match rsplit_path(symbol) {
		Some((class, function)) => (Some(class.to_string()), Some(function.to_string())),
		None => (None, Some(symbol.to_string())),
	}
}

fn strip_generic_suffix(symbol: &str) -> &str {
	if !symbol.ends_with('>') {
		return symbol;
	}
	match symbol.rfind("::<") {
		Some(idx) if idx > 0 => &symbol[..idx],
		_ => symbol,
	}
}

/// Last `::` outside angle brackets, so `<T as Trait>::f` splits correctly.
fn rsplit_path(symbol: &str) -> Option<(&str, &str)> {
	let bytes = symbol.as_bytes();
	let mut depth = 0i32;
	let mut idx = bytes.len();
	while idx > 1 {
		idx -= 1;
		match bytes[idx] {
			b'>' => depth += 1,
			b'<' => depth -= 1,
			b':' if depth == 0 && bytes[idx - 1] == b':' => {
				return Some((&symbol[..idx - 1], &symbol[idx + 1..]));
			}
			_ => {}
		}
	}
	None
}
