// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pattern-based routing of log identifiers to sink targets.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use logship_config::TargetRuleConfig;
use parking_lot::RwLock;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::RoutingError;

/// A compiled routing rule. Rules whose pattern failed to compile keep
/// their position but never match.
#[derive(Debug, Clone)]
pub struct TargetRule {
	pub pattern: String,
	pub target: String,
	pub backtrace: bool,
	pub stop_on_match: bool,
	regex: Option<Regex>,
}

impl TargetRule {
	fn compile(index: usize, config: &TargetRuleConfig) -> (Self, Option<RoutingError>) {
		let (regex, error) = match Regex::new(&format!("^(?:{})$", config.pattern)) {
			Ok(regex) => (Some(regex), None),
			Err(source) => (
				None,
				Some(RoutingError::InvalidPattern {
					index,
					pattern: config.pattern.clone(),
					source,
				}),
			),
		};

		let rule = Self {
			pattern: config.pattern.clone(),
			target: config.target.clone(),
			backtrace: config.backtrace,
			stop_on_match: config.stop_on_match,
			regex,
		};
		(rule, error)
	}

	/// Full-string match against the identifier.
	pub fn matches(&self, identifier: &str) -> bool {
		self.regex.as_ref().is_some_and(|re| re.is_match(identifier))
	}

	pub fn is_valid(&self) -> bool {
		self.regex.is_some()
	}
}

/// Ordered rule list.
#[derive(Debug, Clone, Default)]
pub struct TargetMap {
	rules: Vec<TargetRule>,
}

impl TargetMap {
	/// Compiles every rule, returning the map alongside the rules that could
	/// not be compiled.
	pub fn compile(configs: &[TargetRuleConfig]) -> (Self, Vec<RoutingError>) {
		let mut rules = Vec::with_capacity(configs.len());
		let mut errors = Vec::new();
		for (index, config) in configs.iter().enumerate() {
			let (rule, error) = TargetRule::compile(index, config);
			rules.push(rule);
			errors.extend(error);
		}
		(Self { rules }, errors)
	}

	pub fn rules(&self) -> &[TargetRule] {
		&self.rules
	}

	/// Evaluates the rules in order. A later match for the same target
	/// overwrites its backtrace flag; a matching stop rule ends evaluation.
	pub fn route(&self, identifier: &str) -> RoutedTargets {
		let mut routed = RoutedTargets::default();
		for rule in &self.rules {
			if !rule.matches(identifier) {
				continue;
			}
			routed.insert(&rule.target, rule.backtrace);
			if rule.stop_on_match {
				break;
			}
		}
		routed
	}
}

/// Targets chosen for one identifier, in first-match order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutedTargets {
	entries: Vec<(String, bool)>,
}

impl RoutedTargets {
	fn insert(&mut self, target: &str, backtrace: bool) {
		match self.entries.iter_mut().find(|(t, _)| t == target) {
			Some(entry) => entry.1 = backtrace,
			None => self.entries.push((target.to_string(), backtrace)),
		}
	}

	pub fn get(&self, target: &str) -> Option<bool> {
		self.entries
			.iter()
			.find(|(t, _)| t == target)
			.map(|(_, backtrace)| *backtrace)
	}

	pub fn contains(&self, target: &str) -> bool {
		self.get(target).is_some()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
		self.entries.iter().map(|(t, b)| (t.as_str(), *b))
	}
}

/// Routes identifiers through a lazily compiled [`TargetMap`] and caches
/// the result per identifier for the lifetime of the router.
pub struct TargetRouter {
	rules: Vec<TargetRuleConfig>,
	map: OnceLock<TargetMap>,
	cache: RwLock<HashMap<String, Arc<RoutedTargets>>>,
}

impl TargetRouter {
	pub fn new(rules: Vec<TargetRuleConfig>) -> Self {
		Self {
			rules,
			map: OnceLock::new(),
			cache: RwLock::new(HashMap::new()),
		}
	}

	fn map(&self) -> &TargetMap {
		self.map.get_or_init(|| {
			let (map, errors) = TargetMap::compile(&self.rules);
			for error in &errors {
				warn!(error = %error, "target rule will never match");
			}
			debug!(
				rules = map.rules().len(),
				invalid = errors.len(),
				"compiled target map"
			);
			map
		})
	}

	pub fn route(&self, identifier: &str) -> Arc<RoutedTargets> {
		if let Some(cached) = self.cache.read().get(identifier) {
			return Arc::clone(cached);
		}

		let routed = Arc::new(self.map().route(identifier));
		let mut cache = self.cache.write();
		Arc::clone(
			cache
				.entry(identifier.to_string())
				.or_insert_with(|| Arc::clone(&routed)),
		)
	}

	pub fn cached_identifiers(&self) -> usize {
		self.cache.read().len()
	}
}

impl std::fmt::Debug for TargetRouter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TargetRouter")
			.field("rules", &self.rules.len())
			.field("cached", &self.cached_identifiers())
			.finish()
	}
}
