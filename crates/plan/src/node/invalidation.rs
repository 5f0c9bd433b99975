// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strength {
	#[default]
	Strong,
	Weak,
}

/// Declares that a change to an upstream row invalidates the downstream rows
/// whose key fields equal the upstream row's source fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invalidation {
	/// Upstream field name to key field name on the owning state node.
	pub key_fields_by_source_field: IndexMap<String, String>,
	/// Only changes to these upstream fields invalidate, when present.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub update_mask: Option<BTreeSet<String>>,
	#[serde(default)]
	pub strength: Strength,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeEntry {
	pub invalidations: Vec<Invalidation>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub update_mask: Option<BTreeSet<String>>,
}

/// Invalidation rules of a state node, keyed by upstream node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Invalidations {
	pub entries: IndexMap<NodeId, NodeEntry>,
}

impl Invalidations {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, source: NodeId, invalidation: Invalidation) -> Self {
		self.entries.entry(source).or_default().invalidations.push(invalidation);
		self
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Every key field referenced on the owning node.
	pub fn key_fields(&self) -> BTreeSet<&str> {
		self.entries
			.values()
			.flat_map(|e| e.invalidations.iter())
			.flat_map(|i| i.key_fields_by_source_field.values())
			.map(String::as_str)
			.collect()
	}

	/// Every field referenced on the upstream node `source`.
	pub fn source_fields(&self, source: NodeId) -> BTreeSet<&str> {
		let Some(entry) = self.entries.get(&source) else {
			return BTreeSet::new();
		};
		let mut result: BTreeSet<&str> = entry.update_mask.iter().flatten().map(String::as_str).collect();
		for invalidation in &entry.invalidations {
			result.extend(invalidation.key_fields_by_source_field.keys().map(String::as_str));
			result.extend(invalidation.update_mask.iter().flatten().map(String::as_str));
		}
		result
	}
}
