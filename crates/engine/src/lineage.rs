// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::HashSet;

use crate::row::{Lineage, LineageEntry, Row};

/// Decides what lineage a built row carries.
pub trait LineagePolicy: Send + Sync {
	fn lineage(&self, contributing: &[&Row]) -> Lineage;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineageGranularity {
	/// Rows carry no lineage.
	None,
	/// The immediate contributing rows.
	#[default]
	Id,
	/// The immediate contributing rows and everything they were built from.
	Transitive,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GranularLineagePolicy {
	granularity: LineageGranularity,
}

impl GranularLineagePolicy {
	pub fn new(granularity: LineageGranularity) -> Self {
		Self {
			granularity,
		}
	}

	pub fn granularity(&self) -> LineageGranularity {
		self.granularity
	}
}

impl LineagePolicy for GranularLineagePolicy {
	fn lineage(&self, contributing: &[&Row]) -> Lineage {
		if self.granularity == LineageGranularity::None {
			return Lineage::default();
		}
		let mut seen = HashSet::new();
		let mut entries = Vec::new();
		for row in contributing {
			if let Some(id) = &row.id {
				let entry = LineageEntry {
					node: row.node,
					id: id.clone(),
				};
				if seen.insert(entry.clone()) {
					entries.push(entry);
				}
			}
			if self.granularity == LineageGranularity::Transitive {
				for entry in row.lineage.entries() {
					if seen.insert(entry.clone()) {
						entries.push(entry.clone());
					}
				}
			}
		}
		Lineage::new(entries)
	}
}
