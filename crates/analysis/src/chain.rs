// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Backward chains through originations.
//!
//! For every sink field the analysis records its *first originations*: the
//! originations reached by walking backwards until either a leaf or an
//! origination the split predicate accepts. Splitting on state nodes answers
//! "which state produces this field"; never splitting traces to the leaves.

use std::{
	collections::HashMap,
	fmt::{Display, Formatter},
	sync::Arc,
};

use indexmap::{IndexMap, IndexSet};
use lattice_plan::{NodeField, PNode};
use tracing::{instrument, trace};

use crate::origin::{OriginAnalysis, Origination};

/// One step of a backward chain. `next` holds the links of the origination's
/// source field, empty at a leaf or split point. Subtrees are shared between
/// every sink that reaches them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginationLink {
	pub origination: Origination,
	pub next: Vec<Arc<OriginationLink>>,
}

impl OriginationLink {
	fn render(&self, depth: usize, f: &mut Formatter<'_>) -> std::fmt::Result {
		writeln!(f, "{:indent$}{}", "", self.origination, indent = depth * 2)?;
		for next in &self.next {
			next.render(depth + 1, f)?;
		}
		Ok(())
	}
}

impl Display for OriginationLink {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		self.render(0, f)
	}
}

#[derive(Debug, Clone)]
pub struct ChainAnalysis {
	split_originations: IndexSet<Origination>,
	first_originations: IndexSet<Origination>,
	first_origination_sets_by_sink: IndexMap<NodeField, IndexSet<Origination>>,
	first_origination_sets_by_origination: IndexMap<Origination, IndexSet<Origination>>,
	sink_sets_by_first_source: IndexMap<NodeField, IndexSet<NodeField>>,
	links_by_sink: IndexMap<NodeField, Vec<Arc<OriginationLink>>>,
	toposort_indices: HashMap<PNode, usize>,
}

impl ChainAnalysis {
	#[instrument(name = "analysis::chain::new", level = "debug", skip_all)]
	pub(crate) fn new(origins: &OriginAnalysis, split: impl Fn(&Origination) -> bool) -> ChainAnalysis {
		let mut split_originations = IndexSet::new();
		let mut first_originations = IndexSet::new();
		let mut first_origination_sets_by_sink: IndexMap<NodeField, IndexSet<Origination>> = IndexMap::new();
		let mut first_origination_sets_by_origination = IndexMap::new();
		let mut links_by_sink: IndexMap<NodeField, Vec<Arc<OriginationLink>>> = IndexMap::new();
		let mut toposort_indices = HashMap::new();

		// Sinks arrive in toposort order, so every source field is complete
		// before the first sink that reads it.
		for (sink, originations) in origins.originations_by_sink() {
			if let Some(idx) = origins.toposort_index(&sink.node) {
				toposort_indices.insert(sink.node.clone(), idx);
			}

			let mut firsts = IndexSet::new();
			let mut links = Vec::with_capacity(originations.len());

			if let Some(leaf) = originations.iter().find(|o| o.is_leaf()) {
				firsts.insert(leaf.clone());
				links.push(Arc::new(OriginationLink {
					origination: leaf.clone(),
					next: vec![],
				}));
				first_origination_sets_by_origination.insert(leaf.clone(), IndexSet::from([leaf.clone()]));
			} else {
				for origination in originations {
					let Some(source) = &origination.source else {
						continue;
					};
					let (set, next) = if split(origination) {
						split_originations.insert(origination.clone());
						(IndexSet::from([origination.clone()]), vec![])
					} else {
						(
							first_origination_sets_by_sink.get(source).cloned().unwrap_or_default(),
							links_by_sink.get(source).cloned().unwrap_or_default(),
						)
					};
					firsts.extend(set.iter().cloned());
					links.push(Arc::new(OriginationLink {
						origination: origination.clone(),
						next,
					}));
					first_origination_sets_by_origination.insert(origination.clone(), set);
				}
			}

			trace!(sink = %sink, firsts = firsts.len(), "first originations");
			first_originations.extend(firsts.iter().cloned());
			first_origination_sets_by_sink.insert(sink.clone(), firsts);
			links_by_sink.insert(sink.clone(), links);
		}

		let mut sink_sets_by_first_source: IndexMap<NodeField, IndexSet<NodeField>> = IndexMap::new();
		for (sink, firsts) in &first_origination_sets_by_sink {
			for first in firsts {
				sink_sets_by_first_source.entry(first.sink.clone()).or_default().insert(sink.clone());
			}
		}

		ChainAnalysis {
			split_originations,
			first_originations,
			first_origination_sets_by_sink,
			first_origination_sets_by_origination,
			sink_sets_by_first_source,
			links_by_sink,
			toposort_indices,
		}
	}

	/// Originations at which the split predicate stopped a chain.
	pub fn split_originations(&self) -> &IndexSet<Origination> {
		&self.split_originations
	}

	pub fn is_split(&self, origination: &Origination) -> bool {
		self.split_originations.contains(origination)
	}

	/// Every origination that is first for some sink.
	pub fn first_originations(&self) -> &IndexSet<Origination> {
		&self.first_originations
	}

	pub fn first_origination_sets_by_sink(&self) -> &IndexMap<NodeField, IndexSet<Origination>> {
		&self.first_origination_sets_by_sink
	}

	pub fn first_origination_set(&self, sink: &NodeField) -> Option<&IndexSet<Origination>> {
		self.first_origination_sets_by_sink.get(sink)
	}

	/// First originations reached through one particular origination.
	pub fn first_origination_set_of(&self, origination: &Origination) -> Option<&IndexSet<Origination>> {
		self.first_origination_sets_by_origination.get(origination)
	}

	/// Inverse of the first-origination sets: for the sink field of each
	/// first origination, every sink field that traces back to it.
	pub fn sink_sets_by_first_source(&self) -> &IndexMap<NodeField, IndexSet<NodeField>> {
		&self.sink_sets_by_first_source
	}

	pub fn links(&self, sink: &NodeField) -> &[Arc<OriginationLink>] {
		self.links_by_sink.get(sink).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Every chain of originations leading from `sink` back to `source`,
	/// each ordered sink first.
	pub fn paths(&self, sink: &NodeField, source: &NodeField) -> Vec<Vec<Origination>> {
		let mut paths = Vec::new();
		let Some(source_idx) = self.toposort_indices.get(&source.node).copied() else {
			return paths;
		};
		let mut path = Vec::new();
		for link in self.links(sink) {
			self.walk(link, source, source_idx, &mut path, &mut paths);
		}
		paths
	}

	fn walk(
		&self,
		link: &OriginationLink,
		source: &NodeField,
		source_idx: usize,
		path: &mut Vec<Origination>,
		paths: &mut Vec<Vec<Origination>>,
	) {
		path.push(link.origination.clone());
		if &link.origination.sink == source {
			paths.push(path.clone());
		} else if self.toposort_indices.get(&link.origination.sink.node).is_some_and(|idx| *idx > source_idx) {
			for next in &link.next {
				self.walk(next, source, source_idx, path, paths);
			}
		}
		path.pop();
	}
}
