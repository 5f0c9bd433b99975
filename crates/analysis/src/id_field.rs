// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Candidate identity field sets per node.
//!
//! Each node gets a list of minimal field sets, any of which identifies a row
//! of that node. An empty list means no identity is known. A list holding the
//! empty set means every row is the same row.

use std::collections::{BTreeSet, HashMap};

use lattice_plan::{NodeKind, PNode, Plan, util::cartesian};
use lattice_type::{Result, return_internal_error};
use tracing::{debug, instrument, trace};

pub type IdFieldSet = BTreeSet<String>;

#[derive(Debug, Clone, Default)]
pub struct IdFieldAnalysis {
	sets_by_node: HashMap<PNode, Vec<IdFieldSet>>,
}

impl IdFieldAnalysis {
	#[instrument(name = "analysis::id_field::analyze", level = "debug", skip(plan), fields(root = plan.root().name()))]
	pub fn analyze(plan: &Plan) -> Result<IdFieldAnalysis> {
		let mut analysis = IdFieldAnalysis::default();
		for node in plan.toposorted() {
			let sets = analysis.derive(node)?;
			trace!(node = node.name(), candidates = sets.len(), "id field sets");
			analysis.sets_by_node.insert(node.clone(), sets);
		}
		debug!(nodes = analysis.sets_by_node.len(), "id field analysis complete");
		Ok(analysis)
	}

	/// Candidate id field sets of `node`, empty for nodes outside the plan.
	pub fn id_field_sets(&self, node: &PNode) -> &[IdFieldSet] {
		self.sets_by_node.get(node).map(Vec::as_slice).unwrap_or(&[])
	}

	fn source_sets(&self, source: &PNode) -> Result<&[IdFieldSet]> {
		match self.sets_by_node.get(source) {
			Some(sets) => Ok(sets),
			None => return_internal_error!("id fields of '{}' requested before it was analyzed", source.name()),
		}
	}

	fn derive(&self, node: &PNode) -> Result<Vec<IdFieldSet>> {
		let sets = match node.kind() {
			NodeKind::Scan {
				id_fields,
				..
			} => {
				if id_fields.is_empty() {
					vec![]
				} else {
					vec![id_fields.iter().cloned().collect()]
				}
			}

			NodeKind::Values {
				index_field,
				..
			} => vec![index_field.iter().cloned().collect()],

			NodeKind::Filter {
				source,
				..
			}
			| NodeKind::LookupJoin {
				source,
				..
			}
			| NodeKind::Cache {
				source,
			}
			| NodeKind::Output {
				source,
				..
			}
			| NodeKind::Extract {
				source,
				..
			}
			| NodeKind::Struct {
				source,
				..
			}
			| NodeKind::Search {
				source,
				..
			}
			| NodeKind::Scope {
				source,
			}
			| NodeKind::ScopeExit {
				source,
				..
			} => self.source_sets(source)?.to_vec(),

			NodeKind::State {
				source,
				id_fields,
				..
			} => match id_fields {
				Some(sets) => sets.iter().map(|set| set.iter().cloned().collect()).collect(),
				None => self.source_sets(source)?.to_vec(),
			},

			NodeKind::Group {
				key_fields,
				..
			} => vec![key_fields.iter().cloned().collect()],

			NodeKind::Project {
				source,
				..
			} => {
				let Some(layout) = node.projection_layout() else {
					return_internal_error!("project '{}' has no projection layout", node.name());
				};
				let mut sets = Vec::new();
				for set in self.source_sets(source)? {
					let aliases: Vec<Vec<String>> = set.iter().map(|field| layout.outputs_of(field).to_vec()).collect();
					if aliases.iter().any(Vec::is_empty) {
						continue;
					}
					sets.extend(cartesian(&aliases).into_iter().map(|combination| combination.into_iter().collect()));
				}
				sets
			}

			NodeKind::Union {
				sources,
				index_field,
			} => match index_field {
				Some(index_field) => {
					let per_source = self.per_source_sets(sources)?;
					if per_source.iter().any(Vec::is_empty) {
						vec![]
					} else {
						cartesian(&per_source)
							.into_iter()
							.map(|combination| {
								let mut set: IdFieldSet = combination.into_iter().flatten().collect();
								set.insert(index_field.clone());
								set
							})
							.collect()
					}
				}
				None => vec![],
			},

			NodeKind::Unnest {
				source,
				index_field,
				..
			} => match index_field {
				Some(index_field) => self
					.source_sets(source)?
					.iter()
					.map(|set| {
						let mut set = set.clone();
						set.insert(index_field.clone());
						set
					})
					.collect(),
				None => vec![],
			},

			NodeKind::Unify {
				source,
				unified_fields,
				..
			} => self
				.source_sets(source)?
				.iter()
				.filter(|set| !unified_fields.iter().any(|field| set.contains(field)))
				.cloned()
				.collect(),

			NodeKind::Join {
				branches,
				..
			} => {
				let nodes: Vec<PNode> = branches.iter().map(|b| b.node.clone()).collect();
				self.combined(&nodes)?
			}

			NodeKind::CrossJoin {
				sources,
				..
			} => self.combined(sources)?,
		};
		Ok(dedup(sets))
	}

	fn per_source_sets(&self, sources: &[PNode]) -> Result<Vec<Vec<IdFieldSet>>> {
		sources.iter().map(|source| self.source_sets(source).map(<[IdFieldSet]>::to_vec)).collect()
	}

	/// Every combination of one candidate per source, flattened into one
	/// set. Unknown unless all sources agree on their number of candidates.
	fn combined(&self, sources: &[PNode]) -> Result<Vec<IdFieldSet>> {
		let per_source = self.per_source_sets(sources)?;
		let counts: BTreeSet<usize> = per_source.iter().map(Vec::len).collect();
		if counts.len() != 1 || counts.contains(&0) {
			return Ok(vec![]);
		}
		Ok(cartesian(&per_source).into_iter().map(|combination| combination.into_iter().flatten().collect()).collect())
	}
}

fn dedup(sets: Vec<IdFieldSet>) -> Vec<IdFieldSet> {
	let mut result: Vec<IdFieldSet> = Vec::with_capacity(sets.len());
	for set in sets {
		if !result.contains(&set) {
			result.push(set);
		}
	}
	result
}

#[cfg(test)]
mod tests {
	use super::*;

	fn set(items: &[&str]) -> IdFieldSet {
		items.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn test_dedup_keeps_first_occurrence() {
		let result = dedup(vec![set(&["b"]), set(&["a"]), set(&["b"])]);
		assert_eq!(result, vec![set(&["b"]), set(&["a"])]);
	}

	#[test]
	fn test_unknown_node_has_no_sets() {
		let analysis = IdFieldAnalysis::default();
		let node = PNode::of(
			"t",
			NodeKind::Scan {
				schema_table: "t".to_string(),
				fields: [("a".to_string(), lattice_type::Type::Int8)].into_iter().collect(),
				id_fields: vec!["a".to_string()],
			},
		)
		.unwrap();
		assert!(analysis.id_field_sets(&node).is_empty());
	}
}
