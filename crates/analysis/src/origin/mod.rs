// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Field origin analysis.
//!
//! Every field of every node receives one or more [`Origination`]s saying
//! where its values come from: either a field of one of the node's sources,
//! or nowhere inside the plan (a leaf origination).

use std::{
	collections::{HashMap, HashSet},
	fmt::{Display, Formatter},
};

use indexmap::IndexMap;
use lattice_plan::{NodeField, NodeKind, PNode, Plan};
use lattice_type::Result;
use tracing::{debug, instrument};

use crate::{chain::ChainAnalysis, error::AnalysisError};

mod visit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Genesis {
	Direct,
	InnerJoin,
	LeftJoinPrimary,
	LeftJoinSecondary,
	FullJoin,
	LookupJoin,
	Scan,
	Values,
	Group,
	Opaque,
}

impl Genesis {
	/// Leaf geneses have no source inside the plan.
	pub fn is_leaf(&self) -> bool {
		matches!(self, Genesis::Scan | Genesis::Values | Genesis::Group | Genesis::Opaque)
	}
}

impl Display for Genesis {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Genesis::Direct => "direct",
			Genesis::InnerJoin => "inner_join",
			Genesis::LeftJoinPrimary => "left_join_primary",
			Genesis::LeftJoinSecondary => "left_join_secondary",
			Genesis::FullJoin => "full_join",
			Genesis::LookupJoin => "lookup_join",
			Genesis::Scan => "scan",
			Genesis::Values => "values",
			Genesis::Group => "group",
			Genesis::Opaque => "opaque",
		};
		f.write_str(name)
	}
}

/// How a sink value sits relative to its source value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Nesting {
	#[default]
	None,
	/// The sink wraps the source as the named struct member.
	Nested(String),
	/// The sink is the named member taken out of a struct or list element.
	Unnested(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origination {
	pub sink: NodeField,
	pub source: Option<NodeField>,
	pub genesis: Genesis,
	pub nesting: Nesting,
}

impl Origination {
	pub fn leaf(sink: NodeField, genesis: Genesis) -> Self {
		Self {
			sink,
			source: None,
			genesis,
			nesting: Nesting::None,
		}
	}

	pub fn derived(sink: NodeField, source: NodeField, genesis: Genesis) -> Self {
		Self {
			sink,
			source: Some(source),
			genesis,
			nesting: Nesting::None,
		}
	}

	pub fn with_nesting(mut self, nesting: Nesting) -> Self {
		self.nesting = nesting;
		self
	}

	pub fn is_leaf(&self) -> bool {
		self.genesis.is_leaf()
	}
}

impl Display for Origination {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match &self.source {
			Some(source) => write!(f, "{} <- {} ({})", self.sink, source, self.genesis)?,
			None => write!(f, "{} ({})", self.sink, self.genesis)?,
		}
		match &self.nesting {
			Nesting::None => Ok(()),
			Nesting::Nested(member) => write!(f, " nested as {}", member),
			Nesting::Unnested(member) => write!(f, " unnested from {}", member),
		}
	}
}

/// The originations of every field of a plan, grouped by sink and by source.
#[derive(Debug, Clone)]
pub struct OriginAnalysis {
	originations: Vec<Origination>,
	toposort_indices: HashMap<PNode, usize>,
	by_sink: IndexMap<NodeField, Vec<Origination>>,
	by_source: IndexMap<NodeField, Vec<Origination>>,
}

impl OriginAnalysis {
	#[instrument(name = "analysis::origin::analyze", level = "debug", skip(plan), fields(root = plan.root().name()))]
	pub fn analyze(plan: &Plan) -> Result<OriginAnalysis> {
		let mut originations = Vec::new();
		for node in plan.toposorted() {
			visit::originate(node, &mut originations)?;
		}
		let toposort_indices =
			plan.toposorted().iter().enumerate().map(|(idx, node)| (node.clone(), idx)).collect();
		let analysis = Self::new(originations, toposort_indices)?;
		debug!(originations = analysis.originations.len(), "origin analysis complete");
		Ok(analysis)
	}

	fn new(originations: Vec<Origination>, toposort_indices: HashMap<PNode, usize>) -> Result<OriginAnalysis> {
		let mut by_sink: IndexMap<NodeField, Vec<Origination>> = IndexMap::new();
		let mut by_source: IndexMap<NodeField, Vec<Origination>> = IndexMap::new();
		let mut seen: HashSet<(&NodeField, Option<&NodeField>, &Nesting)> = HashSet::new();

		for origination in &originations {
			if !seen.insert((&origination.sink, origination.source.as_ref(), &origination.nesting)) {
				return Err(AnalysisError::DuplicateOrigination {
					node: origination.sink.node.name().to_string(),
					sink: origination.sink.to_string(),
					origin: origination.source.as_ref().map(ToString::to_string).unwrap_or_default(),
				}
				.into());
			}
			by_sink.entry(origination.sink.clone()).or_default().push(origination.clone());

			if let Some(source) = &origination.source {
				let sink_idx = toposort_indices.get(&origination.sink.node);
				let source_idx = toposort_indices.get(&source.node);
				let precedes = matches!((source_idx, sink_idx), (Some(s), Some(k)) if s < k);
				if !precedes || !origination.sink.node.sources().contains(&source.node) {
					return Err(AnalysisError::ToposortViolation {
						node: origination.sink.node.name().to_string(),
						sink: origination.sink.to_string(),
						origin: source.to_string(),
					}
					.into());
				}
				by_source.entry(source.clone()).or_default().push(origination.clone());
			}
		}

		let mut checked: HashSet<&PNode> = HashSet::new();
		for sink in by_sink.keys() {
			if !checked.insert(&sink.node) {
				continue;
			}
			let missing: Vec<String> = sink
				.node
				.fields()
				.names()
				.filter(|field| !by_sink.contains_key(&NodeField::new(&sink.node, *field)))
				.map(str::to_string)
				.collect();
			if !missing.is_empty() {
				return Err(AnalysisError::MissingOriginations {
					node: sink.node.name().to_string(),
					fields: missing,
				}
				.into());
			}
		}

		for (sink, originations) in &by_sink {
			if originations.len() > 1 && originations.iter().any(Origination::is_leaf) {
				return Err(AnalysisError::LeafNotExclusive {
					node: sink.node.name().to_string(),
					field: sink.field.clone(),
					count: originations.len() - 1,
				}
				.into());
			}
		}

		Ok(OriginAnalysis {
			originations,
			toposort_indices,
			by_sink,
			by_source,
		})
	}

	/// All originations, sinks in toposort order.
	pub fn originations(&self) -> &[Origination] {
		&self.originations
	}

	pub fn originations_by_sink(&self) -> &IndexMap<NodeField, Vec<Origination>> {
		&self.by_sink
	}

	pub fn originations_by_source(&self) -> &IndexMap<NodeField, Vec<Origination>> {
		&self.by_source
	}

	pub fn sink_originations(&self, sink: &NodeField) -> &[Origination] {
		self.by_sink.get(sink).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn source_originations(&self, source: &NodeField) -> &[Origination] {
		self.by_source.get(source).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn leaf_originations(&self) -> impl Iterator<Item = &Origination> {
		self.originations.iter().filter(|o| o.is_leaf())
	}

	pub(crate) fn toposort_index(&self, node: &PNode) -> Option<usize> {
		self.toposort_indices.get(node).copied()
	}

	pub fn chain_analysis(&self, split: impl Fn(&Origination) -> bool) -> ChainAnalysis {
		ChainAnalysis::new(self, split)
	}

	/// Chains traced all the way back to leaf originations.
	pub fn leaf_chain_analysis(&self) -> ChainAnalysis {
		self.chain_analysis(|_| false)
	}

	/// Chains that stop at the first state node.
	pub fn state_chain_analysis(&self) -> ChainAnalysis {
		self.chain_analysis(|o| matches!(o.sink.node.kind(), NodeKind::State { .. }))
	}
}
