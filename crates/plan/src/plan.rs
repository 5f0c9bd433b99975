// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::{BTreeMap, HashMap, HashSet};

use lattice_type::Result;
use tracing::{debug, instrument};

use crate::{
	error::PlanError,
	node::{NodeField, NodeId, NodeKind, PNode},
};

/// A DAG of nodes reachable from a root, with a deterministic topological
/// order: every node comes after all of its transitive sources, and nodes
/// becoming ready at the same step are ordered by name.
#[derive(Debug, Clone)]
pub struct Plan {
	root: PNode,
	toposorted: Vec<PNode>,
	toposort_indices: HashMap<PNode, usize>,
	nodes_by_name: HashMap<String, PNode>,
	nodes_by_id: HashMap<NodeId, PNode>,
	sinks_by_node: HashMap<PNode, Vec<PNode>>,
	node_field_indices: HashMap<NodeField, usize>,
}

impl Plan {
	#[instrument(name = "plan::new", level = "debug", skip(root), fields(root = root.name()))]
	pub fn new(root: PNode) -> Result<Plan> {
		let nodes = collect(&root);

		let mut nodes_by_name: HashMap<String, PNode> = HashMap::new();
		let mut nodes_by_id: HashMap<NodeId, PNode> = HashMap::new();
		for node in &nodes {
			if nodes_by_name.insert(node.name().to_string(), node.clone()).is_some() {
				return Err(PlanError::DuplicateNodeName {
					name: node.name().to_string(),
				}
				.into());
			}
			if let Some(existing) = nodes_by_id.insert(node.id(), node.clone()) {
				return Err(PlanError::NodeIdCollision {
					id: node.id(),
					first: existing.name().to_string(),
					second: node.name().to_string(),
				}
				.into());
			}
		}

		for node in &nodes {
			check_invalidations(node, &nodes_by_id)?;
		}

		let toposorted = toposort(&nodes);
		let toposort_indices: HashMap<PNode, usize> =
			toposorted.iter().enumerate().map(|(idx, node)| (node.clone(), idx)).collect();

		let mut sinks_by_node: HashMap<PNode, Vec<PNode>> = HashMap::new();
		for node in &toposorted {
			for source in node.sources() {
				sinks_by_node.entry(source.clone()).or_default().push(node.clone());
			}
		}

		let mut node_field_indices = HashMap::new();
		for node in &toposorted {
			for field in node.fields().names() {
				let idx = node_field_indices.len();
				node_field_indices.insert(NodeField::new(node, field), idx);
			}
		}

		debug!(nodes = toposorted.len(), "plan constructed");

		Ok(Plan {
			root,
			toposorted,
			toposort_indices,
			nodes_by_name,
			nodes_by_id,
			sinks_by_node,
			node_field_indices,
		})
	}

	pub fn root(&self) -> &PNode {
		&self.root
	}

	/// All nodes in toposort order.
	pub fn toposorted(&self) -> &[PNode] {
		&self.toposorted
	}

	pub fn reverse_toposorted(&self) -> impl Iterator<Item = &PNode> {
		self.toposorted.iter().rev()
	}

	pub fn toposort_index(&self, node: &PNode) -> Option<usize> {
		self.toposort_indices.get(node).copied()
	}

	pub fn contains(&self, node: &PNode) -> bool {
		self.toposort_indices.contains_key(node)
	}

	pub fn node(&self, name: &str) -> Option<&PNode> {
		self.nodes_by_name.get(name)
	}

	pub fn node_by_id(&self, id: NodeId) -> Option<&PNode> {
		self.nodes_by_id.get(&id)
	}

	pub fn leaf_nodes(&self) -> Vec<&PNode> {
		self.toposorted.iter().filter(|n| n.is_leaf()).collect()
	}

	/// Nodes reading directly from `node`, in toposort order.
	pub fn sink_nodes(&self, node: &PNode) -> &[PNode] {
		self.sinks_by_node.get(node).map(Vec::as_slice).unwrap_or(&[])
	}

	/// Position of a node field when every node's fields are laid out in
	/// toposort order.
	pub fn node_field_toposort_index(&self, field: &NodeField) -> Option<usize> {
		self.node_field_indices.get(field).copied()
	}

	pub fn len(&self) -> usize {
		self.toposorted.len()
	}

	pub fn is_empty(&self) -> bool {
		self.toposorted.is_empty()
	}
}

fn collect(root: &PNode) -> Vec<PNode> {
	let mut seen: HashSet<PNode> = HashSet::new();
	let mut result = Vec::new();
	let mut stack = vec![root.clone()];
	while let Some(node) = stack.pop() {
		if !seen.insert(node.clone()) {
			continue;
		}
		stack.extend(node.sources().iter().cloned());
		result.push(node);
	}
	result
}

fn toposort(nodes: &[PNode]) -> Vec<PNode> {
	let mut remaining: HashMap<PNode, usize> = nodes
		.iter()
		.map(|node| (node.clone(), node.sources().len()))
		.collect();
	let mut sinks: HashMap<PNode, Vec<PNode>> = HashMap::new();
	for node in nodes {
		for source in node.sources() {
			sinks.entry(source.clone()).or_default().push(node.clone());
		}
	}

	let mut result = Vec::with_capacity(nodes.len());
	let mut ready: BTreeMap<String, PNode> = remaining
		.iter()
		.filter(|(_, count)| **count == 0)
		.map(|(node, _)| (node.name().to_string(), node.clone()))
		.collect();
	while !ready.is_empty() {
		let step = std::mem::take(&mut ready);
		for node in step.into_values() {
			for sink in sinks.get(&node).into_iter().flatten() {
				if let Some(count) = remaining.get_mut(sink) {
					*count -= 1;
					if *count == 0 {
						ready.insert(sink.name().to_string(), sink.clone());
					}
				}
			}
			result.push(node);
		}
	}
	result
}

fn check_invalidations(node: &PNode, nodes_by_id: &HashMap<NodeId, PNode>) -> Result<()> {
	let NodeKind::State {
		invalidations,
		..
	} = node.kind()
	else {
		return Ok(());
	};
	for source_id in invalidations.entries.keys() {
		let Some(source) = nodes_by_id.get(source_id) else {
			return Err(PlanError::UnknownInvalidationSource {
				node: node.name().to_string(),
				source_id: *source_id,
			}
			.into());
		};
		for field in invalidations.source_fields(*source_id) {
			if !source.fields().contains(field) {
				return Err(PlanError::InvalidationFieldNotFound {
					node: node.name().to_string(),
					source_node: source.name().to_string(),
					field: field.to_string(),
				}
				.into());
			}
		}
	}
	Ok(())
}
