// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Debug, Display, Formatter},
	hash::{Hash, Hasher},
	sync::Arc,
};

use lattice_type::Result;
use tracing::instrument;

use crate::{
	annotation::{NodeAnnotations, NodeContext, VALIDATORS},
	error::{PlanError, in_node},
	field::FieldCollection,
};

mod derive;
mod id;
mod invalidation;
mod kind;
mod layout;

pub use id::NodeId;
pub use invalidation::{Invalidation, Invalidations, NodeEntry, Strength};
pub use kind::{
	Branch, CrossJoinMode, Denormalization, Input, JoinMode, Linking, LookupBranch, NodeKind, Predicate,
	Projection, Strictness,
};
pub use layout::{JoinLayout, ProjectionLayout};

#[derive(Debug, Clone)]
pub(crate) enum Layout {
	None,
	Join(JoinLayout),
	Projection(ProjectionLayout),
}

struct NodeInner {
	name: String,
	id: NodeId,
	annotations: NodeAnnotations,
	kind: NodeKind,
	sources: Vec<PNode>,
	fields: FieldCollection,
	layout: Layout,
}

/// An immutable plan node.
///
/// Cloning is cheap and shares the node. Equality and hashing use node
/// identity, so two separately constructed nodes are distinct even when
/// declared identically.
#[derive(Clone)]
pub struct PNode(Arc<NodeInner>);

impl PNode {
	pub fn new(name: impl Into<String>, annotations: NodeAnnotations, kind: NodeKind) -> Result<PNode> {
		let name = name.into();
		Self::construct(&name, annotations, kind).map_err(|err| in_node(err, &name))
	}

	#[instrument(name = "plan::node::construct", level = "trace", skip(annotations, kind), fields(kind = kind.name()))]
	fn construct(name: &str, annotations: NodeAnnotations, kind: NodeKind) -> Result<PNode> {
		if name.is_empty() {
			return Err(PlanError::InvalidNode {
				node: name.to_string(),
				reason: "node names must not be empty".to_string(),
				fields: vec![],
			}
			.into());
		}

		let sources = kind.sources();
		if kind.is_leaf_kind() != sources.is_empty() {
			return Err(PlanError::LeafMismatch {
				node: name.to_string(),
				kind: kind.name(),
			}
			.into());
		}
		for (idx, source) in sources.iter().enumerate() {
			if sources[..idx].iter().any(|s| s == source) {
				return Err(PlanError::DuplicateSource {
					node: name.to_string(),
					source_node: source.name().to_string(),
				}
				.into());
			}
		}

		let (fields, layout) = derive::derive(name, &kind)?;
		let fields = fields.with_annotations(name, &annotations.fields)?;

		VALIDATORS.validate(&NodeContext {
			name,
			kind: &kind,
			fields: &fields,
			annotations: &annotations,
		})?;

		Ok(PNode(Arc::new(NodeInner {
			name: name.to_string(),
			id: NodeId::from_name(name),
			annotations,
			kind,
			sources,
			fields,
			layout,
		})))
	}

	/// Construction without node-level annotations.
	pub fn of(name: impl Into<String>, kind: NodeKind) -> Result<PNode> {
		Self::new(name, NodeAnnotations::new(), kind)
	}

	pub fn name(&self) -> &str {
		&self.0.name
	}

	pub fn id(&self) -> NodeId {
		self.0.id
	}

	pub fn annotations(&self) -> &NodeAnnotations {
		&self.0.annotations
	}

	pub fn kind(&self) -> &NodeKind {
		&self.0.kind
	}

	pub fn kind_name(&self) -> &'static str {
		self.0.kind.name()
	}

	pub fn sources(&self) -> &[PNode] {
		&self.0.sources
	}

	/// The only source of a single-source node.
	pub fn source(&self) -> Option<&PNode> {
		match self.0.sources.as_slice() {
			[source] if !matches!(self.0.kind, NodeKind::Join { .. } | NodeKind::CrossJoin { .. } | NodeKind::Union { .. }) => {
				Some(source)
			}
			_ => None,
		}
	}

	pub fn is_leaf(&self) -> bool {
		self.0.sources.is_empty()
	}

	pub fn fields(&self) -> &FieldCollection {
		&self.0.fields
	}

	pub fn join_layout(&self) -> Option<&JoinLayout> {
		match &self.0.layout {
			Layout::Join(layout) => Some(layout),
			_ => None,
		}
	}

	pub fn projection_layout(&self) -> Option<&ProjectionLayout> {
		match &self.0.layout {
			Layout::Projection(layout) => Some(layout),
			_ => None,
		}
	}

	pub fn ptr_eq(&self, other: &PNode) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl PartialEq for PNode {
	fn eq(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl Eq for PNode {}

impl Hash for PNode {
	fn hash<H: Hasher>(&self, state: &mut H) {
		(Arc::as_ptr(&self.0) as usize).hash(state)
	}
}

impl Debug for PNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PNode").field("kind", &self.kind_name()).field("name", &self.name()).finish()
	}
}

impl Display for PNode {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} {}", self.kind_name(), self.name())
	}
}

/// A field of a specific node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeField {
	pub node: PNode,
	pub field: String,
}

impl NodeField {
	pub fn new(node: &PNode, field: impl Into<String>) -> Self {
		Self {
			node: node.clone(),
			field: field.into(),
		}
	}
}

impl Display for NodeField {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}.{}", self.node.name(), self.field)
	}
}
