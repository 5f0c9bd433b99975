// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_plan::{FieldCollection, NodeId};
use lattice_type::Value;

use crate::key::RowId;

/// One contributing row: the node that produced it and its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineageEntry {
	pub node: NodeId,
	pub id: RowId,
}

/// The rows a row was built from, as decided by the engine's lineage policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Lineage(Vec<LineageEntry>);

impl Lineage {
	pub fn new(entries: Vec<LineageEntry>) -> Self {
		Self(entries)
	}

	pub fn entries(&self) -> &[LineageEntry] {
		&self.0
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn contains(&self, node: NodeId, id: &RowId) -> bool {
		self.0.iter().any(|entry| entry.node == node && &entry.id == id)
	}
}

/// A built row.
///
/// A live row has both an id and attributes. A tombstone keeps its id but
/// has no attributes: the row with that id no longer exists downstream of
/// here. An absent row has neither and stands for a lookup that found
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
	pub node: NodeId,
	pub id: Option<RowId>,
	/// Values aligned with the producing node's fields.
	pub attributes: Option<Vec<Value>>,
	pub lineage: Lineage,
}

impl Row {
	pub fn live(node: NodeId, id: RowId, attributes: Vec<Value>, lineage: Lineage) -> Self {
		Self {
			node,
			id: Some(id),
			attributes: Some(attributes),
			lineage,
		}
	}

	pub fn tombstone(node: NodeId, id: RowId, lineage: Lineage) -> Self {
		Self {
			node,
			id: Some(id),
			attributes: None,
			lineage,
		}
	}

	pub fn absent(node: NodeId) -> Self {
		Self {
			node,
			id: None,
			attributes: None,
			lineage: Lineage::default(),
		}
	}

	pub fn is_live(&self) -> bool {
		self.attributes.is_some()
	}

	pub fn is_tombstone(&self) -> bool {
		self.id.is_some() && self.attributes.is_none()
	}

	pub fn is_absent(&self) -> bool {
		self.id.is_none() && self.attributes.is_none()
	}

	/// The value of `field`, resolved against the producing node's fields.
	pub fn get<'a>(&'a self, fields: &FieldCollection, field: &str) -> Option<&'a Value> {
		let position = fields.position(field)?;
		self.attributes.as_ref()?.get(position)
	}
}
