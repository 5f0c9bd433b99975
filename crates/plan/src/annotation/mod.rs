// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::field::{FieldAnnotation, FieldAnnotations};

mod validator;

pub use validator::{AnnotationValidators, FieldValidator, NodeContext, NodeValidator, VALIDATORS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeAnnotation {
	/// Rows of this node are visible to external readers.
	Exposed,
	/// The node exists only to serve other nodes.
	Internal,
	/// Rows of this node are never persisted.
	Ephemeral,
}

impl Display for NodeAnnotation {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			NodeAnnotation::Exposed => f.write_str("@exposed"),
			NodeAnnotation::Internal => f.write_str("@internal"),
			NodeAnnotation::Ephemeral => f.write_str("@ephemeral"),
		}
	}
}

/// Annotations declared on a node: node-level annotations plus extra field
/// annotations applied to the node's computed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAnnotations {
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub annotations: Vec<NodeAnnotation>,
	#[serde(default, skip_serializing_if = "IndexMap::is_empty")]
	pub fields: IndexMap<String, FieldAnnotations>,
}

impl NodeAnnotations {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, annotation: NodeAnnotation) -> Self {
		if !self.annotations.contains(&annotation) {
			self.annotations.push(annotation);
		}
		self
	}

	pub fn with_field(mut self, field: impl Into<String>, annotation: FieldAnnotation) -> Self {
		self.fields.entry(field.into()).or_default().insert(annotation);
		self
	}

	pub fn contains(&self, annotation: NodeAnnotation) -> bool {
		self.annotations.contains(&annotation)
	}

	pub fn is_empty(&self) -> bool {
		self.annotations.is_empty() && self.fields.is_empty()
	}
}
