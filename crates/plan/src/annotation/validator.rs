// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Registry of annotation validators.
//!
//! Validation is opt-in per annotation kind: an annotation without a
//! registered validator is always accepted.

use std::collections::HashMap;

use lattice_type::Result;
use once_cell::sync::Lazy;

use super::{NodeAnnotation, NodeAnnotations};
use crate::{
	error::PlanError,
	field::{Field, FieldAnnotationKind, FieldCollection},
	node::NodeKind,
};

/// The node a validator is asked about, before it is frozen.
pub struct NodeContext<'a> {
	pub name: &'a str,
	pub kind: &'a NodeKind,
	pub fields: &'a FieldCollection,
	pub annotations: &'a NodeAnnotations,
}

pub type FieldValidator = fn(&Field, &NodeContext<'_>) -> std::result::Result<(), String>;
pub type NodeValidator = fn(&NodeContext<'_>) -> std::result::Result<(), String>;

pub static VALIDATORS: Lazy<AnnotationValidators> = Lazy::new(AnnotationValidators::standard);

#[derive(Default)]
pub struct AnnotationValidators {
	field: HashMap<FieldAnnotationKind, FieldValidator>,
	node: HashMap<NodeAnnotation, NodeValidator>,
}

impl AnnotationValidators {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn standard() -> Self {
		let mut result = Self::new();
		result.register_field(FieldAnnotationKind::Id, validate_hashable);
		result.register_field(FieldAnnotationKind::Unique, validate_hashable);
		result.register_field(FieldAnnotationKind::Monotonic, validate_monotonic);
		result.register_node(NodeAnnotation::Exposed, validate_exposed);
		result.register_node(NodeAnnotation::Internal, validate_internal);
		result
	}

	pub fn register_field(&mut self, kind: FieldAnnotationKind, validator: FieldValidator) {
		self.field.insert(kind, validator);
	}

	pub fn register_node(&mut self, annotation: NodeAnnotation, validator: NodeValidator) {
		self.node.insert(annotation, validator);
	}

	pub fn validate(&self, node: &NodeContext<'_>) -> Result<()> {
		for field in node.fields.iter() {
			for annotation in field.annotations.iter() {
				if let Some(validator) = self.field.get(&annotation.kind) {
					validator(field, node).map_err(|reason| PlanError::AnnotationRejected {
						node: node.name.to_string(),
						field: Some(field.name.clone()),
						annotation: annotation.to_string(),
						reason,
					})?;
				}
			}
		}
		for annotation in &node.annotations.annotations {
			if let Some(validator) = self.node.get(annotation) {
				validator(node).map_err(|reason| PlanError::AnnotationRejected {
					node: node.name.to_string(),
					field: None,
					annotation: annotation.to_string(),
					reason,
				})?;
			}
		}
		Ok(())
	}
}

fn validate_hashable(field: &Field, _node: &NodeContext<'_>) -> std::result::Result<(), String> {
	if field.ty.is_hashable() {
		Ok(())
	} else {
		Err(format!("field '{}' of type {} cannot be used as a key", field.name, field.ty))
	}
}

fn validate_monotonic(field: &Field, _node: &NodeContext<'_>) -> std::result::Result<(), String> {
	if field.ty.is_numeric() {
		Ok(())
	} else {
		Err(format!("field '{}' of type {} is not numeric", field.name, field.ty))
	}
}

fn validate_exposed(node: &NodeContext<'_>) -> std::result::Result<(), String> {
	if node.fields.is_empty() {
		Err("an exposed node must have at least one field".to_string())
	} else {
		Ok(())
	}
}

fn validate_internal(node: &NodeContext<'_>) -> std::result::Result<(), String> {
	if node.annotations.contains(NodeAnnotation::Exposed) {
		Err("a node cannot be both internal and exposed".to_string())
	} else {
		Ok(())
	}
}
