// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_type::{Diagnostic, DiagnosticNode, Error, IntoDiagnostic, Type};

use crate::node::NodeId;

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
	#[error("field '{field}' is declared more than once")]
	DuplicateField {
		field: String,
	},

	#[error("node '{node}' has no field '{field}'")]
	FieldNotFound {
		node: String,
		field: String,
	},

	#[error("field '{field}' has conflicting types {left} and {right}")]
	FieldTypeConflict {
		field: String,
		left: Type,
		right: Type,
	},

	#[error("node '{node}' annotates field '{field}' which it does not have")]
	AnnotationTargetMissing {
		node: String,
		field: String,
	},

	#[error("annotation {annotation} rejected on node '{node}': {reason}")]
	AnnotationRejected {
		node: String,
		field: Option<String>,
		annotation: String,
		reason: String,
	},

	#[error("invalid node '{node}': {reason}")]
	InvalidNode {
		node: String,
		reason: String,
		fields: Vec<String>,
	},

	#[error("node '{node}' of kind {kind} has the wrong number of sources")]
	LeafMismatch {
		node: String,
		kind: &'static str,
	},

	#[error("node '{node}' lists source '{source_node}' more than once")]
	DuplicateSource {
		node: String,
		source_node: String,
	},

	#[error("field '{field}' of node '{node}' has type {actual}, expected {expected}")]
	TypeMismatch {
		node: String,
		field: String,
		expected: Type,
		actual: Type,
	},

	#[error("node '{node}' cannot add field '{field}' because it already exists")]
	FieldAlreadyExists {
		node: String,
		field: String,
	},

	#[error("join '{node}' has branches with differing key lengths {lengths:?}")]
	KeyLengthMismatch {
		node: String,
		lengths: Vec<usize>,
	},

	#[error("plan contains more than one node named '{name}'")]
	DuplicateNodeName {
		name: String,
	},

	#[error("nodes '{first}' and '{second}' hash to the same id {id}")]
	NodeIdCollision {
		id: NodeId,
		first: String,
		second: String,
	},

	#[error("state '{node}' declares invalidations from {source_id} which is not part of the plan")]
	UnknownInvalidationSource {
		node: String,
		source_id: NodeId,
	},

	#[error("state '{node}' invalidation from '{source_node}' references missing field '{field}'")]
	InvalidationFieldNotFound {
		node: String,
		source_node: String,
		field: String,
	},

	#[error("failed to decode plan: {reason}")]
	Decode {
		reason: String,
	},

	#[error("failed to encode plan: {reason}")]
	Encode {
		reason: String,
	},
}

/// Names a node in a diagnostic by name and `nodeid:` id.
pub fn diagnostic_node(name: &str) -> DiagnosticNode {
	DiagnosticNode {
		name: name.to_string(),
		id: NodeId::from_name(name).to_string(),
	}
}

fn diagnostic(
	code: &str,
	message: String,
	node: Option<&str>,
	fields: Vec<String>,
	help: Option<&str>,
) -> Diagnostic {
	Diagnostic {
		code: code.to_string(),
		message,
		node: node.map(diagnostic_node),
		fields,
		label: None,
		help: help.map(str::to_string),
		notes: vec![],
		cause: None,
	}
}

impl IntoDiagnostic for PlanError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		match self {
			PlanError::DuplicateField {
				field,
			} => diagnostic(
				"FIELD_001",
				message,
				None,
				vec![field],
				Some("field names must be unique within a node"),
			),
			PlanError::FieldNotFound {
				node,
				field,
			} => diagnostic("FIELD_002", message, Some(&node), vec![field], None),
			PlanError::FieldTypeConflict {
				field,
				..
			} => diagnostic(
				"FIELD_003",
				message,
				None,
				vec![field],
				Some("fields merged under the same name must have equivalent types"),
			),
			PlanError::AnnotationTargetMissing {
				node,
				field,
			} => diagnostic("ANNOTATION_001", message, Some(&node), vec![field], None),
			PlanError::AnnotationRejected {
				node,
				field,
				..
			} => diagnostic("ANNOTATION_002", message, Some(&node), field.into_iter().collect(), None),
			PlanError::InvalidNode {
				node,
				fields,
				..
			} => diagnostic("NODE_001", message, Some(&node), fields, None),
			PlanError::LeafMismatch {
				node,
				..
			} => diagnostic(
				"NODE_002",
				message,
				Some(&node),
				vec![],
				Some("leaf kinds take no sources, every other kind takes at least one"),
			),
			PlanError::DuplicateSource {
				node,
				..
			} => diagnostic("NODE_003", message, Some(&node), vec![], None),
			PlanError::TypeMismatch {
				node,
				field,
				..
			} => diagnostic("NODE_004", message, Some(&node), vec![field], None),
			PlanError::FieldAlreadyExists {
				node,
				field,
			} => diagnostic(
				"NODE_005",
				message,
				Some(&node),
				vec![field],
				Some("choose an output field name that is not already present on the source"),
			),
			PlanError::KeyLengthMismatch {
				node,
				..
			} => diagnostic(
				"NODE_006",
				message,
				Some(&node),
				vec![],
				Some("every join branch must declare the same number of key fields"),
			),
			PlanError::DuplicateNodeName {
				name,
			} => diagnostic("PLAN_001", message, Some(&name), vec![], None),
			PlanError::NodeIdCollision {
				first,
				..
			} => diagnostic("PLAN_002", message, Some(&first), vec![], Some("rename one of the nodes")),
			PlanError::UnknownInvalidationSource {
				node,
				..
			} => diagnostic("PLAN_003", message, Some(&node), vec![], None),
			PlanError::InvalidationFieldNotFound {
				node,
				field,
				..
			} => diagnostic("PLAN_004", message, Some(&node), vec![field], None),
			PlanError::Decode {
				..
			} => diagnostic("PLAN_005", message, None, vec![], None),
			PlanError::Encode {
				..
			} => diagnostic("PLAN_006", message, None, vec![], None),
		}
	}
}

impl From<PlanError> for Error {
	fn from(err: PlanError) -> Self {
		Error(Box::new(err.into_diagnostic()))
	}
}

/// Attributes an error raised while building a node to that node, unless it
/// already names one.
pub(crate) fn in_node(err: Error, node: &str) -> Error {
	let mut diagnostic = err.diagnostic();
	if diagnostic.node.is_none() {
		diagnostic.node = Some(diagnostic_node(node));
	}
	Error(Box::new(diagnostic))
}
