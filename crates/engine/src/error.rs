// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_plan::error::diagnostic_node;
use lattice_type::{Diagnostic, Error, IntoDiagnostic};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
	#[error("key fields {} of node '{node}' cannot be routed to any source", fields.join(", "))]
	UnroutableKey {
		node: String,
		fields: Vec<String>,
	},

	#[error("scan '{node}' returned no rows for key {key}")]
	EmptyScan {
		node: String,
		key: String,
	},

	#[error("building {kind} node '{node}' is not implemented")]
	NotImplemented {
		node: String,
		kind: &'static str,
	},

	#[error("no scanner registered for table '{table}' of node '{node}'")]
	ScannerNotFound {
		node: String,
		table: String,
	},

	#[error("function '{function}' used by node '{node}' is not registered")]
	FunctionNotFound {
		node: String,
		function: String,
	},

	#[error("function '{function}' failed in node '{node}': {reason}")]
	FunctionFailed {
		node: String,
		function: String,
		reason: String,
	},

	#[error("row id codec failed: {reason}")]
	Codec {
		reason: String,
	},

	#[error("row of node '{node}' has {actual} attributes, expected {expected}")]
	RowShape {
		node: String,
		expected: usize,
		actual: usize,
	},
}

impl IntoDiagnostic for BuildError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		let (code, node, fields, help) = match self {
			BuildError::UnroutableKey {
				node,
				fields,
			} => ("BUILD_001", Some(node), fields, Some("key fields must belong to the node being built")),
			BuildError::EmptyScan {
				node,
				..
			} => ("BUILD_002", Some(node), vec![], Some("scanners return a not-found row when nothing matches")),
			BuildError::NotImplemented {
				node,
				..
			} => ("BUILD_003", Some(node), vec![], None),
			BuildError::ScannerNotFound {
				node,
				..
			} => ("BUILD_004", Some(node), vec![], None),
			BuildError::FunctionNotFound {
				node,
				..
			} => ("BUILD_005", Some(node), vec![], None),
			BuildError::FunctionFailed {
				node,
				..
			} => ("BUILD_006", Some(node), vec![], None),
			BuildError::Codec {
				..
			} => ("BUILD_007", None, vec![], None),
			BuildError::RowShape {
				node,
				..
			} => ("BUILD_008", Some(node), vec![], None),
		};
		Diagnostic {
			code: code.to_string(),
			message,
			node: node.as_deref().map(diagnostic_node),
			fields,
			label: None,
			help: help.map(str::to_string),
			notes: vec![],
			cause: None,
		}
	}
}

impl From<BuildError> for Error {
	fn from(err: BuildError) -> Self {
		Error(Box::new(err.into_diagnostic()))
	}
}
