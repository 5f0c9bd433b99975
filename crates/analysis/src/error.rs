// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_plan::error::diagnostic_node;
use lattice_type::{Diagnostic, Error, IntoDiagnostic};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
	#[error("node '{node}' has fields without originations: {}", fields.join(", "))]
	MissingOriginations {
		node: String,
		fields: Vec<String>,
	},

	#[error("field '{node}.{field}' has a leaf origination alongside {count} others")]
	LeafNotExclusive {
		node: String,
		field: String,
		count: usize,
	},

	#[error("origination of '{sink}' reads '{origin}' which does not precede it")]
	ToposortViolation {
		node: String,
		sink: String,
		origin: String,
	},

	#[error("origination '{sink}' <- '{origin}' is recorded twice")]
	DuplicateOrigination {
		node: String,
		sink: String,
		origin: String,
	},

	#[error("{kind} node '{node}' is not supported by lineage analysis")]
	UnsupportedNode {
		node: String,
		kind: &'static str,
	},
}

impl IntoDiagnostic for AnalysisError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		let (code, node, fields, help) = match self {
			AnalysisError::MissingOriginations {
				node,
				fields,
			} => ("ANALYSIS_001", node, fields, None),
			AnalysisError::LeafNotExclusive {
				node,
				field,
				..
			} => (
				"ANALYSIS_002",
				node,
				vec![field],
				Some("a scanned or generated field cannot also be derived from a source"),
			),
			AnalysisError::ToposortViolation {
				node,
				..
			} => ("ANALYSIS_003", node, vec![], None),
			AnalysisError::DuplicateOrigination {
				node,
				..
			} => ("ANALYSIS_004", node, vec![], None),
			AnalysisError::UnsupportedNode {
				node,
				..
			} => ("ANALYSIS_005", node, vec![], Some("scope, scope exit and search nodes carry no lineage rules")),
		};
		Diagnostic {
			code: code.to_string(),
			message,
			node: Some(diagnostic_node(&node)),
			fields,
			label: None,
			help: help.map(str::to_string),
			notes: vec![],
			cause: None,
		}
	}
}

impl From<AnalysisError> for Error {
	fn from(err: AnalysisError) -> Self {
		Error(Box::new(err.into_diagnostic()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_missing_originations_lists_fields() {
		let diagnostic = AnalysisError::MissingOriginations {
			node: "n".to_string(),
			fields: vec!["a".to_string(), "b".to_string()],
		}
		.into_diagnostic();
		assert_eq!(diagnostic.code, "ANALYSIS_001");
		assert_eq!(diagnostic.message, "node 'n' has fields without originations: a, b");
		assert_eq!(diagnostic.fields, vec!["a".to_string(), "b".to_string()]);
		assert_eq!(diagnostic.node.unwrap().name, "n");
	}

	#[test]
	fn test_unsupported_node_code() {
		let err: Error = AnalysisError::UnsupportedNode {
			node: "s".to_string(),
			kind: "search",
		}
		.into();
		assert_eq!(err.code(), "ANALYSIS_005");
		assert_eq!(
			err.to_string().lines().next(),
			Some("[ANALYSIS_005] search node 's' is not supported by lineage analysis")
		);
	}
}
