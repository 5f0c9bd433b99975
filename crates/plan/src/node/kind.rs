// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use indexmap::IndexMap;
use lattice_type::{Type, Value};
use serde::{Deserialize, Serialize};

use super::{Invalidations, PNode};
use crate::function::PFunction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinMode {
	Inner,
	Left,
	Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CrossJoinMode {
	Inner,
	Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Linking {
	#[default]
	Linked,
	Unlinked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strictness {
	#[default]
	Strict,
	NonStrict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Denormalization {
	#[default]
	None,
	Input,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Predicate {
	/// A boolean-typed source field.
	Field(String),
	/// A boolean-returning function applied to source fields.
	Function {
		function: PFunction,
		args: Vec<String>,
	},
}

/// How a projected output field obtains its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Input {
	Constant {
		value: Value,
		#[serde(rename = "type")]
		ty: Type,
	},
	Field(String),
	Function {
		function: PFunction,
		args: Vec<Input>,
	},
}

impl Input {
	pub fn constant(value: impl Into<Value>, ty: Type) -> Self {
		Input::Constant {
			value: value.into(),
			ty,
		}
	}

	pub fn field(name: impl Into<String>) -> Self {
		Input::Field(name.into())
	}

	pub fn function(function: PFunction, args: impl IntoIterator<Item = Input>) -> Self {
		Input::Function {
			function,
			args: args.into_iter().collect(),
		}
	}

	/// Every source field referenced, recursively.
	pub fn referenced_fields(&self) -> Vec<&str> {
		match self {
			Input::Constant {
				..
			} => vec![],
			Input::Field(name) => vec![name.as_str()],
			Input::Function {
				args,
				..
			} => args.iter().flat_map(Input::referenced_fields).collect(),
		}
	}
}

/// Output field name to input, in output layout order.
pub type Projection = IndexMap<String, Input>;

#[derive(Debug, Clone)]
pub struct Branch {
	pub node: PNode,
	pub key_fields: Vec<String>,
}

impl Branch {
	pub fn new(node: PNode, key_fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self {
			node,
			key_fields: key_fields.into_iter().map(Into::into).collect(),
		}
	}
}

#[derive(Debug, Clone)]
pub struct LookupBranch {
	pub node: PNode,
	pub fields: Vec<String>,
}

impl LookupBranch {
	pub fn new(node: PNode, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self {
			node,
			fields: fields.into_iter().map(Into::into).collect(),
		}
	}
}

/// The closed set of plan node variants and their declared state.
#[derive(Debug, Clone)]
pub enum NodeKind {
	Scan {
		schema_table: String,
		fields: IndexMap<String, Type>,
		id_fields: Vec<String>,
	},
	Values {
		fields: IndexMap<String, Type>,
		rows: Vec<Vec<Value>>,
		index_field: Option<String>,
		strictness: Strictness,
	},
	Filter {
		source: PNode,
		predicate: Predicate,
		linking: Linking,
	},
	Project {
		source: PNode,
		projection: Projection,
	},
	Join {
		branches: Vec<Branch>,
		mode: JoinMode,
	},
	CrossJoin {
		sources: Vec<PNode>,
		mode: CrossJoinMode,
	},
	LookupJoin {
		source: PNode,
		source_key_fields: Vec<String>,
		branches: Vec<LookupBranch>,
	},
	Group {
		source: PNode,
		key_fields: Vec<String>,
		list_field: String,
	},
	Union {
		sources: Vec<PNode>,
		index_field: Option<String>,
	},
	Unnest {
		source: PNode,
		list_field: String,
		unnested_fields: IndexMap<String, Type>,
		index_field: Option<String>,
	},
	State {
		source: PNode,
		denormalization: Denormalization,
		invalidations: Invalidations,
		id_fields: Option<Vec<Vec<String>>>,
	},
	Cache {
		source: PNode,
	},
	Output {
		source: PNode,
		targets: Vec<String>,
	},
	Extract {
		source: PNode,
		source_field: String,
		struct_member: String,
		output_field: String,
	},
	Struct {
		source: PNode,
		ty: Type,
		input_fields: Vec<String>,
		output_field: String,
	},
	Unify {
		source: PNode,
		unified_fields: Vec<String>,
		output_field: String,
	},
	Search {
		source: PNode,
		search: String,
		output_field: String,
		output_type: Type,
	},
	Scope {
		source: PNode,
	},
	ScopeExit {
		source: PNode,
		scope: String,
	},
}

impl NodeKind {
	/// Single-key grouping into a list field.
	pub fn group_by(source: PNode, key_field: impl Into<String>, list_field: impl Into<String>) -> Self {
		NodeKind::Group {
			source,
			key_fields: vec![key_field.into()],
			list_field: list_field.into(),
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			NodeKind::Scan {
				..
			} => "scan",
			NodeKind::Values {
				..
			} => "values",
			NodeKind::Filter {
				..
			} => "filter",
			NodeKind::Project {
				..
			} => "project",
			NodeKind::Join {
				..
			} => "join",
			NodeKind::CrossJoin {
				..
			} => "crossJoin",
			NodeKind::LookupJoin {
				..
			} => "lookupJoin",
			NodeKind::Group {
				..
			} => "group",
			NodeKind::Union {
				..
			} => "union",
			NodeKind::Unnest {
				..
			} => "unnest",
			NodeKind::State {
				..
			} => "state",
			NodeKind::Cache {
				..
			} => "cache",
			NodeKind::Output {
				..
			} => "output",
			NodeKind::Extract {
				..
			} => "extract",
			NodeKind::Struct {
				..
			} => "struct",
			NodeKind::Unify {
				..
			} => "unify",
			NodeKind::Search {
				..
			} => "search",
			NodeKind::Scope {
				..
			} => "scope",
			NodeKind::ScopeExit {
				..
			} => "scopeExit",
		}
	}

	pub fn is_leaf_kind(&self) -> bool {
		matches!(
			self,
			NodeKind::Scan {
				..
			} | NodeKind::Values {
				..
			}
		)
	}

	/// Sources in declaration order.
	pub fn sources(&self) -> Vec<PNode> {
		match self {
			NodeKind::Scan {
				..
			}
			| NodeKind::Values {
				..
			} => vec![],
			NodeKind::Join {
				branches,
				..
			} => branches.iter().map(|b| b.node.clone()).collect(),
			NodeKind::CrossJoin {
				sources,
				..
			}
			| NodeKind::Union {
				sources,
				..
			} => sources.clone(),
			NodeKind::LookupJoin {
				source,
				branches,
				..
			} => std::iter::once(source.clone()).chain(branches.iter().map(|b| b.node.clone())).collect(),
			NodeKind::Filter {
				source,
				..
			}
			| NodeKind::Project {
				source,
				..
			}
			| NodeKind::Group {
				source,
				..
			}
			| NodeKind::Unnest {
				source,
				..
			}
			| NodeKind::State {
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
			| NodeKind::Unify {
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
			} => vec![source.clone()],
		}
	}
}
