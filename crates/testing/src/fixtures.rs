// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Builders for the small plans used across the test suites.
//!
//! Every builder returns `Result` so tests can use `?` and see the full
//! diagnostic when a fixture turns out to be malformed.

use indexmap::IndexMap;
use lattice_plan::{
	Branch, Denormalization, Input, Invalidations, JoinMode, Linking, NodeKind, PNode, Predicate, Strictness,
};
use lattice_type::{Result, Type, Value};

pub fn fields(fields: &[(&str, Type)]) -> IndexMap<String, Type> {
	fields.iter().map(|(name, ty)| (name.to_string(), ty.clone())).collect()
}

pub fn names(names: &[&str]) -> Vec<String> {
	names.iter().map(|name| name.to_string()).collect()
}

pub fn scan(name: &str, table: &str, declared: &[(&str, Type)], id_fields: &[&str]) -> Result<PNode> {
	PNode::of(
		name,
		NodeKind::Scan {
			schema_table: table.to_string(),
			fields: fields(declared),
			id_fields: names(id_fields),
		},
	)
}

pub fn values(name: &str, declared: &[(&str, Type)], rows: Vec<Vec<Value>>, index_field: Option<&str>) -> Result<PNode> {
	PNode::of(
		name,
		NodeKind::Values {
			fields: fields(declared),
			rows,
			index_field: index_field.map(str::to_string),
			strictness: Strictness::Strict,
		},
	)
}

pub fn filter(name: &str, source: &PNode, predicate: Predicate) -> Result<PNode> {
	PNode::of(
		name,
		NodeKind::Filter {
			source: source.clone(),
			predicate,
			linking: Linking::Linked,
		},
	)
}

pub fn project<'a>(name: &str, source: &PNode, projection: impl IntoIterator<Item = (&'a str, Input)>) -> Result<PNode> {
	PNode::of(
		name,
		NodeKind::Project {
			source: source.clone(),
			projection: projection.into_iter().map(|(output, input)| (output.to_string(), input)).collect(),
		},
	)
}

pub fn join(name: &str, mode: JoinMode, branches: Vec<Branch>) -> Result<PNode> {
	PNode::of(
		name,
		NodeKind::Join {
			branches,
			mode,
		},
	)
}

pub fn group(name: &str, source: &PNode, key_field: &str, list_field: &str) -> Result<PNode> {
	PNode::of(name, NodeKind::group_by(source.clone(), key_field, list_field))
}

pub fn union(name: &str, sources: &[&PNode], index_field: Option<&str>) -> Result<PNode> {
	PNode::of(
		name,
		NodeKind::Union {
			sources: sources.iter().map(|s| (*s).clone()).collect(),
			index_field: index_field.map(str::to_string),
		},
	)
}

pub fn state(name: &str, source: &PNode) -> Result<PNode> {
	PNode::of(
		name,
		NodeKind::State {
			source: source.clone(),
			denormalization: Denormalization::None,
			invalidations: Invalidations::new(),
			id_fields: None,
		},
	)
}

pub fn output(name: &str, source: &PNode, targets: &[&str]) -> Result<PNode> {
	PNode::of(
		name,
		NodeKind::Output {
			source: source.clone(),
			targets: names(targets),
		},
	)
}

/// `people {id: Int8 @id, name: Utf8}` scanning table `people`.
pub fn people() -> Result<PNode> {
	scan("people", "people", &[("id", Type::Int8), ("name", Type::Utf8)], &["id"])
}

/// `orders {oid: Int8 @id, bid: Int8, amount: Int8}` scanning table `orders`.
pub fn orders() -> Result<PNode> {
	scan("orders", "orders", &[("oid", Type::Int8), ("bid", Type::Int8), ("amount", Type::Int8)], &["oid"])
}

/// `items {k: Int8 @id, v: Utf8}` scanning table `items`.
pub fn items() -> Result<PNode> {
	scan("items", "items", &[("k", Type::Int8), ("v", Type::Utf8)], &["k"])
}

/// Inner join of [`people`] and [`orders`] on `id = bid`.
pub fn people_orders() -> Result<PNode> {
	join(
		"people_orders",
		JoinMode::Inner,
		vec![Branch::new(people()?, ["id"]), Branch::new(orders()?, ["bid"])],
	)
}
