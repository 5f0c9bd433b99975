// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Per-variant row builders.
//!
//! Every builder returns rows aligned with its node's fields. Tombstones and
//! absent rows flow through single-source nodes untouched apart from being
//! re-tagged; multi-source nodes treat them as no match.

use lattice_plan::{FieldCollection, NodeKind, PNode};
use lattice_type::{Error, Result, Value};

use crate::{
	context::BuildContext,
	error::BuildError,
	key::{FieldKey, Key},
	row::{Lineage, Row},
};

mod cross_join;
mod derived;
mod eval;
mod filter;
mod group;
mod join;
mod lookup_join;
mod passthrough;
mod project;
mod scan;
mod union;
mod unnest;
mod values;

pub(crate) fn build(ctx: &BuildContext, node: &PNode, key: &Key) -> Result<Vec<Row>> {
	match node.kind() {
		NodeKind::Scan {
			schema_table,
			id_fields,
			..
		} => scan::build(ctx, node, schema_table, id_fields, key),
		NodeKind::Values {
			rows,
			index_field,
			..
		} => values::build(ctx, node, rows, index_field.as_deref(), key),
		NodeKind::Filter {
			source,
			predicate,
			linking,
		} => filter::build(ctx, node, source, predicate, *linking, key),
		NodeKind::Project {
			source,
			projection,
		} => project::build(ctx, node, source, projection, key),
		NodeKind::Join {
			branches,
			mode,
		} => join::build(ctx, node, branches, *mode, key),
		NodeKind::CrossJoin {
			sources,
			mode,
		} => cross_join::build(ctx, node, sources, *mode, key),
		NodeKind::LookupJoin {
			source,
			branches,
			..
		} => lookup_join::build(ctx, node, source, branches, key),
		NodeKind::Group {
			source,
			key_fields,
			..
		} => group::build(ctx, node, source, key_fields, key),
		NodeKind::Union {
			sources,
			index_field,
		} => union::build(ctx, node, sources, index_field.as_deref(), key),
		NodeKind::Unnest {
			source,
			list_field,
			unnested_fields,
			index_field,
		} => unnest::build(ctx, node, source, list_field, unnested_fields, index_field.as_deref(), key),
		NodeKind::State {
			source,
			..
		}
		| NodeKind::Output {
			source,
			..
		}
		| NodeKind::Scope {
			source,
		}
		| NodeKind::ScopeExit {
			source,
			..
		} => passthrough::build(ctx, node, source, key),
		NodeKind::Cache {
			source,
		} => passthrough::build_cached(ctx, node, source, key),
		NodeKind::Extract {
			source,
			source_field,
			struct_member,
			output_field,
		} => derived::extract(ctx, node, source, source_field, struct_member, output_field, key),
		NodeKind::Struct {
			source,
			input_fields,
			output_field,
			..
		} => derived::structure(ctx, node, source, input_fields, output_field, key),
		NodeKind::Unify {
			source,
			unified_fields,
			output_field,
		} => derived::unify(ctx, node, source, unified_fields, output_field, key),
		NodeKind::Search {
			..
		} => Err(BuildError::NotImplemented {
			node: node.name().to_string(),
			kind: node.kind_name(),
		}
		.into()),
	}
}

/// Lineage for a row built from `contributing`, per the engine's policy.
pub(super) fn lineage(ctx: &BuildContext, contributing: &[&Row]) -> Lineage {
	ctx.engine().lineage().lineage(contributing)
}

/// The same row, produced by `node`.
pub(super) fn retag(ctx: &BuildContext, node: &PNode, row: &Row) -> Row {
	if row.is_absent() {
		return Row::absent(node.id());
	}
	Row {
		node: node.id(),
		id: row.id.clone(),
		attributes: row.attributes.clone(),
		lineage: lineage(ctx, &[row]),
	}
}

pub(super) fn unroutable(node: &PNode, fields: impl IntoIterator<Item = impl Into<String>>) -> Error {
	BuildError::UnroutableKey {
		node: node.name().to_string(),
		fields: fields.into_iter().map(Into::into).collect(),
	}
	.into()
}

/// Fails with an unroutable key error naming every key field `node` lacks.
pub(super) fn check_known(node: &PNode, key: &FieldKey) -> Result<()> {
	let unknown: Vec<&str> = key.fields().filter(|field| !node.fields().contains(field)).collect();
	if unknown.is_empty() {
		Ok(())
	} else {
		Err(unroutable(node, unknown))
	}
}

/// Splits a field key into the entries `pushed` accepts and the rest.
pub(super) fn split_key(key: &FieldKey, pushed: impl Fn(&str) -> bool) -> (FieldKey, FieldKey) {
	let mut accepted = FieldKey::new();
	let mut rest = FieldKey::new();
	for (field, value) in key.iter() {
		if pushed(field) {
			accepted.insert(field.clone(), value.clone());
		} else {
			rest.insert(field.clone(), value.clone());
		}
	}
	(accepted, rest)
}

/// A field key constraining nothing selects every row.
pub(super) fn key_or_all(key: FieldKey) -> Key {
	if key.is_empty() {
		Key::All
	} else {
		Key::Field(key)
	}
}

/// Whether a live row satisfies every entry of `key`. Rows without
/// attributes always pass so that tombstones keep flowing.
pub(super) fn satisfies(fields: &FieldCollection, row: &Row, key: &FieldKey) -> bool {
	if !row.is_live() {
		return true;
	}
	key.iter().all(|(field, value)| row.get(fields, field) == Some(value))
}

/// Keeps the rows satisfying the residual part of a key that could not be
/// pushed down to a source.
pub(super) fn retain_residual(fields: &FieldCollection, rows: Vec<Row>, residual: &FieldKey) -> Vec<Row> {
	if residual.is_empty() {
		return rows;
	}
	rows.into_iter().filter(|row| satisfies(fields, row, residual)).collect()
}

/// The values of `fields` on a live row, in order.
pub(super) fn values_of(node_fields: &FieldCollection, row: &Row, fields: &[String]) -> Vec<Value> {
	fields.iter().map(|field| row.get(node_fields, field).cloned().unwrap_or(Value::Undefined)).collect()
}

#[cfg(test)]
mod tests {
	use lattice_plan::NodeId;
	use lattice_type::Type;

	use super::*;
	use crate::key::RowId;

	#[test]
	fn test_split_key() {
		let key = FieldKey::new().with("a", 1i64).with("b", 2i64);
		let (pushed, rest) = split_key(&key, |field| field == "a");
		assert_eq!(pushed, FieldKey::single("a", 1i64));
		assert_eq!(rest, FieldKey::single("b", 2i64));
		assert_eq!(key_or_all(FieldKey::new()), Key::All);
	}

	#[test]
	fn test_residual_keeps_tombstones() {
		let fields = FieldCollection::of([("a", Type::Int8)]).unwrap();
		let node = NodeId::from_name("n");
		let rows = vec![
			Row::live(node, RowId::new(vec![1]), vec![Value::int8(1)], Lineage::default()),
			Row::live(node, RowId::new(vec![2]), vec![Value::int8(2)], Lineage::default()),
			Row::tombstone(node, RowId::new(vec![3]), Lineage::default()),
		];
		let kept = retain_residual(&fields, rows, &FieldKey::single("a", 2i64));
		assert_eq!(kept.len(), 2);
		assert_eq!(kept[0].id, Some(RowId::new(vec![2])));
		assert!(kept[1].is_tombstone());
	}
}
