// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use indexmap::IndexMap;
use lattice_plan::PNode;
use lattice_type::{Result, Value};
use tracing::{instrument, trace};

use super::{lineage, unroutable, values_of};
use crate::{
	context::BuildContext,
	key::{FieldKey, Key},
	row::Row,
};

/// Groups live source rows by their key values, in order of first
/// appearance. A key naming one whole group that has no live rows left
/// yields a tombstone for that group.
#[instrument(name = "engine::build::group", level = "debug", skip_all, fields(node = node.name(), key = %key))]
pub(super) fn build(
	ctx: &BuildContext,
	node: &PNode,
	source: &PNode,
	key_fields: &[String],
	key: &Key,
) -> Result<Vec<Row>> {
	let (source_key, requested) = match key {
		Key::All => (Key::All, None),
		Key::Field(fields) => {
			let outside: Vec<&str> = fields.fields().filter(|field| !key_fields.iter().any(|k| k == field)).collect();
			if fields.is_empty() || !outside.is_empty() {
				return Err(unroutable(node, outside));
			}
			let complete = key_fields.iter().all(|field| fields.contains_key(field));
			(key.clone(), complete.then(|| fields.clone()))
		}
		Key::Id(id) => {
			let decoded = ctx.engine().codec().decode(id)?;
			let outside: Vec<&str> = decoded.fields().filter(|field| !key_fields.iter().any(|k| k == field)).collect();
			if !outside.is_empty() {
				return Err(unroutable(node, outside));
			}
			(Key::Field(decoded.clone()), Some(decoded))
		}
	};

	let rows = ctx.build(source, &source_key)?;
	let mut groups: IndexMap<Vec<Value>, Vec<&Row>> = IndexMap::new();
	for row in rows.iter().filter(|row| row.is_live()) {
		groups.entry(values_of(source.fields(), row, key_fields)).or_default().push(row);
	}

	let mut result = Vec::with_capacity(groups.len().max(1));
	for (values, members) in &groups {
		let identity: FieldKey = key_fields.iter().cloned().zip(values.iter().cloned()).collect();
		let id = ctx.engine().codec().encode(&identity)?;
		let items =
			members.iter().map(|row| Value::Struct(row.attributes.clone().unwrap_or_default())).collect::<Vec<_>>();
		let mut attributes = values.clone();
		attributes.push(Value::List(items));
		result.push(Row::live(node.id(), id, attributes, lineage(ctx, members)));
	}

	if let Some(requested) = requested {
		if result.is_empty() {
			let id = ctx.engine().codec().encode(&requested)?;
			trace!(id = %id, "group emptied, tombstone");
			let contributing: Vec<&Row> = rows.iter().filter(|row| !row.is_absent()).collect();
			result.push(Row::tombstone(node.id(), id, lineage(ctx, &contributing)));
		}
	}
	Ok(result)
}
