// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use indexmap::IndexMap;
use lattice_plan::PNode;
use lattice_type::{Result, Type, Value};
use tracing::{instrument, trace};

use super::{check_known, key_or_all, lineage, retain_residual, split_key, union::DEFAULT_INDEX};
use crate::{
	context::BuildContext,
	error::BuildError,
	key::{FieldKey, Key, RowId},
	row::Row,
};

/// Expands every live source row into one row per element of its list.
/// Source rows without attributes expand to nothing, except under an id key
/// where the requested element is tombstoned.
#[instrument(name = "engine::build::unnest", level = "debug", skip_all, fields(node = node.name(), key = %key))]
pub(super) fn build(
	ctx: &BuildContext,
	node: &PNode,
	source: &PNode,
	list_field: &str,
	unnested_fields: &IndexMap<String, Type>,
	index_field: Option<&str>,
	key: &Key,
) -> Result<Vec<Row>> {
	let index_name = index_field.unwrap_or(DEFAULT_INDEX);
	let members = member_positions(source, list_field, unnested_fields);

	match key {
		Key::Id(id) => {
			let (source_id, position) = split(ctx, id, index_name)?;
			let rows = ctx.build(source, &Key::Id(source_id))?;
			for row in rows.iter().filter(|row| row.is_live()) {
				let mut expanded = expand(ctx, node, source, row, list_field, &members, index_field, index_name)?;
				if position < expanded.len() {
					return Ok(vec![expanded.swap_remove(position)]);
				}
			}
			trace!(id = %id, "element gone, tombstone");
			Ok(vec![Row::tombstone(node.id(), id.clone(), Default::default())])
		}
		Key::All => {
			let rows = ctx.build(source, &Key::All)?;
			let mut result = Vec::new();
			for row in rows.iter().filter(|row| row.is_live()) {
				result.extend(expand(ctx, node, source, row, list_field, &members, index_field, index_name)?);
			}
			Ok(result)
		}
		Key::Field(fields) => {
			check_known(node, fields)?;
			let (pushed, residual) = split_key(fields, |field| source.fields().contains(field));
			let rows = ctx.build(source, &key_or_all(pushed))?;
			let mut result = Vec::new();
			for row in rows.iter().filter(|row| row.is_live()) {
				result.extend(expand(ctx, node, source, row, list_field, &members, index_field, index_name)?);
			}
			Ok(retain_residual(node.fields(), result, &residual))
		}
	}
}

/// For each unnested field, its position among the struct members of the
/// list elements; `None` for a list of scalars.
fn member_positions(source: &PNode, list_field: &str, unnested_fields: &IndexMap<String, Type>) -> Vec<Option<usize>> {
	let element = source.fields().ty(list_field).and_then(Type::as_list).and_then(Type::as_struct);
	unnested_fields.keys().map(|field| element.and_then(|st| st.position(field))).collect()
}

#[allow(clippy::too_many_arguments)]
fn expand(
	ctx: &BuildContext,
	node: &PNode,
	source: &PNode,
	row: &Row,
	list_field: &str,
	members: &[Option<usize>],
	index_field: Option<&str>,
	index_name: &str,
) -> Result<Vec<Row>> {
	let (Some(source_id), Some(attributes)) = (&row.id, &row.attributes) else {
		return Ok(vec![]);
	};
	let Some(Value::List(elements)) = row.get(source.fields(), list_field) else {
		return Ok(vec![]);
	};

	let lineage = lineage(ctx, &[row]);
	let mut result = Vec::with_capacity(elements.len());
	for (idx, element) in elements.iter().enumerate() {
		let mut values = attributes.clone();
		if index_field.is_some() {
			values.push(Value::int8(idx as i64));
		}
		for member in members {
			let value = match (member, element) {
				(Some(position), Value::Struct(fields)) => fields.get(*position).cloned().unwrap_or(Value::Undefined),
				(Some(_), _) => Value::Undefined,
				(None, scalar) => scalar.clone(),
			};
			values.push(value);
		}
		let tag = ctx.engine().codec().encode(&FieldKey::single(index_name, idx as i64))?;
		let id = ctx.engine().codec().join(&[Some(source_id.clone()), Some(tag)])?;
		result.push(Row::live(node.id(), id, values, lineage.clone()));
	}
	Ok(result)
}

/// Splits an unnested row id into the source row id and the element position.
fn split(ctx: &BuildContext, id: &RowId, index_name: &str) -> Result<(RowId, usize)> {
	let components = ctx.engine().codec().split(id)?;
	let [Some(source_id), Some(tag)] = components.as_slice() else {
		return Err(malformed(id));
	};
	let tag = ctx.engine().codec().decode(tag)?;
	let Some(position) = tag.get(index_name).and_then(Value::as_int8).and_then(|idx| usize::try_from(idx).ok()) else {
		return Err(malformed(id));
	};
	Ok((source_id.clone(), position))
}

fn malformed(id: &RowId) -> lattice_type::Error {
	BuildError::Codec {
		reason: format!("id {} is not an unnested row id", id),
	}
	.into()
}
