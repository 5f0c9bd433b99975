// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_plan::PNode;
use lattice_type::{Result, Value};
use tracing::{debug, instrument};

use super::{check_known, key_or_all, lineage};
use crate::{
	context::BuildContext,
	error::BuildError,
	key::{FieldKey, Key, RowId},
	row::Row,
};

/// Name the source position is encoded under in union and unnest ids when
/// the node declares no index field.
pub(super) const DEFAULT_INDEX: &str = "index";

#[instrument(name = "engine::build::union", level = "debug", skip_all, fields(node = node.name(), key = %key))]
pub(super) fn build(
	ctx: &BuildContext,
	node: &PNode,
	sources: &[PNode],
	index_field: Option<&str>,
	key: &Key,
) -> Result<Vec<Row>> {
	let index_name = index_field.unwrap_or(DEFAULT_INDEX);

	let routes: Vec<(usize, Key)> = match key {
		Key::All => (0..sources.len()).map(|idx| (idx, Key::All)).collect(),
		Key::Field(fields) => {
			check_known(node, fields)?;
			let mut rest = fields.clone().into_inner();
			match index_field.and_then(|index| rest.remove(index)) {
				Some(index) => {
					let Some(idx) = position(&index, sources.len()) else {
						return Ok(vec![]);
					};
					debug!(source = sources[idx].name(), "routed by index");
					vec![(idx, key_or_all(rest.into_iter().collect()))]
				}
				None => {
					let rest = key_or_all(rest.into_iter().collect());
					(0..sources.len()).map(|idx| (idx, rest.clone())).collect()
				}
			}
		}
		Key::Id(id) => {
			let (idx, source_id) = split(ctx, id, index_name, sources.len())?;
			vec![(idx, Key::Id(source_id))]
		}
	};

	let mut result = Vec::new();
	for (idx, source_key) in routes {
		let source = &sources[idx];
		let tag = ctx.engine().codec().encode(&FieldKey::single(index_name, idx as i64))?;
		for row in ctx.build(source, &source_key)?.iter() {
			let Some(source_id) = &row.id else {
				result.push(Row::absent(node.id()));
				continue;
			};
			let id = ctx.engine().codec().join(&[Some(tag.clone()), Some(source_id.clone())])?;
			let lineage = lineage(ctx, &[row]);
			match &row.attributes {
				Some(_) => {
					let mut attributes: Vec<Value> = node
						.fields()
						.names()
						.filter(|name| Some(*name) != index_field)
						.map(|name| row.get(source.fields(), name).cloned().unwrap_or(Value::Undefined))
						.collect();
					if index_field.is_some() {
						attributes.push(Value::int8(idx as i64));
					}
					result.push(Row::live(node.id(), id, attributes, lineage));
				}
				None => result.push(Row::tombstone(node.id(), id, lineage)),
			}
		}
	}
	Ok(result)
}

fn position(value: &Value, len: usize) -> Option<usize> {
	value.as_int8().and_then(|idx| usize::try_from(idx).ok()).filter(|idx| *idx < len)
}

/// Splits a union row id into the source position and the source row id.
fn split(ctx: &BuildContext, id: &RowId, index_name: &str, len: usize) -> Result<(usize, RowId)> {
	let components = ctx.engine().codec().split(id)?;
	let [Some(tag), Some(source_id)] = components.as_slice() else {
		return Err(malformed(id));
	};
	let tag = ctx.engine().codec().decode(tag)?;
	let Some(idx) = tag.get(index_name).and_then(|value| position(value, len)) else {
		return Err(malformed(id));
	};
	Ok((idx, source_id.clone()))
}

fn malformed(id: &RowId) -> lattice_type::Error {
	BuildError::Codec {
		reason: format!("id {} is not a union row id", id),
	}
	.into()
}
