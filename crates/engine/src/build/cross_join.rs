// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_plan::{CrossJoinMode, PNode, util::cartesian};
use lattice_type::Result;
use tracing::instrument;

use super::{
	join::{by_id, combine, tombstone},
	key_or_all, unroutable,
};
use crate::{
	context::BuildContext,
	key::{FieldKey, Key},
	row::Row,
};

#[instrument(name = "engine::build::cross_join", level = "debug", skip_all, fields(node = node.name(), key = %key))]
pub(super) fn build(
	ctx: &BuildContext,
	node: &PNode,
	sources: &[PNode],
	mode: CrossJoinMode,
	key: &Key,
) -> Result<Vec<Row>> {
	let sources: Vec<&PNode> = sources.iter().collect();

	let constraints = match key {
		Key::Id(id) => {
			return match by_id(ctx, &sources, id)? {
				Some(slots) => Ok(vec![combine(ctx, node, &sources, &slots)?]),
				None => Ok(vec![tombstone(node, id)]),
			};
		}
		Key::All => vec![FieldKey::new(); sources.len()],
		Key::Field(fields) => {
			let mut constraints = vec![FieldKey::new(); sources.len()];
			let mut unknown = Vec::new();
			for (field, value) in fields.iter() {
				match sources.iter().position(|source| source.fields().contains(field)) {
					Some(idx) => {
						constraints[idx].insert(field.clone(), value.clone());
					}
					None => unknown.push(field.clone()),
				}
			}
			if !unknown.is_empty() {
				return Err(unroutable(node, unknown));
			}
			constraints
		}
	};

	let mut lists: Vec<Vec<Option<Row>>> = Vec::with_capacity(sources.len());
	for (source, constraint) in sources.iter().zip(constraints) {
		let constrained = !constraint.is_empty();
		let live: Vec<Option<Row>> =
			ctx.build(source, &key_or_all(constraint))?.iter().filter(|row| row.is_live()).cloned().map(Some).collect();
		if !live.is_empty() {
			lists.push(live);
		} else if mode == CrossJoinMode::Full && !constrained {
			lists.push(vec![None]);
		} else {
			return Ok(vec![]);
		}
	}

	cartesian(&lists)
		.iter()
		.filter(|slots| slots.iter().any(Option::is_some))
		.map(|slots| combine(ctx, node, &sources, slots))
		.collect()
}
