// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_plan::{LookupBranch, PNode};
use lattice_type::{Result, internal_error};
use tracing::{instrument, trace};

use super::{lineage, retag};
use crate::{
	context::BuildContext,
	key::{FieldKey, Key},
	row::Row,
};

/// Keeps a source row only while every branch has a live row agreeing on
/// the branch fields; otherwise the row's id is tombstoned.
#[instrument(name = "engine::build::lookup_join", level = "debug", skip_all, fields(node = node.name(), key = %key))]
pub(super) fn build(
	ctx: &BuildContext,
	node: &PNode,
	source: &PNode,
	branches: &[LookupBranch],
	key: &Key,
) -> Result<Vec<Row>> {
	let rows = ctx.build(source, key)?;
	let mut result = Vec::with_capacity(rows.len());
	for row in rows.iter() {
		let Some(attributes) = &row.attributes else {
			result.push(retag(ctx, node, row));
			continue;
		};
		let Some(id) = &row.id else {
			return Err(internal_error!("live row of '{}' has no id", source.name()).into());
		};

		let mut matched = Vec::new();
		for branch in branches {
			let lookup: FieldKey = branch
				.fields
				.iter()
				.filter_map(|field| row.get(source.fields(), field).map(|value| (field.clone(), value.clone())))
				.collect();
			let branch_rows = ctx.build(&branch.node, &Key::Field(lookup))?;
			match branch_rows.iter().find(|candidate| candidate.is_live()) {
				Some(found) => matched.push(found.clone()),
				None => break,
			}
		}

		let mut contributing = vec![row];
		if matched.len() == branches.len() {
			contributing.extend(matched.iter());
			result.push(Row::live(node.id(), id.clone(), attributes.clone(), lineage(ctx, &contributing)));
		} else {
			trace!(id = %id, "no lookup match, tombstone");
			result.push(Row::tombstone(node.id(), id.clone(), lineage(ctx, &contributing)));
		}
	}
	Ok(result)
}
