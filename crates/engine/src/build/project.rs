// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_plan::{PNode, Projection};
use lattice_type::{Result, internal_error};
use tracing::{instrument, trace};

use super::{check_known, eval::evaluate, key_or_all, lineage, retag, retain_residual};
use crate::{
	context::BuildContext,
	key::{FieldKey, Key},
	row::Row,
};

/// Output fields copying a source field are pushed down as source-field
/// equalities; the computed ones are checked after evaluation.
#[instrument(name = "engine::build::project", level = "debug", skip_all, fields(node = node.name(), key = %key))]
pub(super) fn build(
	ctx: &BuildContext,
	node: &PNode,
	source: &PNode,
	projection: &Projection,
	key: &Key,
) -> Result<Vec<Row>> {
	let Some(layout) = node.projection_layout() else {
		return Err(internal_error!("project '{}' has no projection layout", node.name()).into());
	};

	let (source_key, residual) = match key {
		Key::Field(fields) => {
			check_known(node, fields)?;
			let mut pushed = FieldKey::new();
			let mut residual = FieldKey::new();
			for (output, value) in fields.iter() {
				match layout.input_field(output) {
					Some(input) => {
						if let Some(existing) = pushed.get(input) {
							if existing != value {
								trace!(input, "conflicting aliases, no rows");
								return Ok(vec![]);
							}
						}
						pushed.insert(input, value.clone());
					}
					None => {
						residual.insert(output.clone(), value.clone());
					}
				}
			}
			(key_or_all(pushed), residual)
		}
		other => (other.clone(), FieldKey::new()),
	};

	let rows = ctx.build(source, &source_key)?;
	let mut result = Vec::with_capacity(rows.len());
	for row in rows.iter() {
		let (Some(id), Some(attributes)) = (&row.id, &row.attributes) else {
			result.push(retag(ctx, node, row));
			continue;
		};
		let values = projection
			.values()
			.map(|input| evaluate(ctx, node, source.fields(), attributes, input))
			.collect::<Result<Vec<_>>>()?;
		result.push(Row::live(node.id(), id.clone(), values, lineage(ctx, &[row])));
	}
	Ok(retain_residual(node.fields(), result, &residual))
}
