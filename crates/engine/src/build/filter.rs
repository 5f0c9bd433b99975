// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_plan::{Linking, PNode, Predicate};
use lattice_type::{Result, Value, internal_error};
use tracing::{instrument, trace};

use super::{
	eval::{invoke, resolve},
	lineage, retag,
};
use crate::{
	context::BuildContext,
	function::Function,
	key::Key,
	row::{Lineage, Row},
};

/// Source rows failing the predicate become tombstones carrying the same id,
/// never disappear.
#[instrument(name = "engine::build::filter", level = "debug", skip_all, fields(node = node.name(), key = %key))]
pub(super) fn build(
	ctx: &BuildContext,
	node: &PNode,
	source: &PNode,
	predicate: &Predicate,
	linking: Linking,
	key: &Key,
) -> Result<Vec<Row>> {
	let rows = ctx.build(source, key)?;
	let resolved = match predicate {
		Predicate::Function {
			function,
			..
		} => Some(resolve(ctx, node, function)?),
		Predicate::Field(_) => None,
	};

	let mut result = Vec::with_capacity(rows.len());
	for row in rows.iter() {
		let Some(attributes) = &row.attributes else {
			result.push(retag(ctx, node, row));
			continue;
		};
		let Some(id) = row.id.clone() else {
			return Err(internal_error!("live row of '{}' has no id", source.name()).into());
		};

		let lineage = match linking {
			Linking::Linked => lineage(ctx, &[row]),
			Linking::Unlinked => Lineage::default(),
		};

		if passes(node, source, predicate, resolved.as_ref(), attributes)? {
			result.push(Row::live(node.id(), id, attributes.clone(), lineage));
		} else {
			trace!(id = %id, "tombstone");
			result.push(Row::tombstone(node.id(), id, lineage));
		}
	}
	Ok(result)
}

/// Undefined predicate results count as false.
fn passes(
	node: &PNode,
	source: &PNode,
	predicate: &Predicate,
	resolved: Option<&Function>,
	attributes: &[Value],
) -> Result<bool> {
	let value = match (predicate, resolved) {
		(Predicate::Field(field), _) => source
			.fields()
			.position(field)
			.and_then(|position| attributes.get(position))
			.cloned()
			.unwrap_or(Value::Undefined),
		(
			Predicate::Function {
				function,
				args,
			},
			Some(resolved),
		) => {
			let args: Vec<Value> = args
				.iter()
				.map(|arg| {
					source.fields()
						.position(arg)
						.and_then(|position| attributes.get(position))
						.cloned()
						.unwrap_or(Value::Undefined)
				})
				.collect();
			invoke(node, function, resolved, source.fields(), attributes, &args)?
		}
		(
			Predicate::Function {
				function,
				..
			},
			None,
		) => return Err(internal_error!("predicate function '{}' was not resolved", function.name).into()),
	};
	Ok(value.as_bool() == Some(true))
}
