// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_plan::{Branch, JoinMode, PNode, util::cartesian};
use lattice_type::{Result, Value, internal_error};
use tracing::{debug, instrument, trace};

use super::{key_or_all, lineage, unroutable, values_of};
use crate::{
	context::BuildContext,
	error::BuildError,
	key::{FieldKey, Key, RowId},
	row::Row,
};

/// One candidate output row: a live row per branch, or `None` for an
/// outer-join null.
pub(super) type Slots = Vec<Option<Row>>;

/// Equi-join.
///
/// A field key is routed to the branches owning its fields. The first keyed
/// branch is built with its share of the key; every other branch is then
/// looked up by the join key values of each resulting row, together with its
/// own share of the key if it has one.
#[instrument(name = "engine::build::join", level = "debug", skip_all, fields(node = node.name(), key = %key))]
pub(super) fn build(ctx: &BuildContext, node: &PNode, branches: &[Branch], mode: JoinMode, key: &Key) -> Result<Vec<Row>> {
	let combinations = match key {
		Key::All => by_all(ctx, branches, mode)?,
		Key::Field(fields) => by_fields(ctx, node, branches, mode, fields)?,
		Key::Id(id) => {
			let sources: Vec<&PNode> = branches.iter().map(|b| &b.node).collect();
			let Some(slots) = by_id(ctx, &sources, id)? else {
				return Ok(vec![tombstone(node, id)]);
			};
			if !keys_agree(branches, &slots) {
				trace!(id = %id, "join keys diverged, tombstone");
				return Ok(vec![tombstone(node, id)]);
			}
			vec![slots]
		}
	};

	let sources: Vec<&PNode> = branches.iter().map(|b| &b.node).collect();
	combinations.iter().map(|slots| combine(ctx, node, &sources, slots)).collect()
}

fn nullable(mode: JoinMode, idx: usize) -> bool {
	match mode {
		JoinMode::Inner => false,
		JoinMode::Left => idx != 0,
		JoinMode::Full => true,
	}
}

fn by_all(ctx: &BuildContext, branches: &[Branch], mode: JoinMode) -> Result<Vec<Slots>> {
	let constraints = vec![FieldKey::new(); branches.len()];
	let starts = match mode {
		JoinMode::Full => branches.len(),
		JoinMode::Inner | JoinMode::Left => branches.len().min(1),
	};

	let mut result = Vec::new();
	for start in 0..starts {
		let rows = ctx.build(&branches[start].node, &Key::All)?;
		for slots in expand(ctx, branches, mode, start, &rows, &constraints)? {
			// reached from an earlier branch already
			if slots[..start].iter().any(Option::is_some) {
				continue;
			}
			result.push(slots);
		}
	}
	Ok(result)
}

fn by_fields(
	ctx: &BuildContext,
	node: &PNode,
	branches: &[Branch],
	mode: JoinMode,
	fields: &FieldKey,
) -> Result<Vec<Slots>> {
	let Some(layout) = node.join_layout() else {
		return Err(internal_error!("join '{}' has no join layout", node.name()).into());
	};

	let mut constraints = vec![FieldKey::new(); branches.len()];
	let mut unknown = Vec::new();
	for (field, value) in fields.iter() {
		match layout.branch_index_of_field(field) {
			Some(idx) => {
				constraints[idx].insert(field.clone(), value.clone());
			}
			None => unknown.push(field.clone()),
		}
	}
	if !unknown.is_empty() {
		return Err(unroutable(node, unknown));
	}

	let Some(start) = constraints.iter().position(|constraint| !constraint.is_empty()) else {
		return by_all(ctx, branches, mode);
	};
	debug!(branch = branches[start].node.name(), "lookup branch");
	let rows = ctx.build(&branches[start].node, &Key::Field(constraints[start].clone()))?;
	expand(ctx, branches, mode, start, &rows, &constraints)
}

/// Joins every live row of branch `start` with the matching rows of all
/// other branches.
fn expand(
	ctx: &BuildContext,
	branches: &[Branch],
	mode: JoinMode,
	start: usize,
	rows: &[Row],
	constraints: &[FieldKey],
) -> Result<Vec<Slots>> {
	let mut result = Vec::new();
	'rows: for row in rows.iter().filter(|row| row.is_live()) {
		let key_values = values_of(branches[start].node.fields(), row, &branches[start].key_fields);

		let mut lists: Vec<Vec<Option<Row>>> = Vec::with_capacity(branches.len());
		for (idx, branch) in branches.iter().enumerate() {
			if idx == start {
				lists.push(vec![Some(row.clone())]);
				continue;
			}
			let matches: Vec<Option<Row>> = match lookup_key(branch, &key_values, &constraints[idx]) {
				Some(key) => ctx.build(&branch.node, &key)?.iter().filter(|r| r.is_live()).cloned().map(Some).collect(),
				None => vec![],
			};
			if !matches.is_empty() {
				lists.push(matches);
			} else if constraints[idx].is_empty() && nullable(mode, idx) {
				lists.push(vec![None]);
			} else {
				continue 'rows;
			}
		}
		result.extend(cartesian(&lists));
	}
	Ok(result)
}

/// The key selecting the rows of `branch` that join with `key_values`, or
/// `None` when it contradicts the branch's share of the requested key.
fn lookup_key(branch: &Branch, key_values: &[Value], constraint: &FieldKey) -> Option<Key> {
	let mut key = constraint.clone();
	for (field, value) in branch.key_fields.iter().zip(key_values) {
		if key.get(field).is_some_and(|existing| existing != value) {
			return None;
		}
		key.insert(field.clone(), value.clone());
	}
	Some(key_or_all(key))
}

fn keys_agree(branches: &[Branch], slots: &Slots) -> bool {
	let present: Vec<Vec<Value>> = branches
		.iter()
		.zip(slots)
		.filter_map(|(branch, slot)| slot.as_ref().map(|row| values_of(branch.node.fields(), row, &branch.key_fields)))
		.collect();
	present.windows(2).all(|pair| pair[0] == pair[1])
}

/// Resolves a composite id into one live row per present component. `None`
/// when a component no longer has a live row.
pub(super) fn by_id(ctx: &BuildContext, sources: &[&PNode], id: &RowId) -> Result<Option<Slots>> {
	let components = ctx.engine().codec().split(id)?;
	if components.len() != sources.len() {
		return Err(BuildError::Codec {
			reason: format!("id {} has {} components, expected {}", id, components.len(), sources.len()),
		}
		.into());
	}
	if components.iter().all(Option::is_none) {
		return Ok(None);
	}

	let mut slots = Vec::with_capacity(sources.len());
	for (source, component) in sources.iter().zip(components) {
		match component {
			None => slots.push(None),
			Some(component) => {
				let rows = ctx.build(source, &Key::Id(component))?;
				match rows.iter().find(|row| row.is_live()) {
					Some(row) => slots.push(Some(row.clone())),
					None => return Ok(None),
				}
			}
		}
	}
	Ok(Some(slots))
}

pub(super) fn tombstone(node: &PNode, id: &RowId) -> Row {
	trace!(id = %id, "tombstone");
	Row::tombstone(node.id(), id.clone(), Default::default())
}

/// Concatenates the slot attributes in source order, nulls filled with
/// undefined values, under the composite id of the slot ids.
pub(super) fn combine(ctx: &BuildContext, node: &PNode, sources: &[&PNode], slots: &[Option<Row>]) -> Result<Row> {
	let mut attributes = Vec::with_capacity(node.fields().len());
	let mut ids = Vec::with_capacity(slots.len());
	for (source, slot) in sources.iter().zip(slots) {
		match slot {
			Some(row) => {
				attributes.extend(row.attributes.iter().flatten().cloned());
				ids.push(row.id.clone());
			}
			None => {
				attributes.extend(std::iter::repeat_n(Value::Undefined, source.fields().len()));
				ids.push(None);
			}
		}
	}
	let contributing: Vec<&Row> = slots.iter().flatten().collect();
	let id = ctx.engine().codec().join(&ids)?;
	Ok(Row::live(node.id(), id, attributes, lineage(ctx, &contributing)))
}
