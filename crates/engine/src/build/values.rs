// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_plan::PNode;
use lattice_type::{Result, Value};
use tracing::instrument;

use super::{check_known, satisfies};
use crate::{
	context::BuildContext,
	key::{FieldKey, Key},
	row::{Lineage, Row},
};

#[instrument(name = "engine::build::values", level = "debug", skip_all, fields(node = node.name(), key = %key))]
pub(super) fn build(
	ctx: &BuildContext,
	node: &PNode,
	literals: &[Vec<Value>],
	index_field: Option<&str>,
	key: &Key,
) -> Result<Vec<Row>> {
	if let Key::Field(fields) = key {
		check_known(node, fields)?;
	}

	let mut rows = Vec::new();
	for (idx, literal) in literals.iter().enumerate() {
		let mut attributes = literal.clone();
		let identity: FieldKey = match index_field {
			Some(index_field) => {
				attributes.push(Value::int8(idx as i64));
				FieldKey::single(index_field, idx as i64)
			}
			None => node.fields().names().map(str::to_string).zip(literal.iter().cloned()).collect(),
		};
		let id = ctx.engine().codec().encode(&identity)?;
		let row = Row::live(node.id(), id, attributes, Lineage::default());

		let selected = match key {
			Key::All => true,
			Key::Field(fields) => satisfies(node.fields(), &row, fields),
			Key::Id(id) => row.id.as_ref() == Some(id),
		};
		if selected {
			rows.push(row);
		}
	}
	Ok(rows)
}
