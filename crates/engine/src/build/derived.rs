// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Nodes computing one output field from each source row.

use lattice_plan::PNode;
use lattice_type::{Result, Value};
use tracing::instrument;

use super::{check_known, key_or_all, lineage, retag, retain_residual, split_key};
use crate::{context::BuildContext, key::Key, row::Row};

#[instrument(name = "engine::build::extract", level = "debug", skip_all, fields(node = node.name(), key = %key))]
pub(super) fn extract(
	ctx: &BuildContext,
	node: &PNode,
	source: &PNode,
	source_field: &str,
	struct_member: &str,
	output_field: &str,
	key: &Key,
) -> Result<Vec<Row>> {
	let position =
		source.fields().ty(source_field).and_then(|ty| ty.as_struct()).and_then(|st| st.position(struct_member));
	derive(ctx, node, source, output_field, key, |attributes| {
		let mut values = attributes.to_vec();
		let member = match (position, field(source, attributes, source_field)) {
			(Some(position), Value::Struct(members)) => members.get(position).cloned().unwrap_or(Value::Undefined),
			_ => Value::Undefined,
		};
		values.push(member);
		values
	})
}

#[instrument(name = "engine::build::struct", level = "debug", skip_all, fields(node = node.name(), key = %key))]
pub(super) fn structure(
	ctx: &BuildContext,
	node: &PNode,
	source: &PNode,
	input_fields: &[String],
	output_field: &str,
	key: &Key,
) -> Result<Vec<Row>> {
	derive(ctx, node, source, output_field, key, |attributes| {
		let mut values = attributes.to_vec();
		values.push(Value::Struct(
			input_fields.iter().map(|input| field(source, attributes, input)).collect(),
		));
		values
	})
}

/// The output takes the first defined value among the unified fields.
#[instrument(name = "engine::build::unify", level = "debug", skip_all, fields(node = node.name(), key = %key))]
pub(super) fn unify(
	ctx: &BuildContext,
	node: &PNode,
	source: &PNode,
	unified_fields: &[String],
	output_field: &str,
	key: &Key,
) -> Result<Vec<Row>> {
	derive(ctx, node, source, output_field, key, |attributes| {
		let mut values: Vec<Value> = source
			.fields()
			.names()
			.zip(attributes.iter())
			.filter(|(name, _)| !unified_fields.iter().any(|unified| unified == name))
			.map(|(_, value)| value.clone())
			.collect();
		let unified = unified_fields
			.iter()
			.map(|unified| field(source, attributes, unified))
			.find(|value| !value.is_undefined())
			.unwrap_or(Value::Undefined);
		values.push(unified);
		values
	})
}

fn field(source: &PNode, attributes: &[Value], name: &str) -> Value {
	source.fields().position(name).and_then(|position| attributes.get(position)).cloned().unwrap_or(Value::Undefined)
}

/// Pushes every key field but the output down to the source and computes the
/// attributes of each live source row with `compute`.
fn derive(
	ctx: &BuildContext,
	node: &PNode,
	source: &PNode,
	output_field: &str,
	key: &Key,
	compute: impl Fn(&[Value]) -> Vec<Value>,
) -> Result<Vec<Row>> {
	let (source_key, residual) = match key {
		Key::Field(fields) => {
			check_known(node, fields)?;
			let (pushed, residual) =
				split_key(fields, |field| field != output_field && source.fields().contains(field));
			(key_or_all(pushed), residual)
		}
		other => (other.clone(), Default::default()),
	};

	let rows = ctx.build(source, &source_key)?;
	let result = rows
		.iter()
		.map(|row| match (&row.id, &row.attributes) {
			(Some(id), Some(attributes)) => {
				Row::live(node.id(), id.clone(), compute(attributes), lineage(ctx, &[row]))
			}
			_ => retag(ctx, node, row),
		})
		.collect();
	Ok(retain_residual(node.fields(), result, &residual))
}
