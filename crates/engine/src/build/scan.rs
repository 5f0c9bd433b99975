// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_plan::PNode;
use lattice_type::{Result, Value};
use tracing::{debug, instrument};

use super::check_known;
use crate::{
	context::BuildContext,
	error::BuildError,
	key::{FieldKey, Key},
	row::{Lineage, Row},
	scanner::PhysicalRow,
};

#[instrument(name = "engine::build::scan", level = "debug", skip_all, fields(node = node.name(), key = %key))]
pub(super) fn build(ctx: &BuildContext, node: &PNode, table: &str, id_fields: &[String], key: &Key) -> Result<Vec<Row>> {
	let scan_key = match key {
		Key::All => Key::All,
		Key::Field(fields) => {
			check_known(node, fields)?;
			key.clone()
		}
		Key::Id(id) => {
			let decoded = ctx.engine().codec().decode(id)?;
			check_known(node, &decoded)?;
			Key::Field(decoded)
		}
	};

	let Some(scanner) = ctx.engine().scanner(table) else {
		return Err(BuildError::ScannerNotFound {
			node: node.name().to_string(),
			table: table.to_string(),
		}
		.into());
	};

	let physical = scanner.scan(table, &scan_key)?;
	if physical.is_empty() && !scan_key.is_all() {
		if ctx.engine().enforce_scan_contract() {
			return Err(BuildError::EmptyScan {
				node: node.name().to_string(),
				key: key.to_string(),
			}
			.into());
		}
		debug!("empty scan treated as absent");
		return Ok(vec![Row::absent(node.id())]);
	}

	physical.into_iter().map(|row| to_row(ctx, node, id_fields, row)).collect()
}

fn to_row(ctx: &BuildContext, node: &PNode, id_fields: &[String], physical: PhysicalRow) -> Result<Row> {
	let PhysicalRow {
		id,
		attributes,
	} = physical;
	let Some(attributes) = attributes else {
		return Ok(Row::absent(node.id()));
	};

	if attributes.len() != node.fields().len() {
		return Err(BuildError::RowShape {
			node: node.name().to_string(),
			expected: node.fields().len(),
			actual: attributes.len(),
		}
		.into());
	}

	let id = match id {
		Some(id) => id,
		None => ctx.engine().codec().encode(&identity(node, id_fields, &attributes))?,
	};
	Ok(Row::live(node.id(), id, attributes, Lineage::default()))
}

/// The id field values of a scanned row, or every value when the scan
/// declares no id fields.
fn identity(node: &PNode, id_fields: &[String], attributes: &[Value]) -> FieldKey {
	node.fields()
		.names()
		.zip(attributes.iter())
		.filter(|(name, _)| id_fields.is_empty() || id_fields.iter().any(|id| id == name))
		.map(|(name, value)| (name.to_string(), value.clone()))
		.collect()
}
