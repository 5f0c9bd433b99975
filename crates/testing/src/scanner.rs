// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::HashMap, sync::Arc};

use lattice_engine::{Key, PhysicalRow, Scanner};
use lattice_type::{Result, Value};
use parking_lot::RwLock;
use tracing::trace;

#[derive(Debug, Default)]
struct Table {
	fields: Vec<String>,
	rows: Vec<Vec<Value>>,
}

/// In-memory tables served through [`Scanner`].
///
/// Clones share the same tables, so a test can keep a handle and mutate rows
/// after registering the scanner with an engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryScanner {
	tables: Arc<RwLock<HashMap<String, Table>>>,
	scans: Arc<RwLock<Vec<(String, Key)>>>,
}

impl MemoryScanner {
	pub fn new() -> Self {
		Self::default()
	}

	/// Declares a table; `fields` must follow the scan node's field order.
	pub fn with_table(self, table: &str, fields: &[&str]) -> Self {
		self.tables.write().insert(
			table.to_string(),
			Table {
				fields: fields.iter().map(|f| f.to_string()).collect(),
				rows: vec![],
			},
		);
		self
	}

	pub fn with_row(self, table: &str, row: Vec<Value>) -> Self {
		self.insert(table, row);
		self
	}

	pub fn insert(&self, table: &str, row: Vec<Value>) {
		self.tables.write().entry(table.to_string()).or_default().rows.push(row);
	}

	/// Removes every row whose `field` equals `value`.
	pub fn delete(&self, table: &str, field: &str, value: &Value) {
		let mut tables = self.tables.write();
		if let Some(table) = tables.get_mut(table) {
			if let Some(position) = table.fields.iter().position(|f| f == field) {
				table.rows.retain(|row| row.get(position) != Some(value));
			}
		}
	}

	/// Every scan served so far, in order.
	pub fn scans(&self) -> Vec<(String, Key)> {
		self.scans.read().clone()
	}
}

impl Scanner for MemoryScanner {
	fn scan(&self, table: &str, key: &Key) -> Result<Vec<PhysicalRow>> {
		trace!(table, key = %key, "memory scan");
		self.scans.write().push((table.to_string(), key.clone()));

		let tables = self.tables.read();
		let Some(table) = tables.get(table) else {
			return Ok(match key {
				Key::All => vec![],
				_ => vec![PhysicalRow::not_found()],
			});
		};

		let matches = |row: &Vec<Value>| match key {
			Key::Field(fields) => fields.iter().all(|(field, value)| {
				table.fields.iter().position(|f| f == field).and_then(|position| row.get(position)) == Some(value)
			}),
			Key::All | Key::Id(_) => true,
		};
		let rows: Vec<PhysicalRow> =
			table.rows.iter().filter(|row| matches(row)).map(|row| PhysicalRow::new(row.clone())).collect();

		if rows.is_empty() && !key.is_all() {
			return Ok(vec![PhysicalRow::not_found()]);
		}
		Ok(rows)
	}
}
