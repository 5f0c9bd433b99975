// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_type::{Result, Value};

use crate::key::{Key, RowId};

/// A row as delivered by a scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalRow {
	/// Left empty, the engine derives the id from the scan's id fields.
	pub id: Option<RowId>,
	/// Values aligned with the scan node's declared fields.
	pub attributes: Option<Vec<Value>>,
}

impl PhysicalRow {
	pub fn new(attributes: Vec<Value>) -> Self {
		Self {
			id: None,
			attributes: Some(attributes),
		}
	}

	pub fn with_id(id: RowId, attributes: Vec<Value>) -> Self {
		Self {
			id: Some(id),
			attributes: Some(attributes),
		}
	}

	/// Marks a keyed lookup that matched nothing.
	pub fn not_found() -> Self {
		Self {
			id: None,
			attributes: None,
		}
	}

	pub fn is_not_found(&self) -> bool {
		self.attributes.is_none()
	}
}

/// Reads base rows of one schema table.
///
/// The key is either [`Key::All`] or a [`Key::Field`] over the scan's
/// declared fields; id keys are decoded before they reach the scanner. For a
/// field key a scanner returns at least one row, [`PhysicalRow::not_found`]
/// when nothing matches. Implementations may block.
pub trait Scanner: Send + Sync {
	fn scan(&self, table: &str, key: &Key) -> Result<Vec<PhysicalRow>>;
}
