// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	collections::BTreeMap,
	fmt::{Debug, Display, Formatter},
	ops::Deref,
};

use lattice_type::Value;
use serde::{Deserialize, Serialize};

/// Opaque encoded row identity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(Vec<u8>);

impl RowId {
	pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
		Self(bytes.into())
	}

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}
}

impl Debug for RowId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "RowId({})", self)
	}
}

impl Display for RowId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str("0x")?;
		for byte in &self.0 {
			write!(f, "{:02x}", byte)?;
		}
		Ok(())
	}
}

/// Equality constraints on named fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldKey(BTreeMap<String, Value>);

impl FieldKey {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn single(field: impl Into<String>, value: impl Into<Value>) -> Self {
		Self::new().with(field, value)
	}

	pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
		self.0.insert(field.into(), value.into());
		self
	}

	pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
		self.0.insert(field.into(), value)
	}

	pub fn fields(&self) -> impl Iterator<Item = &str> {
		self.0.keys().map(String::as_str)
	}

	pub fn into_inner(self) -> BTreeMap<String, Value> {
		self.0
	}
}

impl Deref for FieldKey {
	type Target = BTreeMap<String, Value>;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl FromIterator<(String, Value)> for FieldKey {
	fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl Display for FieldKey {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str("{")?;
		for (idx, (field, value)) in self.0.iter().enumerate() {
			if idx > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{}: {}", field, value)?;
		}
		f.write_str("}")
	}
}

/// Selects the rows a build produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
	/// Every row.
	All,
	/// Rows whose fields equal the given values.
	Field(FieldKey),
	/// The single row with this identity.
	Id(RowId),
}

impl Key {
	pub fn all() -> Self {
		Key::All
	}

	pub fn field(field: impl Into<String>, value: impl Into<Value>) -> Self {
		Key::Field(FieldKey::single(field, value))
	}

	pub fn id(id: RowId) -> Self {
		Key::Id(id)
	}

	pub fn is_all(&self) -> bool {
		matches!(self, Key::All)
	}
}

impl From<FieldKey> for Key {
	fn from(key: FieldKey) -> Self {
		Key::Field(key)
	}
}

impl From<RowId> for Key {
	fn from(id: RowId) -> Self {
		Key::Id(id)
	}
}

impl Display for Key {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Key::All => f.write_str("all"),
			Key::Field(key) => write!(f, "field {}", key),
			Key::Id(id) => write!(f, "id {}", id),
		}
	}
}
