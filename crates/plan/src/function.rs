// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use lattice_type::Type;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionType {
	pub return_type: Type,
	pub param_types: Vec<Type>,
}

impl FunctionType {
	pub fn new(return_type: Type, param_types: impl IntoIterator<Item = Type>) -> Self {
		Self {
			return_type,
			param_types: param_types.into_iter().collect(),
		}
	}
}

/// A named function referenced from a plan, typed at plan construction.
/// Executables are resolved by name at build time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PFunction {
	pub name: String,
	#[serde(rename = "type")]
	pub ty: FunctionType,
}

impl PFunction {
	pub fn new(name: impl Into<String>, ty: FunctionType) -> Self {
		Self {
			name: name.into(),
			ty,
		}
	}
}

impl Display for PFunction {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}(", self.name)?;
		for (idx, param) in self.ty.param_types.iter().enumerate() {
			if idx > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{}", param)?;
		}
		write!(f, ") -> {}", self.ty.return_type)
	}
}
