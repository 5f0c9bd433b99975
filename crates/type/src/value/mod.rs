// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

mod ordered_f64;
mod r#type;

pub use ordered_f64::OrderedF64;
pub use r#type::{StructMember, StructType, Type, TypeAnnotation};

use crate::error::TypeError;

/// A plan value, represented as a native Rust type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Value {
	/// Value is not defined (think null in common programming languages)
	Undefined,
	/// A boolean: true or false.
	Boolean(bool),
	/// A 4-byte signed integer
	Int4(i32),
	/// An 8-byte signed integer
	Int8(i64),
	/// An 8-byte floating point
	Float8(OrderedF64),
	/// A UTF-8 encoded text.
	Utf8(String),
	/// Raw bytes
	Blob(Vec<u8>),
	/// An ordered list of values of the same type
	List(Vec<Value>),
	/// Struct members, positionally aligned with the struct type
	Struct(Vec<Value>),
}

impl Value {
	pub fn undefined() -> Self {
		Value::Undefined
	}

	pub fn bool(v: impl Into<bool>) -> Self {
		Value::Boolean(v.into())
	}

	pub fn int4(v: impl Into<i32>) -> Self {
		Value::Int4(v.into())
	}

	pub fn int8(v: impl Into<i64>) -> Self {
		Value::Int8(v.into())
	}

	pub fn float8(v: impl Into<f64>) -> Self {
		OrderedF64::try_from(v.into()).map(Value::Float8).unwrap_or(Value::Undefined)
	}

	pub fn utf8(v: impl Into<String>) -> Self {
		Value::Utf8(v.into())
	}

	pub fn blob(v: impl Into<Vec<u8>>) -> Self {
		Value::Blob(v.into())
	}

	pub fn is_undefined(&self) -> bool {
		matches!(self, Value::Undefined)
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Value::Boolean(v) => Some(*v),
			_ => None,
		}
	}

	pub fn as_int8(&self) -> Option<i64> {
		match self {
			Value::Int8(v) => Some(*v),
			Value::Int4(v) => Some(*v as i64),
			_ => None,
		}
	}

	/// Whether this value may be stored in a field of type `ty`.
	pub fn conforms_to(&self, ty: &Type) -> bool {
		if let Type::Annotated {
			inner,
			annotations,
		} = ty
		{
			if self.is_undefined() {
				return !annotations.contains(&TypeAnnotation::NotNull);
			}
			return self.conforms_to(inner);
		}
		match (self, ty) {
			(Value::Undefined, _) => true,
			(Value::Boolean(_), Type::Boolean) => true,
			(Value::Int4(_), Type::Int4) => true,
			(Value::Int8(_), Type::Int8) => true,
			(Value::Float8(_), Type::Float8) => true,
			(Value::Utf8(_), Type::Utf8) => true,
			(Value::Blob(_), Type::Blob) => true,
			(Value::List(items), Type::List(element)) => items.iter().all(|v| v.conforms_to(element)),
			(Value::Struct(values), Type::Struct(st)) => {
				values.len() == st.members.len()
					&& values.iter().zip(st.members.iter()).all(|(v, m)| v.conforms_to(&m.ty))
			}
			_ => false,
		}
	}

	pub fn check_conforms(&self, ty: &Type) -> Result<(), TypeError> {
		if self.conforms_to(ty) {
			Ok(())
		} else {
			Err(TypeError::ValueTypeMismatch {
				expected: ty.clone(),
				value: self.to_string(),
			})
		}
	}
}

impl Display for Value {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Value::Undefined => f.write_str("undefined"),
			Value::Boolean(v) => write!(f, "{}", v),
			Value::Int4(v) => write!(f, "{}", v),
			Value::Int8(v) => write!(f, "{}", v),
			Value::Float8(v) => write!(f, "{}", v),
			Value::Utf8(v) => write!(f, "'{}'", v),
			Value::Blob(v) => {
				f.write_str("0x")?;
				for byte in v {
					write!(f, "{:02x}", byte)?;
				}
				Ok(())
			}
			Value::List(items) | Value::Struct(items) => {
				let (open, close) = if matches!(self, Value::List(_)) {
					("[", "]")
				} else {
					("{", "}")
				};
				f.write_str(open)?;
				for (idx, item) in items.iter().enumerate() {
					if idx > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{}", item)?;
				}
				f.write_str(close)
			}
		}
	}
}

impl From<bool> for Value {
	fn from(v: bool) -> Self {
		Value::Boolean(v)
	}
}

impl From<i32> for Value {
	fn from(v: i32) -> Self {
		Value::Int4(v)
	}
}

impl From<i64> for Value {
	fn from(v: i64) -> Self {
		Value::Int8(v)
	}
}

impl From<&str> for Value {
	fn from(v: &str) -> Self {
		Value::Utf8(v.to_string())
	}
}

impl From<String> for Value {
	fn from(v: String) -> Self {
		Value::Utf8(v)
	}
}
