// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::{
	collections::BTreeSet,
	fmt::{Display, Formatter},
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeAnnotation {
	NotNull,
	Sized,
	Ephemeral,
	Internal,
}

impl Display for TypeAnnotation {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			TypeAnnotation::NotNull => f.write_str("not_null"),
			TypeAnnotation::Sized => f.write_str("sized"),
			TypeAnnotation::Ephemeral => f.write_str("ephemeral"),
			TypeAnnotation::Internal => f.write_str("internal"),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructMember {
	pub name: String,
	pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructType {
	pub members: Vec<StructMember>,
}

impl StructType {
	pub fn new(members: impl IntoIterator<Item = (impl Into<String>, Type)>) -> Self {
		Self {
			members: members
				.into_iter()
				.map(|(name, ty)| StructMember {
					name: name.into(),
					ty,
				})
				.collect(),
		}
	}

	pub fn member(&self, name: &str) -> Option<&StructMember> {
		self.members.iter().find(|m| m.name == name)
	}

	pub fn position(&self, name: &str) -> Option<usize> {
		self.members.iter().position(|m| m.name == name)
	}

	pub fn len(&self) -> usize {
		self.members.len()
	}

	pub fn is_empty(&self) -> bool {
		self.members.is_empty()
	}
}

/// Logical type of a field or value.
///
/// Types are compared structurally. [`Type::is_equivalent`] ignores
/// annotations and compares the canonical textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Type {
	Boolean,
	Int4,
	Int8,
	Float8,
	Utf8,
	Blob,
	List(Box<Type>),
	Struct(StructType),
	Annotated {
		inner: Box<Type>,
		annotations: BTreeSet<TypeAnnotation>,
	},
}

impl Type {
	pub fn list(element: Type) -> Self {
		Type::List(Box::new(element))
	}

	pub fn structure(members: impl IntoIterator<Item = (impl Into<String>, Type)>) -> Self {
		Type::Struct(StructType::new(members))
	}

	pub fn annotated(self, annotation: TypeAnnotation) -> Self {
		match self {
			Type::Annotated {
				inner,
				mut annotations,
			} => {
				annotations.insert(annotation);
				Type::Annotated {
					inner,
					annotations,
				}
			}
			ty => Type::Annotated {
				inner: Box::new(ty),
				annotations: BTreeSet::from([annotation]),
			},
		}
	}

	pub fn name(&self) -> &'static str {
		match self {
			Type::Boolean => "Boolean",
			Type::Int4 => "Int4",
			Type::Int8 => "Int8",
			Type::Float8 => "Float8",
			Type::Utf8 => "Utf8",
			Type::Blob => "Blob",
			Type::List(_) => "List",
			Type::Struct(_) => "Struct",
			Type::Annotated {
				inner,
				..
			} => inner.name(),
		}
	}

	pub fn fixed_size(&self) -> Option<usize> {
		match self {
			Type::Boolean => Some(1),
			Type::Int4 => Some(4),
			Type::Int8 | Type::Float8 => Some(8),
			Type::Utf8 | Type::Blob | Type::List(_) => None,
			Type::Struct(st) => st.members.iter().map(|m| m.ty.fixed_size()).sum(),
			Type::Annotated {
				inner,
				..
			} => inner.fixed_size(),
		}
	}

	pub fn annotations(&self) -> BTreeSet<TypeAnnotation> {
		match self {
			Type::Annotated {
				annotations,
				..
			} => annotations.clone(),
			_ => BTreeSet::new(),
		}
	}

	pub fn has_annotation(&self, annotation: TypeAnnotation) -> bool {
		matches!(self, Type::Annotated { annotations, .. } if annotations.contains(&annotation))
	}

	/// The type with every annotation removed, recursively.
	pub fn unannotated(&self) -> Type {
		match self {
			Type::Annotated {
				inner,
				..
			} => inner.unannotated(),
			Type::List(element) => Type::list(element.unannotated()),
			Type::Struct(st) => Type::Struct(StructType {
				members: st
					.members
					.iter()
					.map(|m| StructMember {
						name: m.name.clone(),
						ty: m.ty.unannotated(),
					})
					.collect(),
			}),
			ty => ty.clone(),
		}
	}

	pub fn is_equivalent(&self, other: &Type) -> bool {
		self.unannotated().to_string() == other.unannotated().to_string()
	}

	pub fn as_struct(&self) -> Option<&StructType> {
		match self {
			Type::Struct(st) => Some(st),
			Type::Annotated {
				inner,
				..
			} => inner.as_struct(),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&Type> {
		match self {
			Type::List(element) => Some(element),
			Type::Annotated {
				inner,
				..
			} => inner.as_list(),
			_ => None,
		}
	}

	pub fn is_boolean(&self) -> bool {
		matches!(self.unannotated(), Type::Boolean)
	}

	pub fn is_numeric(&self) -> bool {
		matches!(self.unannotated(), Type::Int4 | Type::Int8 | Type::Float8)
	}

	/// Whether values of this type can be used as identity or lookup keys.
	pub fn is_hashable(&self) -> bool {
		match self {
			Type::Boolean | Type::Int4 | Type::Int8 | Type::Utf8 | Type::Blob => true,
			Type::Float8 => false,
			Type::List(element) => element.is_hashable(),
			Type::Struct(st) => st.members.iter().all(|m| m.ty.is_hashable()),
			Type::Annotated {
				inner,
				..
			} => inner.is_hashable(),
		}
	}
}

impl Display for Type {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		match self {
			Type::List(element) => write!(f, "List<{}>", element),
			Type::Struct(st) => {
				f.write_str("Struct{")?;
				for (idx, member) in st.members.iter().enumerate() {
					if idx > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{}: {}", member.name, member.ty)?;
				}
				f.write_str("}")
			}
			Type::Annotated {
				inner,
				annotations,
			} => {
				write!(f, "{}", inner)?;
				for annotation in annotations {
					write!(f, " @{}", annotation)?;
				}
				Ok(())
			}
			ty => f.write_str(ty.name()),
		}
	}
}
