// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use lattice_type::Type;
use serde::{Deserialize, Serialize};

mod collection;

pub use collection::{FieldCollection, FieldCollectionBuilder, OnConflict};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldAnnotationKind {
	Ephemeral,
	Id,
	Immutable,
	Internal,
	Monotonic,
	Sealed,
	Unique,
}

impl FieldAnnotationKind {
	/// Whether annotations of this kind follow a field through 1:1 derivations
	/// unless overridden.
	pub fn is_transitive_by_default(&self) -> bool {
		matches!(self, FieldAnnotationKind::Id | FieldAnnotationKind::Unique | FieldAnnotationKind::Immutable)
	}
}

impl Display for FieldAnnotationKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			FieldAnnotationKind::Ephemeral => "ephemeral",
			FieldAnnotationKind::Id => "id",
			FieldAnnotationKind::Immutable => "immutable",
			FieldAnnotationKind::Internal => "internal",
			FieldAnnotationKind::Monotonic => "monotonic",
			FieldAnnotationKind::Sealed => "sealed",
			FieldAnnotationKind::Unique => "unique",
		};
		f.write_str(name)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldAnnotation {
	pub kind: FieldAnnotationKind,
	pub transitive: bool,
}

impl FieldAnnotation {
	pub fn of(kind: FieldAnnotationKind) -> Self {
		Self {
			kind,
			transitive: kind.is_transitive_by_default(),
		}
	}

	pub fn id() -> Self {
		Self::of(FieldAnnotationKind::Id)
	}

	pub fn unique() -> Self {
		Self::of(FieldAnnotationKind::Unique)
	}

	pub fn immutable() -> Self {
		Self::of(FieldAnnotationKind::Immutable)
	}

	pub fn monotonic() -> Self {
		Self::of(FieldAnnotationKind::Monotonic)
	}

	pub fn sealed() -> Self {
		Self::of(FieldAnnotationKind::Sealed)
	}

	pub fn ephemeral() -> Self {
		Self::of(FieldAnnotationKind::Ephemeral)
	}

	pub fn internal() -> Self {
		Self::of(FieldAnnotationKind::Internal)
	}

	pub fn with_transitive(mut self, transitive: bool) -> Self {
		self.transitive = transitive;
		self
	}
}

impl Display for FieldAnnotation {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "@{}", self.kind)
	}
}

/// Annotation set of a field, at most one annotation per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldAnnotations(Vec<FieldAnnotation>);

impl FieldAnnotations {
	pub fn new() -> Self {
		Self(Vec::new())
	}

	/// Inserts an annotation, replacing any existing one of the same kind.
	pub fn insert(&mut self, annotation: FieldAnnotation) {
		match self.0.iter_mut().find(|a| a.kind == annotation.kind) {
			Some(existing) => *existing = annotation,
			None => self.0.push(annotation),
		}
	}

	pub fn with(mut self, annotation: FieldAnnotation) -> Self {
		self.insert(annotation);
		self
	}

	pub fn contains(&self, kind: FieldAnnotationKind) -> bool {
		self.0.iter().any(|a| a.kind == kind)
	}

	pub fn get(&self, kind: FieldAnnotationKind) -> Option<&FieldAnnotation> {
		self.0.iter().find(|a| a.kind == kind)
	}

	pub fn transitive_only(&self) -> Self {
		Self(self.0.iter().filter(|a| a.transitive).copied().collect())
	}

	/// Adds every annotation of `other` not already present by kind.
	pub fn merged(&self, other: &FieldAnnotations) -> Self {
		let mut result = self.clone();
		for annotation in other.iter() {
			if !result.contains(annotation.kind) {
				result.0.push(*annotation);
			}
		}
		result
	}

	pub fn iter(&self) -> impl Iterator<Item = &FieldAnnotation> {
		self.0.iter()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}
}

impl FromIterator<FieldAnnotation> for FieldAnnotations {
	fn from_iter<T: IntoIterator<Item = FieldAnnotation>>(iter: T) -> Self {
		let mut result = FieldAnnotations::new();
		for annotation in iter {
			result.insert(annotation);
		}
		result
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
	pub name: String,
	pub ty: Type,
	pub annotations: FieldAnnotations,
}

impl Field {
	pub fn new(name: impl Into<String>, ty: Type) -> Self {
		Self {
			name: name.into(),
			ty,
			annotations: FieldAnnotations::new(),
		}
	}

	pub fn annotated(mut self, annotation: FieldAnnotation) -> Self {
		self.annotations.insert(annotation);
		self
	}

	pub fn has_annotation(&self, kind: FieldAnnotationKind) -> bool {
		self.annotations.contains(kind)
	}

	pub fn with_only_transitive_annotations(&self) -> Self {
		Self {
			name: self.name.clone(),
			ty: self.ty.clone(),
			annotations: self.annotations.transitive_only(),
		}
	}
}

impl Display for Field {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}: {}", self.name, self.ty)?;
		for annotation in self.annotations.iter() {
			write!(f, " {}", annotation)?;
		}
		Ok(())
	}
}
