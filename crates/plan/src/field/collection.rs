// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use indexmap::IndexMap;
use lattice_type::{Result, Type};

use super::{Field, FieldAnnotationKind, FieldAnnotations};
use crate::error::PlanError;

/// How [`FieldCollection::merge`] treats a name present on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnConflict {
	/// Any overlap is a duplicate field.
	Error,
	/// Overlapping fields of equivalent type are merged, their annotation sets
	/// unioned. Overlapping fields of differing type still fail.
	Union,
}

/// Ordered, name-unique collection of fields. Insertion order is the row
/// layout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldCollection {
	fields: IndexMap<String, Field>,
}

#[derive(Debug, Default)]
pub struct FieldCollectionBuilder {
	fields: IndexMap<String, Field>,
}

impl FieldCollectionBuilder {
	pub fn add(&mut self, name: impl Into<String>, ty: Type, annotations: FieldAnnotations) -> Result<&mut Self> {
		self.add_field(Field {
			name: name.into(),
			ty,
			annotations,
		})
	}

	pub fn add_field(&mut self, field: Field) -> Result<&mut Self> {
		if self.fields.contains_key(&field.name) {
			return Err(PlanError::DuplicateField {
				field: field.name,
			}
			.into());
		}
		self.fields.insert(field.name.clone(), field);
		Ok(self)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.fields.contains_key(name)
	}

	pub fn build(self) -> FieldCollection {
		FieldCollection {
			fields: self.fields,
		}
	}
}

impl FieldCollection {
	pub fn builder() -> FieldCollectionBuilder {
		FieldCollectionBuilder::default()
	}

	pub fn new(fields: impl IntoIterator<Item = Field>) -> Result<Self> {
		let mut builder = Self::builder();
		for field in fields {
			builder.add_field(field)?;
		}
		Ok(builder.build())
	}

	pub fn of(fields: impl IntoIterator<Item = (impl Into<String>, Type)>) -> Result<Self> {
		Self::new(fields.into_iter().map(|(name, ty)| Field::new(name, ty)))
	}

	pub fn get(&self, name: &str) -> Option<&Field> {
		self.fields.get(name)
	}

	pub fn ty(&self, name: &str) -> Option<&Type> {
		self.fields.get(name).map(|f| &f.ty)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.fields.contains_key(name)
	}

	pub fn position(&self, name: &str) -> Option<usize> {
		self.fields.get_index_of(name)
	}

	pub fn len(&self) -> usize {
		self.fields.len()
	}

	pub fn is_empty(&self) -> bool {
		self.fields.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Field> {
		self.fields.values()
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.fields.keys().map(String::as_str)
	}

	pub fn types_by_name(&self) -> IndexMap<String, Type> {
		self.fields.iter().map(|(name, field)| (name.clone(), field.ty.clone())).collect()
	}

	/// Names of fields carrying an annotation of `kind`, in layout order.
	pub fn annotated_with(&self, kind: FieldAnnotationKind) -> Vec<&str> {
		self.fields.values().filter(|f| f.has_annotation(kind)).map(|f| f.name.as_str()).collect()
	}

	/// Returns a copy with `field` appended.
	pub fn with_field(&self, field: Field) -> Result<Self> {
		if self.contains(&field.name) {
			return Err(PlanError::DuplicateField {
				field: field.name,
			}
			.into());
		}
		let mut fields = self.fields.clone();
		fields.insert(field.name.clone(), field);
		Ok(Self {
			fields,
		})
	}

	/// Appends the fields of `other`. Fields taken from `other` keep only
	/// their transitive annotations.
	pub fn merge(&self, other: &FieldCollection, on_conflict: OnConflict) -> Result<Self> {
		let mut fields = self.fields.clone();
		for field in other.iter() {
			match fields.get_mut(&field.name) {
				None => {
					fields.insert(field.name.clone(), field.with_only_transitive_annotations());
				}
				Some(existing) => {
					if on_conflict == OnConflict::Error {
						return Err(PlanError::DuplicateField {
							field: field.name.clone(),
						}
						.into());
					}
					if !existing.ty.is_equivalent(&field.ty) {
						return Err(PlanError::FieldTypeConflict {
							field: field.name.clone(),
							left: existing.ty.clone(),
							right: field.ty.clone(),
						}
						.into());
					}
					existing.annotations = existing.annotations.merged(&field.annotations.transitive_only());
				}
			}
		}
		Ok(Self {
			fields,
		})
	}

	pub fn with_only_transitive_annotations(&self) -> Self {
		Self {
			fields: self
				.fields
				.iter()
				.map(|(name, field)| (name.clone(), field.with_only_transitive_annotations()))
				.collect(),
		}
	}

	/// Adds the given annotations to the named fields. Every target must exist.
	pub fn with_annotations(&self, node: &str, annotations: &IndexMap<String, FieldAnnotations>) -> Result<Self> {
		let mut fields = self.fields.clone();
		for (name, extra) in annotations {
			let Some(field) = fields.get_mut(name) else {
				return Err(PlanError::AnnotationTargetMissing {
					node: node.to_string(),
					field: name.clone(),
				}
				.into());
			};
			for annotation in extra.iter() {
				field.annotations.insert(*annotation);
			}
		}
		Ok(Self {
			fields,
		})
	}

	/// Returns a copy restricted to `names`, in their original layout order.
	pub fn only(&self, names: &[&str]) -> Self {
		Self {
			fields: self
				.fields
				.iter()
				.filter(|(name, _)| names.contains(&name.as_str()))
				.map(|(name, field)| (name.clone(), field.clone()))
				.collect(),
		}
	}

	pub fn without(&self, names: &[&str]) -> Self {
		Self {
			fields: self
				.fields
				.iter()
				.filter(|(name, _)| !names.contains(&name.as_str()))
				.map(|(name, field)| (name.clone(), field.clone()))
				.collect(),
		}
	}
}

impl<'a> IntoIterator for &'a FieldCollection {
	type Item = &'a Field;
	type IntoIter = indexmap::map::Values<'a, String, Field>;

	fn into_iter(self) -> Self::IntoIter {
		self.fields.values()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::field::FieldAnnotation;

	fn users() -> FieldCollection {
		FieldCollection::new([
			Field::new("id", Type::Int8).annotated(FieldAnnotation::id()),
			Field::new("name", Type::Utf8).annotated(FieldAnnotation::ephemeral()),
		])
		.unwrap()
	}

	#[test]
	fn test_builder_rejects_duplicate() {
		let mut builder = FieldCollection::builder();
		builder.add("id", Type::Int8, FieldAnnotations::new()).unwrap();
		let err = builder.add("id", Type::Utf8, FieldAnnotations::new()).unwrap_err();
		assert_eq!(err.code(), "FIELD_001");
		assert_eq!(err.0.fields, vec!["id".to_string()]);
	}

	#[test]
	fn test_insertion_order_is_layout() {
		let fields = FieldCollection::of([("b", Type::Int8), ("a", Type::Utf8), ("c", Type::Boolean)]).unwrap();
		assert_eq!(fields.names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
		assert_eq!(fields.position("c"), Some(2));
	}

	#[test]
	fn test_merge_error_on_overlap() {
		let err = users().merge(&users(), OnConflict::Error).unwrap_err();
		assert_eq!(err.code(), "FIELD_001");
	}

	#[test]
	fn test_merge_union_requires_equivalent_types() {
		let other = FieldCollection::of([("id", Type::Utf8)]).unwrap();
		let err = users().merge(&other, OnConflict::Union).unwrap_err();
		assert_eq!(err.code(), "FIELD_003");

		let other = FieldCollection::new([Field::new("id", Type::Int8).annotated(FieldAnnotation::unique())]).unwrap();
		let merged = users().merge(&other, OnConflict::Union).unwrap();
		assert_eq!(merged.len(), 2);
		let id = merged.get("id").unwrap();
		assert!(id.has_annotation(FieldAnnotationKind::Id));
		assert!(id.has_annotation(FieldAnnotationKind::Unique));
	}

	#[test]
	fn test_merge_inherits_only_transitive_annotations() {
		let left = FieldCollection::of([("x", Type::Int8)]).unwrap();
		let merged = left.merge(&users(), OnConflict::Error).unwrap();
		assert!(merged.get("id").unwrap().has_annotation(FieldAnnotationKind::Id));
		assert!(!merged.get("name").unwrap().has_annotation(FieldAnnotationKind::Ephemeral));
	}

	#[test]
	fn test_with_annotations_missing_target() {
		let mut extra = IndexMap::new();
		extra.insert("missing".to_string(), FieldAnnotations::new().with(FieldAnnotation::unique()));
		let err = users().with_annotations("users", &extra).unwrap_err();
		assert_eq!(err.code(), "ANNOTATION_001");
	}

	#[test]
	fn test_annotated_with() {
		assert_eq!(users().annotated_with(FieldAnnotationKind::Id), vec!["id"]);
	}
}
