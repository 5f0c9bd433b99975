// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Output field derivation and variant-specific invariants.

use std::collections::BTreeSet;

use lattice_type::{Result, Type};

use super::{
	Branch, Input, Layout, LookupBranch, NodeKind, PNode, Predicate, Projection, Strictness,
	layout::{JoinLayout, ProjectionLayout},
};
use crate::{
	error::PlanError,
	field::{Field, FieldAnnotation, FieldAnnotations, FieldCollection, OnConflict},
};

pub(super) fn derive(name: &str, kind: &NodeKind) -> Result<(FieldCollection, Layout)> {
	let fields = match kind {
		NodeKind::Scan {
			schema_table,
			fields,
			id_fields,
		} => {
			if schema_table.is_empty() {
				return Err(invalid(name, "scan must name a schema table", vec![]));
			}
			if fields.is_empty() {
				return Err(invalid(name, "scan must declare at least one field", vec![]));
			}
			check_distinct(name, id_fields)?;
			for id_field in id_fields {
				if !fields.contains_key(id_field) {
					return Err(not_found(name, id_field));
				}
			}
			let mut builder = FieldCollection::builder();
			for (field, ty) in fields {
				let mut annotations = FieldAnnotations::new();
				if id_fields.contains(field) {
					annotations.insert(FieldAnnotation::id());
				}
				builder.add(field.clone(), ty.clone(), annotations)?;
			}
			builder.build()
		}

		NodeKind::Values {
			fields,
			rows,
			index_field,
			strictness,
		} => {
			for (idx, row) in rows.iter().enumerate() {
				if row.len() != fields.len() {
					return Err(invalid(
						name,
						&format!("row {} has {} values, expected {}", idx, row.len(), fields.len()),
						vec![],
					));
				}
				if *strictness == Strictness::Strict {
					for ((field, ty), value) in fields.iter().zip(row.iter()) {
						if let Err(err) = value.check_conforms(ty) {
							return Err(invalid(
								name,
								&format!("row {}: {}", idx, err),
								vec![field.clone()],
							));
						}
					}
				}
			}
			let mut builder = FieldCollection::builder();
			for (field, ty) in fields {
				builder.add(field.clone(), ty.clone(), FieldAnnotations::new())?;
			}
			if let Some(index_field) = index_field {
				if builder.contains(index_field) {
					return Err(already_exists(name, index_field));
				}
				builder.add(index_field.clone(), Type::Int8, FieldAnnotations::new())?;
			}
			builder.build()
		}

		NodeKind::Filter {
			source,
			predicate,
			..
		} => {
			match predicate {
				Predicate::Field(field) => {
					let ty = require(source, field)?;
					if !ty.is_boolean() {
						return Err(mismatch(name, field, Type::Boolean, ty.clone()));
					}
				}
				Predicate::Function {
					function,
					args,
				} => {
					if !function.ty.return_type.is_boolean() {
						return Err(mismatch(
							name,
							&function.name,
							Type::Boolean,
							function.ty.return_type.clone(),
						));
					}
					check_arity(name, &function.name, function.ty.param_types.len(), args.len())?;
					for (arg, param) in args.iter().zip(function.ty.param_types.iter()) {
						let ty = require(source, arg)?;
						if !ty.is_equivalent(param) {
							return Err(mismatch(name, arg, param.clone(), ty.clone()));
						}
					}
				}
			}
			source.fields().with_only_transitive_annotations()
		}

		NodeKind::Project {
			source,
			projection,
		} => {
			let fields = project_fields(name, source, projection)?;
			let layout = ProjectionLayout::new(source.fields(), projection);
			return Ok((fields, Layout::Projection(layout)));
		}

		NodeKind::Join {
			branches,
			mode,
		} => {
			check_join_branches(name, branches)?;
			let mut fields = FieldCollection::default();
			for branch in branches {
				fields = fields.merge(branch.node.fields(), OnConflict::Error)?;
			}
			return Ok((fields, Layout::Join(JoinLayout::new(branches, *mode))));
		}

		NodeKind::CrossJoin {
			sources,
			..
		} => {
			let mut fields = FieldCollection::default();
			for source in sources {
				fields = fields.merge(source.fields(), OnConflict::Error)?;
			}
			fields
		}

		NodeKind::LookupJoin {
			source,
			source_key_fields,
			branches,
		} => {
			check_distinct(name, source_key_fields)?;
			for field in source_key_fields {
				require(source, field)?;
			}
			if branches.is_empty() {
				return Err(invalid(name, "lookup join requires at least one branch", vec![]));
			}
			check_lookup_branches(name, source, branches)?;
			source.fields().with_only_transitive_annotations()
		}

		NodeKind::Group {
			source,
			key_fields,
			list_field,
		} => {
			if key_fields.is_empty() {
				return Err(invalid(name, "group requires at least one key field", vec![]));
			}
			check_distinct(name, key_fields)?;
			if key_fields.contains(list_field) {
				return Err(already_exists(name, list_field));
			}
			let mut builder = FieldCollection::builder();
			for key in key_fields {
				require(source, key)?;
				let mut field = source.fields().get(key).map(Field::with_only_transitive_annotations).ok_or_else(
					|| not_found(source.name(), key),
				)?;
				field.annotations.insert(FieldAnnotation::id());
				builder.add_field(field)?;
			}
			let element = Type::structure(source.fields().iter().map(|f| (f.name.clone(), f.ty.clone())));
			builder.add(list_field.clone(), Type::list(element), FieldAnnotations::new())?;
			builder.build()
		}

		NodeKind::Union {
			sources,
			index_field,
		} => {
			let Some(first) = sources.first() else {
				return Err(invalid(name, "union requires at least one source", vec![]));
			};
			let expected = first.fields().types_by_name();
			for source in &sources[1..] {
				let actual = source.fields().types_by_name();
				let mut differing: Vec<String> = expected
					.iter()
					.filter(|(field, ty)| !actual.get(*field).is_some_and(|other| other.is_equivalent(ty)))
					.map(|(field, _)| field.clone())
					.collect();
				differing.extend(actual.keys().filter(|f| !expected.contains_key(*f)).cloned());
				if !differing.is_empty() {
					return Err(invalid(
						name,
						&format!("source '{}' does not match the fields of '{}'", source.name(), first.name()),
						differing,
					));
				}
			}
			let mut fields = common_annotations(sources)?;
			if let Some(index_field) = index_field {
				if fields.contains(index_field) {
					return Err(already_exists(name, index_field));
				}
				fields = fields.with_field(Field::new(index_field.clone(), Type::Int8))?;
			}
			fields
		}

		NodeKind::Unnest {
			source,
			list_field,
			unnested_fields,
			index_field,
		} => {
			let list_ty = require(source, list_field)?;
			let Some(element) = list_ty.as_list() else {
				return Err(invalid(
					name,
					&format!("field '{}' of type {} is not a list", list_field, list_ty),
					vec![list_field.clone()],
				));
			};
			if unnested_fields.is_empty() {
				return Err(invalid(name, "unnest requires at least one unnested field", vec![]));
			}
			match element.as_struct() {
				Some(st) => {
					for (field, ty) in unnested_fields {
						let Some(member) = st.member(field) else {
							return Err(invalid(
								name,
								&format!("elements of '{}' have no member '{}'", list_field, field),
								vec![field.clone()],
							));
						};
						if !member.ty.is_equivalent(ty) {
							return Err(mismatch(name, field, member.ty.clone(), ty.clone()));
						}
					}
				}
				None => {
					if unnested_fields.len() != 1 {
						return Err(invalid(
							name,
							"a list of scalars unnests into exactly one field",
							unnested_fields.keys().cloned().collect(),
						));
					}
					for (field, ty) in unnested_fields {
						if !element.is_equivalent(ty) {
							return Err(mismatch(name, field, element.clone(), ty.clone()));
						}
					}
				}
			}
			let mut fields = source.fields().with_only_transitive_annotations();
			if let Some(index_field) = index_field {
				if fields.contains(index_field) {
					return Err(already_exists(name, index_field));
				}
				fields = fields.with_field(Field::new(index_field.clone(), Type::Int8))?;
			}
			for (field, ty) in unnested_fields {
				if fields.contains(field) {
					return Err(already_exists(name, field));
				}
				fields = fields.with_field(Field::new(field.clone(), ty.clone()))?;
			}
			fields
		}

		NodeKind::State {
			source,
			invalidations,
			id_fields,
			..
		} => {
			let fields = source.fields().with_only_transitive_annotations();
			for set in id_fields.iter().flatten() {
				for field in set {
					if !fields.contains(field) {
						return Err(not_found(name, field));
					}
				}
			}
			for field in invalidations.key_fields() {
				if !fields.contains(field) {
					return Err(not_found(name, field));
				}
			}
			fields
		}

		NodeKind::Cache {
			source,
		}
		| NodeKind::Scope {
			source,
		} => source.fields().with_only_transitive_annotations(),

		NodeKind::Output {
			source,
			targets,
		} => {
			if targets.iter().any(String::is_empty) {
				return Err(invalid(name, "output targets must not be empty", vec![]));
			}
			source.fields().with_only_transitive_annotations()
		}

		NodeKind::ScopeExit {
			source,
			scope,
		} => {
			if !has_upstream_scope(source, scope) {
				return Err(invalid(
					name,
					&format!("no scope named '{}' is upstream of this node", scope),
					vec![],
				));
			}
			source.fields().with_only_transitive_annotations()
		}

		NodeKind::Extract {
			source,
			source_field,
			struct_member,
			output_field,
		} => {
			let ty = require(source, source_field)?;
			let Some(st) = ty.as_struct() else {
				return Err(invalid(
					name,
					&format!("field '{}' of type {} is not a struct", source_field, ty),
					vec![source_field.clone()],
				));
			};
			let Some(member) = st.member(struct_member) else {
				return Err(invalid(
					name,
					&format!("struct field '{}' has no member '{}'", source_field, struct_member),
					vec![struct_member.clone()],
				));
			};
			let fields = source.fields().with_only_transitive_annotations();
			if fields.contains(output_field) {
				return Err(already_exists(name, output_field));
			}
			fields.with_field(Field::new(output_field.clone(), member.ty.clone()))?
		}

		NodeKind::Struct {
			source,
			ty,
			input_fields,
			output_field,
		} => {
			let Some(st) = ty.as_struct() else {
				return Err(invalid(name, &format!("type {} is not a struct", ty), vec![output_field.clone()]));
			};
			if st.members.is_empty() {
				return Err(invalid(name, "struct type has no members", vec![output_field.clone()]));
			}
			if st.len() != input_fields.len() {
				return Err(invalid(
					name,
					&format!("struct type has {} members but {} input fields", st.len(), input_fields.len()),
					input_fields.clone(),
				));
			}
			for (input, member) in input_fields.iter().zip(st.members.iter()) {
				let input_ty = require(source, input)?;
				if !input_ty.is_equivalent(&member.ty) {
					return Err(mismatch(name, input, member.ty.clone(), input_ty.clone()));
				}
			}
			let fields = source.fields().with_only_transitive_annotations();
			if fields.contains(output_field) {
				return Err(already_exists(name, output_field));
			}
			fields.with_field(Field::new(output_field.clone(), ty.clone()))?
		}

		NodeKind::Unify {
			source,
			unified_fields,
			output_field,
		} => {
			if unified_fields.is_empty() {
				return Err(invalid(name, "unify requires at least one field", vec![]));
			}
			check_distinct(name, unified_fields)?;
			let first_ty = require(source, &unified_fields[0])?.clone();
			for field in &unified_fields[1..] {
				let ty = require(source, field)?;
				if !ty.is_equivalent(&first_ty) {
					return Err(mismatch(name, field, first_ty.clone(), ty.clone()));
				}
			}
			let unified: Vec<&str> = unified_fields.iter().map(String::as_str).collect();
			let fields = source.fields().without(&unified).with_only_transitive_annotations();
			if fields.contains(output_field) {
				return Err(already_exists(name, output_field));
			}
			fields.with_field(Field::new(output_field.clone(), first_ty))?
		}

		NodeKind::Search {
			source,
			search,
			output_field,
			output_type,
		} => {
			if search.is_empty() {
				return Err(invalid(name, "search expression must not be empty", vec![]));
			}
			let fields = source.fields().with_only_transitive_annotations();
			if fields.contains(output_field) {
				return Err(already_exists(name, output_field));
			}
			fields.with_field(Field::new(output_field.clone(), output_type.clone()))?
		}
	};
	Ok((fields, Layout::None))
}

fn project_fields(name: &str, source: &PNode, projection: &Projection) -> Result<FieldCollection> {
	let mut builder = FieldCollection::builder();
	for (output, input) in projection {
		let ty = input_type(name, source, input)?;
		let annotations = match input {
			Input::Field(field) => source
				.fields()
				.get(field)
				.map(|f| f.annotations.transitive_only())
				.unwrap_or_default(),
			_ => FieldAnnotations::new(),
		};
		builder.add(output.clone(), ty, annotations)?;
	}
	Ok(builder.build())
}

fn input_type(name: &str, source: &PNode, input: &Input) -> Result<Type> {
	match input {
		Input::Constant {
			value,
			ty,
		} => {
			if let Err(err) = value.check_conforms(ty) {
				return Err(invalid(name, &err.to_string(), vec![]));
			}
			Ok(ty.clone())
		}
		Input::Field(field) => Ok(require(source, field)?.clone()),
		Input::Function {
			function,
			args,
		} => {
			check_arity(name, &function.name, function.ty.param_types.len(), args.len())?;
			for (arg, param) in args.iter().zip(function.ty.param_types.iter()) {
				let ty = input_type(name, source, arg)?;
				if !ty.is_equivalent(param) {
					return Err(mismatch(name, &function.name, param.clone(), ty));
				}
			}
			Ok(function.ty.return_type.clone())
		}
	}
}

fn check_join_branches(name: &str, branches: &[Branch]) -> Result<()> {
	let lengths: Vec<usize> = branches.iter().map(|b| b.key_fields.len()).collect();
	if lengths.iter().collect::<BTreeSet<_>>().len() > 1 {
		return Err(PlanError::KeyLengthMismatch {
			node: name.to_string(),
			lengths,
		}
		.into());
	}
	if lengths.first().copied().unwrap_or(0) == 0 {
		return Err(invalid(name, "join branches must declare at least one key field", vec![]));
	}
	for branch in branches {
		check_distinct(name, &branch.key_fields)?;
		for field in &branch.key_fields {
			require(&branch.node, field)?;
		}
	}
	let first = &branches[0];
	for branch in &branches[1..] {
		for (left, right) in first.key_fields.iter().zip(branch.key_fields.iter()) {
			let left_ty = require(&first.node, left)?;
			let right_ty = require(&branch.node, right)?;
			if !left_ty.is_equivalent(right_ty) {
				return Err(mismatch(name, right, left_ty.clone(), right_ty.clone()));
			}
		}
	}
	Ok(())
}

fn check_lookup_branches(name: &str, source: &PNode, branches: &[LookupBranch]) -> Result<()> {
	for branch in branches {
		if branch.fields.is_empty() {
			return Err(invalid(
				name,
				&format!("lookup branch '{}' declares no fields", branch.node.name()),
				vec![],
			));
		}
		check_distinct(name, &branch.fields)?;
		for field in &branch.fields {
			let branch_ty = require(&branch.node, field)?;
			let source_ty = require(source, field)?;
			if !branch_ty.is_equivalent(source_ty) {
				return Err(mismatch(name, field, source_ty.clone(), branch_ty.clone()));
			}
		}
	}
	Ok(())
}

/// Fields of the first source, keeping a transitive annotation only when
/// every source carries it on the same field.
fn common_annotations(sources: &[PNode]) -> Result<FieldCollection> {
	let first = sources[0].fields().with_only_transitive_annotations();
	let fields = first.iter().map(|field| {
		let annotations = field
			.annotations
			.iter()
			.filter(|a| {
				sources[1..].iter().all(|s| {
					s.fields().get(&field.name).is_some_and(|f| f.annotations.contains(a.kind))
				})
			})
			.copied()
			.collect();
		Field {
			name: field.name.clone(),
			ty: field.ty.clone(),
			annotations,
		}
	});
	FieldCollection::new(fields)
}

fn has_upstream_scope(node: &PNode, scope: &str) -> bool {
	if matches!(node.kind(), NodeKind::Scope { .. }) && node.name() == scope {
		return true;
	}
	node.sources().iter().any(|s| has_upstream_scope(s, scope))
}

fn require<'a>(node: &'a PNode, field: &str) -> Result<&'a Type> {
	node.fields().ty(field).ok_or_else(|| not_found(node.name(), field))
}

fn check_distinct(name: &str, fields: &[String]) -> Result<()> {
	let mut seen = BTreeSet::new();
	for field in fields {
		if !seen.insert(field) {
			return Err(PlanError::InvalidNode {
				node: name.to_string(),
				reason: format!("field '{}' is listed more than once", field),
				fields: vec![field.clone()],
			}
			.into());
		}
	}
	Ok(())
}

fn check_arity(name: &str, function: &str, expected: usize, actual: usize) -> Result<()> {
	if expected != actual {
		return Err(invalid(
			name,
			&format!("function '{}' takes {} arguments, {} given", function, expected, actual),
			vec![],
		));
	}
	Ok(())
}

fn invalid(name: &str, reason: &str, fields: Vec<String>) -> lattice_type::Error {
	PlanError::InvalidNode {
		node: name.to_string(),
		reason: reason.to_string(),
		fields,
	}
	.into()
}

fn not_found(node: &str, field: &str) -> lattice_type::Error {
	PlanError::FieldNotFound {
		node: node.to_string(),
		field: field.to_string(),
	}
	.into()
}

fn already_exists(name: &str, field: &str) -> lattice_type::Error {
	PlanError::FieldAlreadyExists {
		node: name.to_string(),
		field: field.to_string(),
	}
	.into()
}

fn mismatch(name: &str, field: &str, expected: Type, actual: Type) -> lattice_type::Error {
	PlanError::TypeMismatch {
		node: name.to_string(),
		field: field.to_string(),
		expected,
		actual,
	}
	.into()
}
