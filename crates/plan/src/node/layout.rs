// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Values derived from a node's declaration, computed once at construction.

use std::collections::{BTreeSet, HashMap};

use indexmap::IndexMap;

use super::{Branch, Input, JoinMode, Projection};
use crate::{field::FieldCollection, util::unify};

#[derive(Debug, Clone)]
pub struct JoinLayout {
	key_length: usize,
	key_fields: BTreeSet<String>,
	branch_indices_by_key_field_set: HashMap<BTreeSet<String>, Vec<usize>>,
	branch_index_by_field: HashMap<String, usize>,
	guaranteed_equal_field_sets: Vec<BTreeSet<String>>,
	equivalent_field_sets_by_field: HashMap<String, BTreeSet<String>>,
}

impl JoinLayout {
	pub(crate) fn new(branches: &[Branch], mode: JoinMode) -> Self {
		let key_length = branches.first().map(|b| b.key_fields.len()).unwrap_or(0);

		let mut key_fields = BTreeSet::new();
		let mut branch_indices_by_key_field_set: HashMap<BTreeSet<String>, Vec<usize>> = HashMap::new();
		let mut branch_index_by_field = HashMap::new();
		for (idx, branch) in branches.iter().enumerate() {
			let set: BTreeSet<String> = branch.key_fields.iter().cloned().collect();
			key_fields.extend(set.iter().cloned());
			branch_indices_by_key_field_set.entry(set).or_default().push(idx);
			for field in branch.node.fields().names() {
				branch_index_by_field.entry(field.to_string()).or_insert(idx);
			}
		}

		let guaranteed_equal_field_sets = if mode == JoinMode::Inner {
			unify((0..key_length).map(|pos| {
				branches.iter().filter_map(|b| b.key_fields.get(pos).cloned()).collect::<BTreeSet<_>>()
			}))
		} else {
			vec![]
		};

		let mut equivalent_field_sets_by_field = HashMap::new();
		for set in &guaranteed_equal_field_sets {
			for field in set {
				equivalent_field_sets_by_field.insert(field.clone(), set.clone());
			}
		}

		Self {
			key_length,
			key_fields,
			branch_indices_by_key_field_set,
			branch_index_by_field,
			guaranteed_equal_field_sets,
			equivalent_field_sets_by_field,
		}
	}

	pub fn key_length(&self) -> usize {
		self.key_length
	}

	pub fn key_fields(&self) -> &BTreeSet<String> {
		&self.key_fields
	}

	/// Branch indices grouped by the set of their key fields.
	pub fn branch_indices_by_key_field_set(&self) -> &HashMap<BTreeSet<String>, Vec<usize>> {
		&self.branch_indices_by_key_field_set
	}

	pub fn branch_index_of_field(&self, field: &str) -> Option<usize> {
		self.branch_index_by_field.get(field).copied()
	}

	/// For inner joins, the maximal sets of fields that are equal on every
	/// output row. Empty for outer joins.
	pub fn guaranteed_equal_field_sets(&self) -> &[BTreeSet<String>] {
		&self.guaranteed_equal_field_sets
	}

	pub fn equivalent_fields(&self, field: &str) -> Option<&BTreeSet<String>> {
		self.equivalent_field_sets_by_field.get(field)
	}
}

#[derive(Debug, Clone)]
pub struct ProjectionLayout {
	input_fields_by_output: IndexMap<String, String>,
	output_sets_by_input_field: IndexMap<String, Vec<String>>,
	added_fields: Vec<String>,
	dropped_fields: Vec<String>,
}

impl ProjectionLayout {
	pub(crate) fn new(source: &FieldCollection, projection: &Projection) -> Self {
		let mut input_fields_by_output = IndexMap::new();
		let mut output_sets_by_input_field: IndexMap<String, Vec<String>> = IndexMap::new();
		for (output, input) in projection {
			if let Input::Field(field) = input {
				input_fields_by_output.insert(output.clone(), field.clone());
				output_sets_by_input_field.entry(field.clone()).or_default().push(output.clone());
			}
		}
		let added_fields = projection.keys().filter(|name| !source.contains(name)).cloned().collect();
		let dropped_fields =
			source.names().filter(|name| !projection.contains_key(*name)).map(str::to_string).collect();
		Self {
			input_fields_by_output,
			output_sets_by_input_field,
			added_fields,
			dropped_fields,
		}
	}

	/// The source field an output field copies, if it is a plain field reference.
	pub fn input_field(&self, output: &str) -> Option<&str> {
		self.input_fields_by_output.get(output).map(String::as_str)
	}

	pub fn input_fields_by_output(&self) -> &IndexMap<String, String> {
		&self.input_fields_by_output
	}

	/// Output fields that copy `input` verbatim.
	pub fn outputs_of(&self, input: &str) -> &[String] {
		self.output_sets_by_input_field.get(input).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn added_fields(&self) -> &[String] {
		&self.added_fields
	}

	pub fn dropped_fields(&self) -> &[String] {
		&self.dropped_fields
	}
}
