// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_plan::{CrossJoinMode, Input, JoinMode, NodeField, NodeKind, PNode};
use lattice_type::Result;

use super::{Genesis, Nesting, Origination};
use crate::error::AnalysisError;

/// Appends the originations of every field of `node`. Sources must already
/// have been visited.
pub(super) fn originate(node: &PNode, out: &mut Vec<Origination>) -> Result<()> {
	let at = |field: &str| NodeField::new(node, field);

	match node.kind() {
		NodeKind::Scan {
			..
		} => {
			for field in node.fields().names() {
				out.push(Origination::leaf(at(field), Genesis::Scan));
			}
		}

		NodeKind::Values {
			..
		} => {
			for field in node.fields().names() {
				out.push(Origination::leaf(at(field), Genesis::Values));
			}
		}

		NodeKind::Filter {
			source,
			..
		}
		| NodeKind::Cache {
			source,
		}
		| NodeKind::State {
			source,
			..
		}
		| NodeKind::Output {
			source,
			..
		} => direct(node, source, node.fields().names(), out),

		NodeKind::Project {
			source,
			projection,
		} => {
			for (output, input) in projection {
				match input {
					Input::Field(field) => {
						out.push(Origination::derived(at(output), NodeField::new(source, field), Genesis::Direct))
					}
					Input::Constant {
						..
					}
					| Input::Function {
						..
					} => out.push(Origination::leaf(at(output), Genesis::Opaque)),
				}
			}
		}

		NodeKind::Join {
			branches,
			mode,
		} => {
			for (idx, branch) in branches.iter().enumerate() {
				let genesis = match mode {
					JoinMode::Inner => Genesis::InnerJoin,
					JoinMode::Left if idx == 0 => Genesis::LeftJoinPrimary,
					JoinMode::Left => Genesis::LeftJoinSecondary,
					JoinMode::Full => Genesis::FullJoin,
				};
				for field in branch.node.fields().names() {
					out.push(Origination::derived(at(field), NodeField::new(&branch.node, field), genesis));
				}
				for (other_idx, other) in branches.iter().enumerate() {
					if other_idx == idx {
						continue;
					}
					for (key, other_key) in branch.key_fields.iter().zip(other.key_fields.iter()) {
						out.push(Origination::derived(at(key), NodeField::new(&other.node, other_key), genesis));
					}
				}
			}
		}

		NodeKind::CrossJoin {
			sources,
			mode,
		} => {
			let genesis = match mode {
				CrossJoinMode::Inner => Genesis::InnerJoin,
				CrossJoinMode::Full => Genesis::FullJoin,
			};
			for source in sources {
				for field in source.fields().names() {
					out.push(Origination::derived(at(field), NodeField::new(source, field), genesis));
				}
			}
		}

		NodeKind::LookupJoin {
			source,
			branches,
			..
		} => {
			direct(node, source, source.fields().names(), out);
			for branch in branches {
				for field in &branch.fields {
					out.push(Origination::derived(at(field), NodeField::new(&branch.node, field), Genesis::LookupJoin));
				}
			}
		}

		NodeKind::Group {
			source,
			key_fields,
			list_field,
		} => {
			out.push(Origination::leaf(at(list_field), Genesis::Group));
			direct(node, source, key_fields.iter().map(String::as_str), out);
		}

		NodeKind::Union {
			sources,
			index_field,
		} => {
			for field in node.fields().names() {
				if Some(field) == index_field.as_deref() {
					out.push(Origination::leaf(at(field), Genesis::Opaque));
					continue;
				}
				for source in sources {
					out.push(Origination::derived(at(field), NodeField::new(source, field), Genesis::Direct));
				}
			}
		}

		NodeKind::Unnest {
			source,
			list_field,
			unnested_fields,
			index_field,
		} => {
			direct(node, source, source.fields().names(), out);
			if let Some(index_field) = index_field {
				out.push(Origination::leaf(at(index_field), Genesis::Opaque));
			}
			let element_is_struct =
				source.fields().ty(list_field).and_then(|ty| ty.as_list()).is_some_and(|el| el.as_struct().is_some());
			for field in unnested_fields.keys() {
				let origination = Origination::derived(at(field), NodeField::new(source, list_field), Genesis::Direct);
				out.push(if element_is_struct {
					origination.with_nesting(Nesting::Unnested(field.clone()))
				} else {
					origination
				});
			}
		}

		NodeKind::Extract {
			source,
			source_field,
			struct_member,
			output_field,
		} => {
			direct(node, source, source.fields().names(), out);
			out.push(
				Origination::derived(at(output_field), NodeField::new(source, source_field), Genesis::Direct)
					.with_nesting(Nesting::Unnested(struct_member.clone())),
			);
		}

		NodeKind::Struct {
			source,
			ty,
			input_fields,
			output_field,
		} => {
			direct(node, source, source.fields().names(), out);
			let members = ty.as_struct().map(|st| st.members.as_slice()).unwrap_or(&[]);
			for (input, member) in input_fields.iter().zip(members.iter()) {
				out.push(
					Origination::derived(at(output_field), NodeField::new(source, input), Genesis::Direct)
						.with_nesting(Nesting::Nested(member.name.clone())),
				);
			}
		}

		NodeKind::Unify {
			source,
			unified_fields,
			output_field,
		} => {
			let kept = node.fields().names().filter(|f| f != output_field);
			direct(node, source, kept, out);
			for field in unified_fields {
				out.push(Origination::derived(at(output_field), NodeField::new(source, field), Genesis::Direct));
			}
		}

		NodeKind::Search {
			..
		}
		| NodeKind::Scope {
			..
		}
		| NodeKind::ScopeExit {
			..
		} => {
			return Err(AnalysisError::UnsupportedNode {
				node: node.name().to_string(),
				kind: node.kind_name(),
			}
			.into());
		}
	}
	Ok(())
}

fn direct<'a>(node: &PNode, source: &PNode, fields: impl Iterator<Item = &'a str>, out: &mut Vec<Origination>) {
	for field in fields {
		out.push(Origination::derived(NodeField::new(node, field), NodeField::new(source, field), Genesis::Direct));
	}
}
