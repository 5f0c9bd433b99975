// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::collections::BTreeSet;

use indexmap::IndexMap;
use lattice_plan::{
	Branch, CrossJoinMode, Denormalization, FieldAnnotation, FieldAnnotationKind, FunctionType, Input,
	Invalidation, Invalidations, JoinMode, Linking, LookupBranch, NodeAnnotation, NodeAnnotations, NodeKind, PFunction,
	PNode, Predicate, Strength, Strictness,
};
use lattice_testing::{fixtures, setup_logging};
use lattice_type::{Result, Type, Value};

fn flags() -> Result<PNode> {
	fixtures::scan("flags", "flags", &[("id", Type::Int8), ("name", Type::Utf8), ("active", Type::Boolean)], &["id"])
}

fn set(names: &[&str]) -> BTreeSet<String> {
	names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn test_scan_annotates_id_fields() -> Result<()> {
	setup_logging();
	let people = fixtures::people()?;
	assert!(people.is_leaf());
	assert!(people.fields().get("id").unwrap().has_annotation(FieldAnnotationKind::Id));
	assert!(!people.fields().get("name").unwrap().has_annotation(FieldAnnotationKind::Id));
	assert_eq!(people.kind_name(), "scan");
	Ok(())
}

#[test]
fn test_scan_rejects_unknown_id_field() {
	let err = fixtures::scan("s", "t", &[("a", Type::Int8)], &["b"]).unwrap_err();
	assert_eq!(err.code(), "FIELD_002");
}

#[test]
fn test_values_strict_rejects_wrong_literal() {
	let err = fixtures::values("v", &[("a", Type::Int8)], vec![vec![Value::utf8("x")]], None).unwrap_err();
	assert_eq!(err.code(), "NODE_001");
	assert_eq!(err.diagnostic().fields, vec!["a".to_string()]);
}

#[test]
fn test_values_non_strict_accepts_wrong_literal() -> Result<()> {
	let node = PNode::of(
		"v",
		NodeKind::Values {
			fields: fixtures::fields(&[("a", Type::Int8)]),
			rows: vec![vec![Value::utf8("x")]],
			index_field: Some("idx".to_string()),
			strictness: Strictness::NonStrict,
		},
	)?;
	assert_eq!(node.fields().names().collect::<Vec<_>>(), vec!["a", "idx"]);
	assert_eq!(node.fields().ty("idx"), Some(&Type::Int8));
	Ok(())
}

#[test]
fn test_values_rejects_short_row() {
	let err = fixtures::values("v", &[("a", Type::Int8), ("b", Type::Int8)], vec![vec![Value::int8(1)]], None)
		.unwrap_err();
	assert_eq!(err.code(), "NODE_001");
}

#[test]
fn test_filter_keeps_source_fields() -> Result<()> {
	let source = flags()?;
	let filter = fixtures::filter("active", &source, Predicate::Field("active".to_string()))?;
	assert_eq!(filter.fields().names().collect::<Vec<_>>(), vec!["id", "name", "active"]);
	assert!(filter.fields().get("id").unwrap().has_annotation(FieldAnnotationKind::Id));
	assert!(filter.source().unwrap().ptr_eq(&source));
	Ok(())
}

#[test]
fn test_filter_rejects_non_boolean_predicate() -> Result<()> {
	let source = flags()?;
	let err = fixtures::filter("bad", &source, Predicate::Field("name".to_string())).unwrap_err();
	assert_eq!(err.code(), "NODE_004");
	assert_eq!(err.diagnostic().node.unwrap().name, "bad");
	Ok(())
}

#[test]
fn test_filter_function_checks_signature() -> Result<()> {
	let source = flags()?;
	let eq = PFunction::new("eq_utf8", FunctionType::new(Type::Boolean, [Type::Utf8, Type::Utf8]));
	let ok = fixtures::filter(
		"ok",
		&source,
		Predicate::Function {
			function: eq.clone(),
			args: vec!["name".to_string(), "name".to_string()],
		},
	);
	assert!(ok.is_ok());

	let arity = fixtures::filter(
		"arity",
		&source,
		Predicate::Function {
			function: eq.clone(),
			args: vec!["name".to_string()],
		},
	)
	.unwrap_err();
	assert_eq!(arity.code(), "NODE_001");

	let typed = fixtures::filter(
		"typed",
		&source,
		Predicate::Function {
			function: eq,
			args: vec!["name".to_string(), "id".to_string()],
		},
	)
	.unwrap_err();
	assert_eq!(typed.code(), "NODE_004");
	Ok(())
}

#[test]
fn test_project_added_and_dropped_fields() -> Result<()> {
	let source = fixtures::scan("src", "t", &[("a", Type::Int8), ("b", Type::Utf8)], &[])?;
	let project = fixtures::project(
		"proj",
		&source,
		[("a", Input::field("a")), ("c", Input::constant(5i64, Type::Int8))],
	)?;
	assert_eq!(project.fields().names().collect::<Vec<_>>(), vec!["a", "c"]);
	let layout = project.projection_layout().unwrap();
	assert_eq!(layout.added_fields(), &["c".to_string()]);
	assert_eq!(layout.dropped_fields(), &["b".to_string()]);
	assert_eq!(layout.input_field("a"), Some("a"));
	assert_eq!(layout.input_field("c"), None);
	Ok(())
}

#[test]
fn test_project_function_type_checked() -> Result<()> {
	let source = fixtures::people()?;
	let upper = PFunction::new("upper", FunctionType::new(Type::Utf8, [Type::Utf8]));
	let project =
		fixtures::project("proj", &source, [("shout", Input::function(upper.clone(), [Input::field("name")]))])?;
	assert_eq!(project.fields().ty("shout"), Some(&Type::Utf8));

	let err = fixtures::project("bad", &source, [("shout", Input::function(upper, [Input::field("id")]))])
		.unwrap_err();
	assert_eq!(err.code(), "NODE_004");
	Ok(())
}

#[test]
fn test_project_rejects_missing_field() -> Result<()> {
	let source = fixtures::people()?;
	let err = fixtures::project("proj", &source, [("x", Input::field("missing"))]).unwrap_err();
	assert_eq!(err.code(), "FIELD_002");
	Ok(())
}

#[test]
fn test_project_keeps_transitive_annotations_of_references() -> Result<()> {
	let source = fixtures::people()?;
	let project = fixtures::project("proj", &source, [("pid", Input::field("id"))])?;
	assert!(project.fields().get("pid").unwrap().has_annotation(FieldAnnotationKind::Id));
	Ok(())
}

#[test]
fn test_join_guaranteed_equal_field_sets() -> Result<()> {
	let join = fixtures::people_orders()?;
	assert_eq!(join.fields().names().collect::<Vec<_>>(), vec!["id", "name", "oid", "bid", "amount"]);
	let layout = join.join_layout().unwrap();
	assert_eq!(layout.guaranteed_equal_field_sets(), &[set(&["bid", "id"])]);
	assert_eq!(layout.key_length(), 1);
	assert_eq!(layout.branch_index_of_field("amount"), Some(1));
	assert_eq!(layout.equivalent_fields("bid"), Some(&set(&["bid", "id"])));
	Ok(())
}

#[test]
fn test_left_join_guarantees_nothing() -> Result<()> {
	let join = fixtures::join(
		"left",
		JoinMode::Left,
		vec![Branch::new(fixtures::people()?, ["id"]), Branch::new(fixtures::orders()?, ["bid"])],
	)?;
	assert!(join.join_layout().unwrap().guaranteed_equal_field_sets().is_empty());
	Ok(())
}

#[test]
fn test_join_unifies_keys_transitively() -> Result<()> {
	let a = fixtures::scan("a", "a", &[("a1", Type::Int8), ("a2", Type::Int8)], &["a1"])?;
	let b = fixtures::scan("b", "b", &[("b1", Type::Int8), ("b2", Type::Int8)], &["b1"])?;
	let c = fixtures::scan("c", "c", &[("c1", Type::Int8), ("c2", Type::Int8)], &["c1"])?;
	let join = fixtures::join(
		"abc",
		JoinMode::Inner,
		vec![Branch::new(a, ["a1", "a2"]), Branch::new(b, ["b1", "b2"]), Branch::new(c, ["c1", "c2"])],
	)?;
	assert_eq!(
		join.join_layout().unwrap().guaranteed_equal_field_sets(),
		&[set(&["a1", "b1", "c1"]), set(&["a2", "b2", "c2"])]
	);
	Ok(())
}

#[test]
fn test_join_rejects_key_length_mismatch() -> Result<()> {
	let err = fixtures::join(
		"bad",
		JoinMode::Inner,
		vec![Branch::new(fixtures::people()?, ["id", "name"]), Branch::new(fixtures::orders()?, ["bid"])],
	)
	.unwrap_err();
	assert_eq!(err.code(), "NODE_006");
	Ok(())
}

#[test]
fn test_join_rejects_key_type_mismatch() -> Result<()> {
	let err = fixtures::join(
		"bad",
		JoinMode::Inner,
		vec![Branch::new(fixtures::people()?, ["name"]), Branch::new(fixtures::orders()?, ["bid"])],
	)
	.unwrap_err();
	assert_eq!(err.code(), "NODE_004");
	Ok(())
}

#[test]
fn test_join_rejects_overlapping_fields() -> Result<()> {
	let other = fixtures::scan("other", "other", &[("id", Type::Int8)], &["id"])?;
	let err = fixtures::join(
		"bad",
		JoinMode::Inner,
		vec![Branch::new(fixtures::people()?, ["id"]), Branch::new(other, ["id"])],
	)
	.unwrap_err();
	assert_eq!(err.code(), "FIELD_001");
	assert_eq!(err.diagnostic().node.unwrap().name, "bad");
	Ok(())
}

#[test]
fn test_cross_join_rejects_duplicate_field() -> Result<()> {
	let a = fixtures::scan("a", "a", &[("x", Type::Int8)], &[])?;
	let b = fixtures::scan("b", "b", &[("x", Type::Int8)], &[])?;
	let err = PNode::of(
		"cross",
		NodeKind::CrossJoin {
			sources: vec![a, b],
			mode: CrossJoinMode::Inner,
		},
	)
	.unwrap_err();
	assert_eq!(err.code(), "FIELD_001");
	Ok(())
}

#[test]
fn test_duplicate_source_rejected() -> Result<()> {
	let a = fixtures::scan("a", "a", &[("x", Type::Int8)], &[])?;
	let err = PNode::of(
		"cross",
		NodeKind::CrossJoin {
			sources: vec![a.clone(), a],
			mode: CrossJoinMode::Full,
		},
	)
	.unwrap_err();
	assert_eq!(err.code(), "NODE_003");
	Ok(())
}

#[test]
fn test_sourceless_union_is_leaf_mismatch() {
	let err = fixtures::union("u", &[], None).unwrap_err();
	assert_eq!(err.code(), "NODE_002");
}

#[test]
fn test_lookup_join_keeps_source_fields() -> Result<()> {
	let orders = fixtures::orders()?;
	let owners = fixtures::scan("owners", "owners", &[("bid", Type::Int8), ("owner", Type::Utf8)], &["bid"])?;
	let lookup = PNode::of(
		"lookup",
		NodeKind::LookupJoin {
			source: orders,
			source_key_fields: vec!["bid".to_string()],
			branches: vec![LookupBranch::new(owners.clone(), ["bid"])],
		},
	)?;
	assert_eq!(lookup.fields().names().collect::<Vec<_>>(), vec!["oid", "bid", "amount"]);
	assert_eq!(lookup.sources().len(), 2);

	let err = PNode::of(
		"lookup_bad",
		NodeKind::LookupJoin {
			source: fixtures::orders()?,
			source_key_fields: vec!["bid".to_string()],
			branches: vec![LookupBranch::new(owners, ["owner"])],
		},
	)
	.unwrap_err();
	assert_eq!(err.code(), "FIELD_002");
	Ok(())
}

#[test]
fn test_group_fields() -> Result<()> {
	let group = fixtures::group("grouped", &fixtures::items()?, "k", "items")?;
	assert_eq!(group.fields().names().collect::<Vec<_>>(), vec!["k", "items"]);
	assert!(group.fields().get("k").unwrap().has_annotation(FieldAnnotationKind::Id));
	assert_eq!(
		group.fields().ty("items"),
		Some(&Type::list(Type::structure([("k", Type::Int8), ("v", Type::Utf8)])))
	);
	Ok(())
}

#[test]
fn test_group_rejects_list_field_collision() -> Result<()> {
	let err = fixtures::group("grouped", &fixtures::items()?, "k", "k").unwrap_err();
	assert_eq!(err.code(), "NODE_005");
	Ok(())
}

#[test]
fn test_union_common_annotations_and_index() -> Result<()> {
	let a = fixtures::scan("a", "a", &[("x", Type::Int8), ("y", Type::Utf8)], &["x"])?;
	let b = fixtures::scan("b", "b", &[("x", Type::Int8), ("y", Type::Utf8)], &[])?;
	let union = fixtures::union("u", &[&a, &b], Some("src"))?;
	assert_eq!(union.fields().names().collect::<Vec<_>>(), vec!["x", "y", "src"]);
	assert!(!union.fields().get("x").unwrap().has_annotation(FieldAnnotationKind::Id));
	Ok(())
}

#[test]
fn test_union_rejects_differing_fields() -> Result<()> {
	let a = fixtures::scan("a", "a", &[("x", Type::Int8), ("y", Type::Utf8)], &[])?;
	let b = fixtures::scan("b", "b", &[("x", Type::Int8), ("z", Type::Utf8)], &[])?;
	let err = fixtures::union("u", &[&a, &b], None).unwrap_err();
	assert_eq!(err.code(), "NODE_001");
	assert_eq!(err.diagnostic().fields, vec!["y".to_string(), "z".to_string()]);
	Ok(())
}

#[test]
fn test_unnest_struct_members() -> Result<()> {
	let group = fixtures::group("grouped", &fixtures::items()?, "k", "items")?;
	let mut unnested = IndexMap::new();
	unnested.insert("v".to_string(), Type::Utf8);
	let unnest = PNode::of(
		"unnest",
		NodeKind::Unnest {
			source: group,
			list_field: "items".to_string(),
			unnested_fields: unnested,
			index_field: Some("pos".to_string()),
		},
	)?;
	assert_eq!(unnest.fields().names().collect::<Vec<_>>(), vec!["k", "items", "pos", "v"]);
	Ok(())
}

#[test]
fn test_unnest_rejects_non_list() -> Result<()> {
	let mut unnested = IndexMap::new();
	unnested.insert("c".to_string(), Type::Utf8);
	let err = PNode::of(
		"unnest",
		NodeKind::Unnest {
			source: fixtures::people()?,
			list_field: "name".to_string(),
			unnested_fields: unnested,
			index_field: None,
		},
	)
	.unwrap_err();
	assert_eq!(err.code(), "NODE_001");
	Ok(())
}

#[test]
fn test_struct_extract_unify() -> Result<()> {
	let pair = fixtures::scan("pair", "pair", &[("l", Type::Int8), ("r", Type::Int8), ("tag", Type::Utf8)], &[])?;
	let ty = Type::structure([("left", Type::Int8), ("right", Type::Int8)]);
	let packed = PNode::of(
		"packed",
		NodeKind::Struct {
			source: pair.clone(),
			ty: ty.clone(),
			input_fields: vec!["l".to_string(), "r".to_string()],
			output_field: "lr".to_string(),
		},
	)?;
	assert_eq!(packed.fields().ty("lr"), Some(&ty));

	let extracted = PNode::of(
		"extracted",
		NodeKind::Extract {
			source: packed,
			source_field: "lr".to_string(),
			struct_member: "right".to_string(),
			output_field: "r2".to_string(),
		},
	)?;
	assert_eq!(extracted.fields().ty("r2"), Some(&Type::Int8));

	let unified = PNode::of(
		"unified",
		NodeKind::Unify {
			source: pair.clone(),
			unified_fields: vec!["l".to_string(), "r".to_string()],
			output_field: "v".to_string(),
		},
	)?;
	assert_eq!(unified.fields().names().collect::<Vec<_>>(), vec!["tag", "v"]);

	let err = PNode::of(
		"bad",
		NodeKind::Unify {
			source: pair,
			unified_fields: vec!["l".to_string(), "tag".to_string()],
			output_field: "v".to_string(),
		},
	)
	.unwrap_err();
	assert_eq!(err.code(), "NODE_004");
	Ok(())
}

#[test]
fn test_extract_rejects_existing_output() -> Result<()> {
	let pair = fixtures::scan("pair", "pair", &[("l", Type::Int8), ("r", Type::Int8)], &[])?;
	let packed = PNode::of(
		"packed",
		NodeKind::Struct {
			source: pair,
			ty: Type::structure([("left", Type::Int8), ("right", Type::Int8)]),
			input_fields: vec!["l".to_string(), "r".to_string()],
			output_field: "lr".to_string(),
		},
	)?;
	let err = PNode::of(
		"extracted",
		NodeKind::Extract {
			source: packed,
			source_field: "lr".to_string(),
			struct_member: "left".to_string(),
			output_field: "l".to_string(),
		},
	)
	.unwrap_err();
	assert_eq!(err.code(), "NODE_005");
	Ok(())
}

#[test]
fn test_struct_rejects_empty_type() -> Result<()> {
	let people = fixtures::people()?;
	let err = PNode::of(
		"unit",
		NodeKind::Struct {
			source: people,
			ty: Type::structure(Vec::<(&str, Type)>::new()),
			input_fields: vec![],
			output_field: "unit".to_string(),
		},
	)
	.unwrap_err();
	assert_eq!(err.code(), "NODE_001");
	Ok(())
}

#[test]
fn test_state_validates_invalidation_key_fields() -> Result<()> {
	let people = fixtures::people()?;
	let mut keys = IndexMap::new();
	keys.insert("id".to_string(), "missing".to_string());
	let err = PNode::of(
		"state",
		NodeKind::State {
			source: people.clone(),
			denormalization: Denormalization::Input,
			invalidations: Invalidations::new().with(
				people.id(),
				Invalidation {
					key_fields_by_source_field: keys,
					update_mask: None,
					strength: Strength::Weak,
				},
			),
			id_fields: None,
		},
	)
	.unwrap_err();
	assert_eq!(err.code(), "FIELD_002");
	Ok(())
}

#[test]
fn test_scope_exit_requires_upstream_scope() -> Result<()> {
	let scope = PNode::of(
		"outer",
		NodeKind::Scope {
			source: fixtures::people()?,
		},
	)?;
	let exit = PNode::of(
		"exit",
		NodeKind::ScopeExit {
			source: scope.clone(),
			scope: "outer".to_string(),
		},
	);
	assert!(exit.is_ok());

	let err = PNode::of(
		"exit",
		NodeKind::ScopeExit {
			source: scope,
			scope: "inner".to_string(),
		},
	)
	.unwrap_err();
	assert_eq!(err.code(), "NODE_001");
	Ok(())
}

#[test]
fn test_search_adds_output_field() -> Result<()> {
	let search = PNode::of(
		"search",
		NodeKind::Search {
			source: fixtures::people()?,
			search: "name ~ 'a*'".to_string(),
			output_field: "score".to_string(),
			output_type: Type::Float8,
		},
	)?;
	assert_eq!(search.fields().ty("score"), Some(&Type::Float8));
	Ok(())
}

#[test]
fn test_field_annotation_target_must_exist() -> Result<()> {
	let err = PNode::new(
		"cache",
		NodeAnnotations::new().with_field("missing", FieldAnnotation::sealed()),
		NodeKind::Cache {
			source: fixtures::people()?,
		},
	)
	.unwrap_err();
	assert_eq!(err.code(), "ANNOTATION_001");
	Ok(())
}

#[test]
fn test_field_annotation_validator_runs() -> Result<()> {
	let err = PNode::new(
		"cache",
		NodeAnnotations::new().with_field("name", FieldAnnotation::monotonic()),
		NodeKind::Cache {
			source: fixtures::people()?,
		},
	)
	.unwrap_err();
	assert_eq!(err.code(), "ANNOTATION_002");

	let ok = PNode::new(
		"cache",
		NodeAnnotations::new().with(NodeAnnotation::Exposed).with_field("id", FieldAnnotation::monotonic()),
		NodeKind::Cache {
			source: fixtures::people()?,
		},
	)?;
	assert!(ok.fields().get("id").unwrap().has_annotation(FieldAnnotationKind::Monotonic));
	Ok(())
}

#[test]
fn test_identity_not_structure() -> Result<()> {
	let a = fixtures::people()?;
	let b = fixtures::people()?;
	assert_ne!(a, b);
	assert_eq!(a.id(), b.id());
	assert_eq!(a, a.clone());
	Ok(())
}

#[test]
fn test_filter_linking_defaults_to_linked() {
	assert_eq!(Linking::default(), Linking::Linked);
}
