// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use indexmap::IndexMap;
use lattice_analysis::{Genesis, Nesting, OriginAnalysis, Origination};
use lattice_plan::{Branch, Input, JoinMode, NodeField, NodeKind, PNode, Plan, Predicate};
use lattice_testing::{fixtures, setup_logging};
use lattice_type::{Result, Type};

fn pipeline() -> Result<Plan> {
	let joined = fixtures::people_orders()?;
	let flagged = fixtures::project(
		"flagged",
		&joined,
		[
			("id", Input::field("id")),
			("owner", Input::field("id")),
			("amount", Input::field("amount")),
			("big", Input::constant(true, Type::Boolean)),
		],
	)?;
	let filtered = fixtures::filter("big", &flagged, Predicate::Field("big".to_string()))?;
	let state = fixtures::state("state", &filtered)?;
	Plan::new(fixtures::output("out", &state, &["sink"])?)
}

fn sources_of(analysis: &OriginAnalysis, node: &PNode, field: &str) -> Vec<(String, Genesis)> {
	analysis
		.sink_originations(&NodeField::new(node, field))
		.iter()
		.map(|o| (o.source.as_ref().map(ToString::to_string).unwrap_or_default(), o.genesis))
		.collect()
}

#[test]
fn test_every_field_covered() -> Result<()> {
	setup_logging();
	let plan = pipeline()?;
	let analysis = OriginAnalysis::analyze(&plan)?;
	for node in plan.toposorted() {
		for field in node.fields().names() {
			let originations = analysis.sink_originations(&NodeField::new(node, field));
			assert!(!originations.is_empty(), "{}.{} has no originations", node.name(), field);
			if originations.iter().any(Origination::is_leaf) {
				assert_eq!(originations.len(), 1, "{}.{} leaf must be exclusive", node.name(), field);
			}
		}
	}
	Ok(())
}

#[test]
fn test_sources_precede_sinks() -> Result<()> {
	let plan = pipeline()?;
	let analysis = OriginAnalysis::analyze(&plan)?;
	for origination in analysis.originations() {
		let Some(source) = &origination.source else {
			continue;
		};
		let sink_idx = plan.toposort_index(&origination.sink.node).unwrap();
		let source_idx = plan.toposort_index(&source.node).unwrap();
		assert!(source_idx < sink_idx, "{}", origination);
	}
	Ok(())
}

#[test]
fn test_leaves() -> Result<()> {
	let plan = pipeline()?;
	let analysis = OriginAnalysis::analyze(&plan)?;
	let mut leaves: Vec<String> = analysis.leaf_originations().map(|o| format!("{} {}", o.sink, o.genesis)).collect();
	leaves.sort();
	assert_eq!(
		leaves,
		vec![
			"flagged.big opaque",
			"orders.amount scan",
			"orders.bid scan",
			"orders.oid scan",
			"people.id scan",
			"people.name scan",
		]
	);
	Ok(())
}

#[test]
fn test_project_aliases_trace_to_same_source() -> Result<()> {
	let plan = pipeline()?;
	let analysis = OriginAnalysis::analyze(&plan)?;
	let flagged = plan.node("flagged").unwrap();
	assert_eq!(sources_of(&analysis, flagged, "id"), vec![("people_orders.id".to_string(), Genesis::Direct)]);
	assert_eq!(sources_of(&analysis, flagged, "owner"), vec![("people_orders.id".to_string(), Genesis::Direct)]);

	let joined_id = NodeField::new(plan.node("people_orders").unwrap(), "id");
	let readers: Vec<String> = analysis.source_originations(&joined_id).iter().map(|o| o.sink.to_string()).collect();
	assert_eq!(readers, vec!["flagged.id", "flagged.owner"]);
	Ok(())
}

#[test]
fn test_inner_join_keys_link_across_branches() -> Result<()> {
	let plan = pipeline()?;
	let analysis = OriginAnalysis::analyze(&plan)?;
	let joined = plan.node("people_orders").unwrap();
	assert_eq!(
		sources_of(&analysis, joined, "id"),
		vec![("people.id".to_string(), Genesis::InnerJoin), ("orders.bid".to_string(), Genesis::InnerJoin)]
	);
	assert_eq!(
		sources_of(&analysis, joined, "bid"),
		vec![("orders.bid".to_string(), Genesis::InnerJoin), ("people.id".to_string(), Genesis::InnerJoin)]
	);
	assert_eq!(sources_of(&analysis, joined, "amount"), vec![("orders.amount".to_string(), Genesis::InnerJoin)]);
	Ok(())
}

#[test]
fn test_left_join_genesis_follows_branch_role() -> Result<()> {
	let joined = fixtures::join(
		"joined",
		JoinMode::Left,
		vec![Branch::new(fixtures::people()?, ["id"]), Branch::new(fixtures::orders()?, ["bid"])],
	)?;
	let plan = Plan::new(joined.clone())?;
	let analysis = OriginAnalysis::analyze(&plan)?;
	assert_eq!(
		sources_of(&analysis, &joined, "id"),
		vec![("people.id".to_string(), Genesis::LeftJoinPrimary), ("orders.bid".to_string(), Genesis::LeftJoinPrimary)]
	);
	assert_eq!(
		sources_of(&analysis, &joined, "bid"),
		vec![
			("orders.bid".to_string(), Genesis::LeftJoinSecondary),
			("people.id".to_string(), Genesis::LeftJoinSecondary)
		]
	);
	assert_eq!(sources_of(&analysis, &joined, "oid"), vec![("orders.oid".to_string(), Genesis::LeftJoinSecondary)]);
	Ok(())
}

#[test]
fn test_group_list_is_generated() -> Result<()> {
	let items = fixtures::items()?;
	let group = fixtures::group("grouped", &items, "k", "rows")?;
	let plan = Plan::new(group.clone())?;
	let analysis = OriginAnalysis::analyze(&plan)?;
	assert_eq!(sources_of(&analysis, &group, "rows"), vec![(String::new(), Genesis::Group)]);
	assert_eq!(sources_of(&analysis, &group, "k"), vec![("items.k".to_string(), Genesis::Direct)]);
	Ok(())
}

#[test]
fn test_union_traces_every_source() -> Result<()> {
	let items = fixtures::items()?;
	let more = fixtures::scan("more", "more_items", &[("k", Type::Int8), ("v", Type::Utf8)], &["k"])?;
	let union = fixtures::union("all", &[&items, &more], Some("src"))?;
	let plan = Plan::new(union.clone())?;
	let analysis = OriginAnalysis::analyze(&plan)?;
	assert_eq!(
		sources_of(&analysis, &union, "v"),
		vec![("items.v".to_string(), Genesis::Direct), ("more.v".to_string(), Genesis::Direct)]
	);
	assert_eq!(sources_of(&analysis, &union, "src"), vec![(String::new(), Genesis::Opaque)]);
	Ok(())
}

#[test]
fn test_unnest_marks_struct_members() -> Result<()> {
	let items = fixtures::items()?;
	let group = fixtures::group("grouped", &items, "k", "rows")?;
	let mut unnested = IndexMap::new();
	unnested.insert("v".to_string(), Type::Utf8);
	let unnest = PNode::of(
		"flat",
		NodeKind::Unnest {
			source: group,
			list_field: "rows".to_string(),
			unnested_fields: unnested,
			index_field: Some("pos".to_string()),
		},
	)?;
	let plan = Plan::new(unnest.clone())?;
	let analysis = OriginAnalysis::analyze(&plan)?;

	let v = analysis.sink_originations(&NodeField::new(&unnest, "v"));
	assert_eq!(v.len(), 1);
	assert_eq!(v[0].source.as_ref().unwrap().to_string(), "grouped.rows");
	assert_eq!(v[0].nesting, Nesting::Unnested("v".to_string()));
	assert_eq!(sources_of(&analysis, &unnest, "pos"), vec![(String::new(), Genesis::Opaque)]);
	assert_eq!(sources_of(&analysis, &unnest, "rows"), vec![("grouped.rows".to_string(), Genesis::Direct)]);
	Ok(())
}

#[test]
fn test_struct_and_extract_nesting() -> Result<()> {
	let people = fixtures::people()?;
	let wrapped = PNode::of(
		"wrapped",
		NodeKind::Struct {
			source: people,
			ty: Type::structure([("pid", Type::Int8), ("pname", Type::Utf8)]),
			input_fields: vec!["id".to_string(), "name".to_string()],
			output_field: "person".to_string(),
		},
	)?;
	let extracted = PNode::of(
		"extracted",
		NodeKind::Extract {
			source: wrapped.clone(),
			source_field: "person".to_string(),
			struct_member: "pname".to_string(),
			output_field: "label".to_string(),
		},
	)?;
	let plan = Plan::new(extracted.clone())?;
	let analysis = OriginAnalysis::analyze(&plan)?;

	let nestings: Vec<(String, Nesting)> = analysis
		.sink_originations(&NodeField::new(&wrapped, "person"))
		.iter()
		.map(|o| (o.source.as_ref().unwrap().to_string(), o.nesting.clone()))
		.collect();
	assert_eq!(
		nestings,
		vec![
			("people.id".to_string(), Nesting::Nested("pid".to_string())),
			("people.name".to_string(), Nesting::Nested("pname".to_string())),
		]
	);

	let label = analysis.sink_originations(&NodeField::new(&extracted, "label"));
	assert_eq!(label.len(), 1);
	assert_eq!(label[0].nesting, Nesting::Unnested("pname".to_string()));
	assert_eq!(label[0].to_string(), "extracted.label <- wrapped.person (direct) unnested from pname");
	Ok(())
}

#[test]
fn test_struct_repeats_input_field() -> Result<()> {
	let people = fixtures::people()?;
	let wrapped = PNode::of(
		"wrapped",
		NodeKind::Struct {
			source: people,
			ty: Type::structure([("a", Type::Int8), ("b", Type::Int8)]),
			input_fields: vec!["id".to_string(), "id".to_string()],
			output_field: "pair".to_string(),
		},
	)?;
	let plan = Plan::new(wrapped.clone())?;
	let analysis = OriginAnalysis::analyze(&plan)?;

	let pair = analysis.sink_originations(&NodeField::new(&wrapped, "pair"));
	assert_eq!(pair.len(), 2);
	assert!(pair.iter().all(|o| o.source.as_ref().map(|s| s.to_string()) == Some("people.id".to_string())));
	assert_eq!(pair[0].nesting, Nesting::Nested("a".to_string()));
	assert_eq!(pair[1].nesting, Nesting::Nested("b".to_string()));
	Ok(())
}

#[test]
fn test_unify_merges_fields() -> Result<()> {
	let orders = fixtures::orders()?;
	let unify = PNode::of(
		"unified",
		NodeKind::Unify {
			source: orders,
			unified_fields: vec!["oid".to_string(), "bid".to_string()],
			output_field: "any_id".to_string(),
		},
	)?;
	let plan = Plan::new(unify.clone())?;
	let analysis = OriginAnalysis::analyze(&plan)?;
	assert_eq!(
		sources_of(&analysis, &unify, "any_id"),
		vec![("orders.oid".to_string(), Genesis::Direct), ("orders.bid".to_string(), Genesis::Direct)]
	);
	assert_eq!(sources_of(&analysis, &unify, "amount"), vec![("orders.amount".to_string(), Genesis::Direct)]);
	Ok(())
}

#[test]
fn test_search_is_unsupported() -> Result<()> {
	let search = PNode::of(
		"found",
		NodeKind::Search {
			source: fixtures::people()?,
			search: "name:ada".to_string(),
			output_field: "score".to_string(),
			output_type: Type::Float8,
		},
	)?;
	let plan = Plan::new(search)?;
	let err = OriginAnalysis::analyze(&plan).unwrap_err();
	assert_eq!(err.code(), "ANALYSIS_005");
	let diagnostic = err.diagnostic();
	assert_eq!(diagnostic.node.unwrap().name, "found");
	Ok(())
}
