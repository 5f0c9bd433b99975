// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_analysis::{Genesis, OriginAnalysis};
use lattice_plan::{Input, NodeField, Plan, Predicate};
use lattice_testing::{fixtures, setup_logging};
use lattice_type::{Result, Type};

/// people ─┐
///         ├─ people_orders ── flagged ── big ── state ── out
/// orders ─┘
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

fn field(plan: &Plan, node: &str, field: &str) -> NodeField {
	NodeField::new(plan.node(node).unwrap(), field)
}

fn first_sinks(analysis: &lattice_analysis::ChainAnalysis, sink: &NodeField) -> Vec<String> {
	let mut sinks: Vec<String> =
		analysis.first_origination_set(sink).unwrap().iter().map(|o| o.sink.to_string()).collect();
	sinks.sort();
	sinks
}

#[test]
fn test_chain_analysis_is_idempotent() -> Result<()> {
	setup_logging();
	let plan = pipeline()?;
	let origins = OriginAnalysis::analyze(&plan)?;
	let first = origins.leaf_chain_analysis();
	let second = origins.leaf_chain_analysis();
	assert_eq!(first.first_origination_sets_by_sink(), second.first_origination_sets_by_sink());

	let first = origins.state_chain_analysis();
	let second = origins.state_chain_analysis();
	assert_eq!(first.first_origination_sets_by_sink(), second.first_origination_sets_by_sink());
	Ok(())
}

#[test]
fn test_leaf_chains_reach_scans() -> Result<()> {
	let plan = pipeline()?;
	let chains = OriginAnalysis::analyze(&plan)?.leaf_chain_analysis();
	assert!(chains.split_originations().is_empty());

	assert_eq!(first_sinks(&chains, &field(&plan, "out", "id")), vec!["orders.bid", "people.id"]);
	assert_eq!(first_sinks(&chains, &field(&plan, "out", "amount")), vec!["orders.amount"]);
	assert_eq!(first_sinks(&chains, &field(&plan, "out", "big")), vec!["flagged.big"]);

	for first in chains.first_originations() {
		assert!(first.is_leaf(), "{} is not a leaf", first);
	}
	Ok(())
}

#[test]
fn test_state_chains_stop_at_state() -> Result<()> {
	let plan = pipeline()?;
	let chains = OriginAnalysis::analyze(&plan)?.state_chain_analysis();

	let firsts = chains.first_origination_set(&field(&plan, "out", "id")).unwrap();
	assert_eq!(firsts.len(), 1);
	let first = firsts.first().unwrap();
	assert_eq!(first.to_string(), "state.id <- big.id (direct)");
	assert!(chains.is_split(first));

	// upstream of the state nothing splits
	assert_eq!(first_sinks(&chains, &field(&plan, "big", "id")), vec!["orders.bid", "people.id"]);
	Ok(())
}

#[test]
fn test_first_sets_per_origination() -> Result<()> {
	let plan = pipeline()?;
	let origins = OriginAnalysis::analyze(&plan)?;
	let chains = origins.leaf_chain_analysis();
	let joined_id = field(&plan, "people_orders", "id");
	for origination in origins.sink_originations(&joined_id) {
		let set = chains.first_origination_set_of(origination).unwrap();
		assert_eq!(set.len(), 1);
		let first = set.first().unwrap();
		assert_eq!(&first.sink, origination.source.as_ref().unwrap());
		assert_eq!(first.genesis, Genesis::Scan);
	}
	Ok(())
}

#[test]
fn test_sink_sets_by_first_source() -> Result<()> {
	let plan = pipeline()?;
	let chains = OriginAnalysis::analyze(&plan)?.leaf_chain_analysis();
	let sinks = chains.sink_sets_by_first_source().get(&field(&plan, "people", "id")).unwrap();
	for expected in [
		field(&plan, "people", "id"),
		field(&plan, "people_orders", "bid"),
		field(&plan, "flagged", "owner"),
		field(&plan, "out", "id"),
	] {
		assert!(sinks.contains(&expected), "missing {}", expected);
	}
	assert!(!sinks.contains(&field(&plan, "out", "amount")));
	Ok(())
}

#[test]
fn test_paths_back_to_source() -> Result<()> {
	let plan = pipeline()?;
	let chains = OriginAnalysis::analyze(&plan)?.leaf_chain_analysis();

	let paths = chains.paths(&field(&plan, "out", "id"), &field(&plan, "people", "id"));
	assert_eq!(paths.len(), 1);
	let sinks: Vec<String> = paths[0].iter().map(|o| o.sink.to_string()).collect();
	assert_eq!(sinks, vec!["out.id", "state.id", "big.id", "flagged.id", "people_orders.id", "people.id"]);

	// both originations of the join key end at the join
	let paths = chains.paths(&field(&plan, "out", "id"), &field(&plan, "people_orders", "id"));
	assert_eq!(paths.len(), 2);
	let sources: Vec<String> =
		paths.iter().map(|path| path.last().unwrap().source.as_ref().unwrap().to_string()).collect();
	assert_eq!(sources, vec!["people.id", "orders.bid"]);

	assert!(chains.paths(&field(&plan, "out", "amount"), &field(&plan, "people", "id")).is_empty());
	Ok(())
}

#[test]
fn test_links_render_backward_tree() -> Result<()> {
	let plan = pipeline()?;
	let chains = OriginAnalysis::analyze(&plan)?.leaf_chain_analysis();
	let links = chains.links(&field(&plan, "flagged", "owner"));
	assert_eq!(links.len(), 1);
	let rendered = links[0].to_string();
	let lines: Vec<&str> = rendered.lines().collect();
	assert_eq!(
		lines,
		vec![
			"flagged.owner <- people_orders.id (direct)",
			"  people_orders.id <- people.id (inner_join)",
			"    people.id (scan)",
			"  people_orders.id <- orders.bid (inner_join)",
			"    orders.bid (scan)",
		]
	);
	Ok(())
}
