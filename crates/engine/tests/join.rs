// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_engine::{Engine, FieldKey, Key, PostcardRowIdCodec, RowId, RowIdCodec};
use lattice_plan::{Branch, CrossJoinMode, JoinMode, LookupBranch, NodeKind, PNode};
use lattice_testing::{MemoryScanner, fixtures, setup_logging};
use lattice_type::{Result, Type, Value};

fn scanner() -> MemoryScanner {
	MemoryScanner::new()
		.with_table("people", &["id", "name"])
		.with_row("people", vec![Value::int8(1), Value::utf8("ann")])
		.with_row("people", vec![Value::int8(2), Value::utf8("bob")])
		.with_table("orders", &["oid", "bid", "amount"])
		.with_row("orders", vec![Value::int8(10), Value::int8(1), Value::int8(5)])
		.with_row("orders", vec![Value::int8(11), Value::int8(1), Value::int8(7)])
		.with_row("orders", vec![Value::int8(12), Value::int8(3), Value::int8(9)])
		.with_table("buyers", &["bid", "tier"])
		.with_row("buyers", vec![Value::int8(1), Value::utf8("gold")])
}

fn engine(scanner: &MemoryScanner) -> Engine {
	Engine::builder()
		.scanner("people", scanner.clone())
		.scanner("orders", scanner.clone())
		.scanner("buyers", scanner.clone())
		.build()
}

fn joined(mode: JoinMode) -> Result<PNode> {
	fixtures::join(
		"joined",
		mode,
		vec![Branch::new(fixtures::people()?, ["id"]), Branch::new(fixtures::orders()?, ["bid"])],
	)
}

fn composite(ids: &[Option<(&str, i64)>]) -> Result<RowId> {
	let codec = PostcardRowIdCodec;
	let parts = ids
		.iter()
		.map(|id| id.map(|(field, value)| codec.encode(&FieldKey::single(field, value))).transpose())
		.collect::<Result<Vec<_>>>()?;
	codec.join(&parts)
}

fn attributes(rows: &[lattice_engine::Row]) -> Vec<Option<Vec<Value>>> {
	rows.iter().map(|row| row.attributes.clone()).collect()
}

fn ints(values: &[i64]) -> Vec<Value> {
	values.iter().map(|v| Value::int8(*v)).collect()
}

#[test]
fn test_inner_join_all() -> Result<()> {
	setup_logging();
	let joined = joined(JoinMode::Inner)?;
	let rows = engine(&scanner()).context().build(&joined, &Key::All)?;
	assert_eq!(
		attributes(&rows),
		vec![
			Some(vec![Value::int8(1), Value::utf8("ann"), Value::int8(10), Value::int8(1), Value::int8(5)]),
			Some(vec![Value::int8(1), Value::utf8("ann"), Value::int8(11), Value::int8(1), Value::int8(7)]),
		]
	);
	assert_eq!(rows[0].id, Some(composite(&[Some(("id", 1)), Some(("oid", 10))])?));
	assert_eq!(rows[0].lineage.len(), 2, "one entry per contributing branch row");
	Ok(())
}

#[test]
fn test_join_routes_field_key_to_owning_branch() -> Result<()> {
	let joined = joined(JoinMode::Inner)?;
	let scanner = scanner();
	let rows = engine(&scanner).context().build(&joined, &Key::field("amount", 7i64))?;
	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].id, Some(composite(&[Some(("id", 1)), Some(("oid", 11))])?));
	assert_eq!(
		scanner.scans(),
		vec![
			("orders".to_string(), Key::field("amount", 7i64)),
			("people".to_string(), Key::field("id", 1i64)),
		],
		"the keyed branch is built first, the other by join key"
	);
	Ok(())
}

#[test]
fn test_join_key_on_several_branches() -> Result<()> {
	let joined = joined(JoinMode::Inner)?;
	let context = engine(&scanner()).context();

	let rows = context.build(&joined, &FieldKey::new().with("id", 1i64).with("amount", 5i64).into())?;
	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].id, Some(composite(&[Some(("id", 1)), Some(("oid", 10))])?));

	let rows = context.build(&joined, &FieldKey::new().with("id", 1i64).with("bid", 2i64).into())?;
	assert!(rows.is_empty(), "a key contradicting the join condition selects nothing");
	Ok(())
}

#[test]
fn test_join_unroutable_key() -> Result<()> {
	let joined = joined(JoinMode::Inner)?;
	let err = engine(&scanner()).context().build(&joined, &Key::field("nope", 1i64)).unwrap_err();
	assert_eq!(err.code(), "BUILD_001");
	assert_eq!(err.0.fields, vec!["nope".to_string()]);
	Ok(())
}

#[test]
fn test_left_join_fills_nulls() -> Result<()> {
	let joined = joined(JoinMode::Left)?;
	let context = engine(&scanner()).context();

	let rows = context.build(&joined, &Key::field("id", 2i64))?;
	assert_eq!(rows.len(), 1);
	assert_eq!(
		rows[0].attributes,
		Some(vec![Value::int8(2), Value::utf8("bob"), Value::Undefined, Value::Undefined, Value::Undefined])
	);
	assert_eq!(rows[0].id, Some(composite(&[Some(("id", 2)), None])?));

	assert_eq!(context.build(&joined, &Key::All)?.len(), 3);

	let by_id = context.build(&joined, &Key::Id(composite(&[Some(("id", 2)), None])?))?;
	assert_eq!(by_id[0], rows[0]);
	Ok(())
}

#[test]
fn test_full_join_all() -> Result<()> {
	let joined = joined(JoinMode::Full)?;
	let rows = engine(&scanner()).context().build(&joined, &Key::All)?;
	assert_eq!(rows.len(), 4, "two matches, one unmatched person, one unmatched order");
	assert_eq!(
		rows[3].attributes,
		Some(vec![Value::Undefined, Value::Undefined, Value::int8(12), Value::int8(3), Value::int8(9)])
	);
	assert_eq!(rows[3].id, Some(composite(&[None, Some(("oid", 12))])?));
	Ok(())
}

#[test]
fn test_join_by_id() -> Result<()> {
	let joined = joined(JoinMode::Inner)?;
	let scanner = scanner();
	let engine = engine(&scanner);
	let id = composite(&[Some(("id", 1)), Some(("oid", 10))])?;

	let rows = engine.context().build(&joined, &Key::Id(id.clone()))?;
	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].attributes, Some(vec![Value::int8(1), Value::utf8("ann"), Value::int8(10), Value::int8(1), Value::int8(5)]));

	scanner.delete("orders", "oid", &Value::int8(10));
	scanner.insert("orders", ints(&[10, 2, 5]));
	let rows = engine.context().build(&joined, &Key::Id(id.clone()))?;
	assert!(rows[0].is_tombstone(), "the order moved to another person");
	assert_eq!(rows[0].id, Some(id.clone()));

	scanner.delete("orders", "oid", &Value::int8(10));
	let rows = engine.context().build(&joined, &Key::Id(id.clone()))?;
	assert!(rows[0].is_tombstone());

	let err = engine.context().build(&joined, &Key::Id(composite(&[Some(("id", 1))])?)).unwrap_err();
	assert_eq!(err.code(), "BUILD_007");
	Ok(())
}

fn colors(name: &str, rows: &[&str]) -> Result<PNode> {
	fixtures::values(name, &[("color", Type::Utf8)], rows.iter().map(|c| vec![Value::utf8(*c)]).collect(), None)
}

fn cross(mode: CrossJoinMode, colors: PNode) -> Result<PNode> {
	PNode::of(
		"crossed",
		NodeKind::CrossJoin {
			sources: vec![fixtures::people()?, colors],
			mode,
		},
	)
}

#[test]
fn test_cross_join() -> Result<()> {
	let crossed = cross(CrossJoinMode::Inner, colors("colors", &["red", "blue"])?)?;
	let context = engine(&scanner()).context();

	let rows = context.build(&crossed, &Key::All)?;
	assert_eq!(rows.len(), 4);
	assert_eq!(rows[1].attributes, Some(vec![Value::int8(1), Value::utf8("ann"), Value::utf8("blue")]));

	let red = context.build(&crossed, &Key::field("color", "red"))?;
	assert_eq!(red.len(), 2);
	assert!(red.iter().all(|row| row.attributes.as_ref().is_some_and(|a| a[2] == Value::utf8("red"))));

	let Some(id) = rows[2].id.clone() else {
		panic!("live row without id");
	};
	let by_id = context.build(&crossed, &Key::Id(id))?;
	assert_eq!(by_id[0], rows[2]);

	let err = context.build(&crossed, &Key::field("shade", "red")).unwrap_err();
	assert_eq!(err.code(), "BUILD_001");
	Ok(())
}

#[test]
fn test_cross_join_with_empty_source() -> Result<()> {
	let context = engine(&scanner()).context();

	let inner = cross(CrossJoinMode::Inner, colors("colors", &[])?)?;
	assert!(context.build(&inner, &Key::All)?.is_empty());

	let full = cross(CrossJoinMode::Full, colors("colors", &[])?)?;
	let rows = context.build(&full, &Key::All)?;
	assert_eq!(rows.len(), 2);
	assert_eq!(rows[0].attributes, Some(vec![Value::int8(1), Value::utf8("ann"), Value::Undefined]));
	Ok(())
}

#[test]
fn test_lookup_join() -> Result<()> {
	let buyers = fixtures::scan("buyers", "buyers", &[("bid", Type::Int8), ("tier", Type::Utf8)], &["bid"])?;
	let qualified = PNode::of(
		"qualified",
		NodeKind::LookupJoin {
			source: fixtures::orders()?,
			source_key_fields: vec!["oid".to_string()],
			branches: vec![LookupBranch::new(buyers.clone(), ["bid"])],
		},
	)?;
	let context = engine(&scanner()).context();

	let rows = context.build(&qualified, &Key::All)?;
	assert_eq!(rows.len(), 3);
	assert!(rows[0].is_live() && rows[1].is_live());
	assert_eq!(rows[0].attributes, Some(ints(&[10, 1, 5])), "only source fields are kept");
	assert!(rows[2].is_tombstone(), "order 12 has no buyer");

	let buyer = PostcardRowIdCodec.encode(&FieldKey::single("bid", 1i64))?;
	assert!(rows[0].lineage.contains(buyers.id(), &buyer));
	Ok(())
}
