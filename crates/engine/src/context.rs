// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use dashmap::DashMap;
use lattice_plan::{NodeId, PNode};
use lattice_type::Result;
use once_cell::sync::OnceCell;
use tracing::{instrument, trace};

use crate::{
	build,
	engine::Engine,
	key::{Key, RowId},
	row::Row,
};

/// Rows built for one node under one key.
pub type Rows = Arc<Vec<Row>>;

/// One build session.
///
/// Every `(node, key)` pair is built at most once per context, even when
/// several threads ask for it concurrently. No map lock is held while a node
/// is being built, so scanners may block freely.
pub struct BuildContext {
	engine: Engine,
	memo: DashMap<(PNode, Key), Arc<OnceCell<Rows>>>,
	cached: DashMap<(NodeId, RowId), Row>,
}

impl BuildContext {
	pub(crate) fn new(engine: Engine) -> Self {
		Self {
			engine,
			memo: DashMap::new(),
			cached: DashMap::new(),
		}
	}

	pub fn engine(&self) -> &Engine {
		&self.engine
	}

	#[instrument(name = "engine::context::build", level = "debug", skip(self, node), fields(node = node.name()))]
	pub fn build(&self, node: &PNode, key: &Key) -> Result<Rows> {
		let cell = self
			.memo
			.entry((node.clone(), key.clone()))
			.or_insert_with(|| Arc::new(OnceCell::new()))
			.value()
			.clone();

		if let Some(rows) = cell.get() {
			trace!(rows = rows.len(), "memo hit");
			return Ok(rows.clone());
		}

		let rows = cell.get_or_try_init(|| {
			trace!("memo miss");
			build::build(self, node, key).map(Arc::new)
		})?;
		Ok(rows.clone())
	}

	/// Number of distinct `(node, key)` builds started in this context.
	pub fn memoized(&self) -> usize {
		self.memo.len()
	}

	/// Returns the row a cache node produced earlier for the same id, or
	/// remembers this one.
	pub(crate) fn cache_row(&self, node: NodeId, row: Row) -> Row {
		let Some(id) = row.id.clone() else {
			return row;
		};
		self.cached.entry((node, id)).or_insert(row).value().clone()
	}
}

#[cfg(test)]
mod tests {
	use std::{collections::HashMap, thread};

	use indexmap::IndexMap;
	use lattice_plan::NodeKind;
	use lattice_type::{Type, Value};

	use super::*;
	use crate::row::Lineage;

	fn values_node() -> PNode {
		PNode::of(
			"numbers",
			NodeKind::Values {
				fields: IndexMap::from([("n".to_string(), Type::Int8)]),
				rows: vec![vec![Value::int8(1)], vec![Value::int8(2)]],
				index_field: None,
				strictness: Default::default(),
			},
		)
		.unwrap()
	}

	#[test]
	fn test_builds_once_per_key() {
		let context = Engine::builder().build().context();
		let node = values_node();
		let first = context.build(&node, &Key::All).unwrap();
		let second = context.build(&node, &Key::All).unwrap();
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(context.memoized(), 1);

		context.build(&node, &Key::field("n", 1i64)).unwrap();
		assert_eq!(context.memoized(), 2);
	}

	#[test]
	fn test_concurrent_builds_share_result() {
		let context = Engine::builder().build().context();
		let node = values_node();
		let results: Vec<Rows> = thread::scope(|scope| {
			let handles: Vec<_> = (0..4).map(|_| scope.spawn(|| context.build(&node, &Key::All).unwrap())).collect();
			handles.into_iter().map(|h| h.join().unwrap()).collect()
		});
		let ids: HashMap<_, _> = results.iter().map(|rows| (Arc::as_ptr(rows), ())).collect();
		assert_eq!(ids.len(), 1);
	}

	#[test]
	fn test_cache_row_keeps_first() {
		let context = Engine::builder().build().context();
		let node = NodeId::from_name("cache");
		let id = RowId::new(vec![1]);
		let first = Row::live(node, id.clone(), vec![Value::int8(1)], Lineage::default());
		let second = Row::live(node, id, vec![Value::int8(2)], Lineage::default());
		assert_eq!(context.cache_row(node, first.clone()), first);
		assert_eq!(context.cache_row(node, second), first);
	}
}
