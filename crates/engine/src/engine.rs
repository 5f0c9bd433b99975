// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::HashMap, ops::Deref, sync::Arc};

use tracing::debug;

use crate::{
	codec::{PostcardRowIdCodec, RowIdCodec},
	context::BuildContext,
	function::{Function, FunctionRegistry, Functions, FunctionsBuilder},
	lineage::{GranularLineagePolicy, LineageGranularity, LineagePolicy},
	scanner::Scanner,
};

/// Builds rows of plans. Cloning is cheap and shares the configuration.
#[derive(Clone)]
pub struct Engine(Arc<EngineConfig>);

impl Engine {
	pub fn builder() -> EngineBuilder {
		EngineBuilder::new()
	}

	/// Opens a build context. Results are memoized per context, so one
	/// context should span one consistent view of the scanned data.
	pub fn context(&self) -> BuildContext {
		BuildContext::new(self.clone())
	}

	pub fn config(&self) -> &EngineConfig {
		&self.0
	}
}

impl Deref for Engine {
	type Target = EngineConfig;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

pub struct EngineConfig {
	scanners: HashMap<String, Arc<dyn Scanner>>,
	functions: Arc<dyn FunctionRegistry>,
	codec: Arc<dyn RowIdCodec>,
	lineage: Arc<dyn LineagePolicy>,
	enforce_scan_contract: bool,
}

impl EngineConfig {
	pub fn scanner(&self, table: &str) -> Option<&Arc<dyn Scanner>> {
		self.scanners.get(table)
	}

	pub fn functions(&self) -> &dyn FunctionRegistry {
		self.functions.as_ref()
	}

	pub fn codec(&self) -> &dyn RowIdCodec {
		self.codec.as_ref()
	}

	pub fn lineage(&self) -> &dyn LineagePolicy {
		self.lineage.as_ref()
	}

	/// Whether a keyed scan returning nothing is an error rather than an
	/// absent row.
	pub fn enforce_scan_contract(&self) -> bool {
		self.enforce_scan_contract
	}
}

enum FunctionSource {
	Builder(FunctionsBuilder),
	Registry(Arc<dyn FunctionRegistry>),
}

pub struct EngineBuilder {
	scanners: HashMap<String, Arc<dyn Scanner>>,
	functions: FunctionSource,
	codec: Option<Arc<dyn RowIdCodec>>,
	lineage: Option<Arc<dyn LineagePolicy>>,
	enforce_scan_contract: bool,
}

impl Default for EngineBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl EngineBuilder {
	pub fn new() -> Self {
		Self {
			scanners: HashMap::new(),
			functions: FunctionSource::Builder(Functions::builder()),
			codec: None,
			lineage: None,
			enforce_scan_contract: true,
		}
	}

	/// Register the scanner serving a schema table.
	pub fn scanner(mut self, table: impl Into<String>, scanner: impl Scanner + 'static) -> Self {
		self.scanners.insert(table.into(), Arc::new(scanner));
		self
	}

	/// Register a single function. Ignored once a whole registry is set
	/// through [`EngineBuilder::functions`].
	pub fn function(mut self, name: impl Into<String>, function: Function) -> Self {
		if let FunctionSource::Builder(builder) = self.functions {
			self.functions = FunctionSource::Builder(builder.with_function(name, function));
		}
		self
	}

	/// Replace the function registry.
	pub fn functions(mut self, registry: impl FunctionRegistry + 'static) -> Self {
		self.functions = FunctionSource::Registry(Arc::new(registry));
		self
	}

	/// Defaults to [`PostcardRowIdCodec`].
	pub fn codec(mut self, codec: impl RowIdCodec + 'static) -> Self {
		self.codec = Some(Arc::new(codec));
		self
	}

	pub fn lineage(mut self, policy: impl LineagePolicy + 'static) -> Self {
		self.lineage = Some(Arc::new(policy));
		self
	}

	/// Shorthand for a [`GranularLineagePolicy`]. Defaults to
	/// [`LineageGranularity::Id`].
	pub fn lineage_granularity(self, granularity: LineageGranularity) -> Self {
		self.lineage(GranularLineagePolicy::new(granularity))
	}

	pub fn enforce_scan_contract(mut self, enforce: bool) -> Self {
		self.enforce_scan_contract = enforce;
		self
	}

	pub fn build(self) -> Engine {
		let functions: Arc<dyn FunctionRegistry> = match self.functions {
			FunctionSource::Builder(builder) => Arc::new(builder.build()),
			FunctionSource::Registry(registry) => registry,
		};
		debug!(scanners = self.scanners.len(), enforce_scan_contract = self.enforce_scan_contract, "engine built");
		Engine(Arc::new(EngineConfig {
			scanners: self.scanners,
			functions,
			codec: self.codec.unwrap_or_else(|| Arc::new(PostcardRowIdCodec)),
			lineage: self.lineage.unwrap_or_else(|| Arc::new(GranularLineagePolicy::default())),
			enforce_scan_contract: self.enforce_scan_contract,
		}))
	}
}
