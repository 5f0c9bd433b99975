// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_plan::Plan;
use lattice_type::Result;
use once_cell::sync::OnceCell;
use tracing::trace;

use crate::{chain::ChainAnalysis, id_field::IdFieldAnalysis, origin::OriginAnalysis};

/// Analyses of one plan, each computed on first use and kept for the
/// lifetime of the cache. Safe to share between threads.
#[derive(Debug)]
pub struct PlanAnalyses {
	plan: Plan,
	origin: OnceCell<OriginAnalysis>,
	id_field: OnceCell<IdFieldAnalysis>,
	leaf_chains: OnceCell<ChainAnalysis>,
	state_chains: OnceCell<ChainAnalysis>,
}

impl PlanAnalyses {
	pub fn new(plan: Plan) -> Self {
		Self {
			plan,
			origin: OnceCell::new(),
			id_field: OnceCell::new(),
			leaf_chains: OnceCell::new(),
			state_chains: OnceCell::new(),
		}
	}

	pub fn plan(&self) -> &Plan {
		&self.plan
	}

	pub fn origin(&self) -> Result<&OriginAnalysis> {
		self.origin.get_or_try_init(|| {
			trace!("computing origin analysis");
			OriginAnalysis::analyze(&self.plan)
		})
	}

	pub fn id_field(&self) -> Result<&IdFieldAnalysis> {
		self.id_field.get_or_try_init(|| {
			trace!("computing id field analysis");
			IdFieldAnalysis::analyze(&self.plan)
		})
	}

	pub fn leaf_chains(&self) -> Result<&ChainAnalysis> {
		let origin = self.origin()?;
		Ok(self.leaf_chains.get_or_init(|| origin.leaf_chain_analysis()))
	}

	pub fn state_chains(&self) -> Result<&ChainAnalysis> {
		let origin = self.origin()?;
		Ok(self.state_chains.get_or_init(|| origin.state_chain_analysis()))
	}
}
