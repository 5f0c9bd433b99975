// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

pub mod cache;
pub mod chain;
pub mod error;
pub mod id_field;
pub mod origin;

pub use cache::PlanAnalyses;
pub use chain::{ChainAnalysis, OriginationLink};
pub use error::AnalysisError;
pub use id_field::{IdFieldAnalysis, IdFieldSet};
pub use origin::{Genesis, Nesting, OriginAnalysis, Origination};
