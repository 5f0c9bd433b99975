// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Keyed, memoized row building over lattice plans.
//!
//! A [`BuildContext`] builds the rows of any node of a plan under a [`Key`]:
//! every row, the rows matching some field values, or the single row with a
//! given id. Base rows come from the [`Scanner`]s registered with the
//! [`Engine`]; functions, row id encoding and lineage are pluggable as well.

mod build;
pub mod codec;
pub mod context;
pub mod engine;
pub mod error;
pub mod function;
pub mod key;
pub mod lineage;
pub mod row;
pub mod scanner;

pub use codec::{PostcardRowIdCodec, RowIdCodec};
pub use context::{BuildContext, Rows};
pub use engine::{Engine, EngineBuilder, EngineConfig};
pub use error::BuildError;
pub use function::{Function, FunctionRegistry, Functions, FunctionsBuilder, Invocation, RowView};
pub use key::{FieldKey, Key, RowId};
pub use lineage::{GranularLineagePolicy, LineageGranularity, LineagePolicy};
pub use row::{Lineage, LineageEntry, Row};
pub use scanner::{PhysicalRow, Scanner};
