// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Shared test support for the lattice crates.

pub mod fixtures;
pub mod function;
pub mod logging;
pub mod scanner;

pub use logging::setup_logging;
pub use scanner::MemoryScanner;
