// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use once_cell::sync::Lazy;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGING: Lazy<()> = Lazy::new(|| {
	let _ = fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.with_test_writer()
		.try_init();
});

/// Installs a `fmt` subscriber filtered by `RUST_LOG` (default `warn`).
/// Safe to call from every test; only the first call has an effect.
pub fn setup_logging() {
	Lazy::force(&LOGGING);
}
