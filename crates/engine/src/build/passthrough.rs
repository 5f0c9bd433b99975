// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_plan::PNode;
use lattice_type::Result;
use tracing::instrument;

use super::retag;
use crate::{context::BuildContext, key::Key, row::Row};

/// State, output and scope boundaries: the source's rows, produced by this
/// node.
#[instrument(name = "engine::build::passthrough", level = "debug", skip_all, fields(node = node.name(), key = %key))]
pub(super) fn build(ctx: &BuildContext, node: &PNode, source: &PNode, key: &Key) -> Result<Vec<Row>> {
	let rows = ctx.build(source, key)?;
	Ok(rows.iter().map(|row| retag(ctx, node, row)).collect())
}

/// Like [`build`], except that a row id seen before in this context yields
/// the row built for it the first time.
#[instrument(name = "engine::build::cache", level = "debug", skip_all, fields(node = node.name(), key = %key))]
pub(super) fn build_cached(ctx: &BuildContext, node: &PNode, source: &PNode, key: &Key) -> Result<Vec<Row>> {
	let rows = ctx.build(source, key)?;
	Ok(rows.iter().map(|row| ctx.cache_row(node.id(), retag(ctx, node, row))).collect())
}
