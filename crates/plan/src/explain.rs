// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Indented text rendering of a plan, root first.

use std::{collections::HashSet, fmt::Write};

use crate::{node::PNode, plan::Plan};

pub fn explain_plan(plan: &Plan) -> String {
	let mut out = String::new();
	let mut seen = HashSet::new();
	render(plan.root(), 0, &mut seen, &mut out);
	out
}

fn render(node: &PNode, depth: usize, seen: &mut HashSet<PNode>, out: &mut String) {
	let indent = "  ".repeat(depth);
	if !seen.insert(node.clone()) {
		let _ = writeln!(out, "{}^{}", indent, node.name());
		return;
	}
	let fields: Vec<String> = node.fields().iter().map(ToString::to_string).collect();
	let _ = writeln!(out, "{}{} {} [{}]", indent, node.kind_name(), node.name(), fields.join(", "));
	for source in node.sources() {
		render(source, depth + 1, seen, out);
	}
}
