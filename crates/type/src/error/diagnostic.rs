// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::fmt::Write;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
	pub code: String,
	pub message: String,
	/// The plan node the failure is attributed to, if any.
	pub node: Option<DiagnosticNode>,
	/// Offending field names.
	pub fields: Vec<String>,
	pub label: Option<String>,
	pub help: Option<String>,
	pub notes: Vec<String>,
	pub cause: Option<Box<Diagnostic>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticNode {
	pub name: String,
	pub id: String,
}

pub trait IntoDiagnostic {
	fn into_diagnostic(self) -> Diagnostic;
}

impl Diagnostic {
	pub fn internal(reason: impl Into<String>, file: &str, line: u32) -> Self {
		Diagnostic {
			code: "INTERNAL_001".to_string(),
			message: format!("internal error: {}", reason.into()),
			node: None,
			fields: vec![],
			label: None,
			help: Some("this indicates a bug in the plan engine".to_string()),
			notes: vec![format!("raised at {}:{}", file, line)],
			cause: None,
		}
	}

	pub fn with_cause(mut self, cause: Diagnostic) -> Self {
		self.cause = Some(Box::new(cause));
		self
	}

	pub fn render(&self) -> String {
		let mut out = String::new();
		self.render_into(&mut out, 0);
		out
	}

	fn render_into(&self, out: &mut String, depth: usize) {
		let indent = "  ".repeat(depth);
		let _ = write!(out, "{}[{}] {}", indent, self.code, self.message);
		if let Some(node) = &self.node {
			let _ = write!(out, "\n{}  node: {} ({})", indent, node.name, node.id);
		}
		if !self.fields.is_empty() {
			let _ = write!(out, "\n{}  fields: {}", indent, self.fields.join(", "));
		}
		if let Some(label) = &self.label {
			let _ = write!(out, "\n{}  label: {}", indent, label);
		}
		if let Some(help) = &self.help {
			let _ = write!(out, "\n{}  help: {}", indent, help);
		}
		for note in &self.notes {
			let _ = write!(out, "\n{}  note: {}", indent, note);
		}
		if let Some(cause) = &self.cause {
			let _ = write!(out, "\n{}  caused by:\n", indent);
			cause.render_into(out, depth + 1);
		}
	}
}
