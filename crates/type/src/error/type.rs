// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use super::{Diagnostic, Error, IntoDiagnostic};
use crate::value::Type;

#[derive(Debug, thiserror::Error)]
pub enum TypeError {
	#[error("value {value} does not conform to type {expected}")]
	ValueTypeMismatch {
		expected: Type,
		value: String,
	},

	#[error("type {ty} is not a struct")]
	NotAStruct {
		ty: Type,
	},

	#[error("struct type {ty} has no member '{member}'")]
	StructMemberNotFound {
		ty: Type,
		member: String,
	},

	#[error("float value {value} cannot be represented")]
	InvalidFloat {
		value: f64,
	},
}

impl IntoDiagnostic for TypeError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		match self {
			TypeError::ValueTypeMismatch {
				expected,
				..
			} => Diagnostic {
				code: "TYPE_001".to_string(),
				message,
				node: None,
				fields: vec![],
				label: Some(format!("expected {}", expected)),
				help: Some("make the value match the declared type or declare a compatible type".to_string()),
				notes: vec![],
				cause: None,
			},
			TypeError::NotAStruct {
				..
			} => Diagnostic {
				code: "TYPE_002".to_string(),
				message,
				node: None,
				fields: vec![],
				label: None,
				help: Some("struct members can only be read from struct-typed fields".to_string()),
				notes: vec![],
				cause: None,
			},
			TypeError::StructMemberNotFound {
				member,
				..
			} => Diagnostic {
				code: "TYPE_003".to_string(),
				message,
				node: None,
				fields: vec![member],
				label: None,
				help: None,
				notes: vec![],
				cause: None,
			},
			TypeError::InvalidFloat {
				..
			} => Diagnostic {
				code: "TYPE_004".to_string(),
				message,
				node: None,
				fields: vec![],
				label: None,
				help: Some("NaN is not a valid Float8 value".to_string()),
				notes: vec![],
				cause: None,
			},
		}
	}
}

impl From<TypeError> for Error {
	fn from(err: TypeError) -> Self {
		Error(Box::new(err.into_diagnostic()))
	}
}
