// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Small executables and their plan-side declarations.

use lattice_engine::{Function, Functions};
use lattice_plan::{FunctionType, PFunction};
use lattice_type::{Diagnostic, Error, Type, Value};

/// `name(Utf8) -> Boolean`, true when the argument equals `expected`.
pub fn equals_declaration(name: &str) -> PFunction {
	PFunction::new(name, FunctionType::new(Type::Boolean, [Type::Utf8]))
}

pub fn equals(expected: impl Into<Value>) -> Function {
	let expected = expected.into();
	Function::args(FunctionType::new(Type::Boolean, [Type::Utf8]), move |args| {
		Ok(Value::bool(args.first() == Some(&expected)))
	})
}

/// `double(Int8) -> Int8`.
pub fn double_declaration() -> PFunction {
	PFunction::new("double", FunctionType::new(Type::Int8, [Type::Int8]))
}

pub fn double() -> Function {
	Function::args(FunctionType::new(Type::Int8, [Type::Int8]), |args| {
		Ok(args.first().and_then(Value::as_int8).map(|v| Value::int8(v * 2)).unwrap_or(Value::Undefined))
	})
}

/// `row_len() -> Int8`, reading the whole source row.
pub fn row_len_declaration() -> PFunction {
	PFunction::new("row_len", FunctionType::new(Type::Int8, []))
}

pub fn row_len() -> Function {
	Function::row_view(FunctionType::new(Type::Int8, []), |view| Ok(Value::int8(view.fields().len() as i64)))
}

/// `fail(Int8) -> Int8`, failing on every call.
pub fn fail_declaration() -> PFunction {
	PFunction::new("fail", FunctionType::new(Type::Int8, [Type::Int8]))
}

pub fn fail() -> Function {
	Function::args(FunctionType::new(Type::Int8, [Type::Int8]), |_| {
		Err(Error(Box::new(Diagnostic {
			code: "TEST_001".to_string(),
			message: "deliberate failure".to_string(),
			node: None,
			fields: vec![],
			label: None,
			help: None,
			notes: vec![],
			cause: None,
		})))
	})
}

/// Every fixture above, registered under its declared name; `equals` is
/// bound as `is_a` comparing against `"a"`.
pub fn functions() -> Functions {
	Functions::builder()
		.with_function("is_a", equals("a"))
		.with_function("double", double())
		.with_function("row_len", row_len())
		.with_function("fail", fail())
		.build()
}
