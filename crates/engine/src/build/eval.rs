// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_plan::{FieldCollection, Input, PFunction, PNode};
use lattice_type::{Error, IntoDiagnostic, Result, Value};

use crate::{
	context::BuildContext,
	error::BuildError,
	function::{Function, RowView},
};

/// Resolves `function` and checks the executable has the declared type.
pub(super) fn resolve(ctx: &BuildContext, node: &PNode, function: &PFunction) -> Result<Function> {
	let Some(resolved) = ctx.engine().functions().resolve(&function.name) else {
		return Err(BuildError::FunctionNotFound {
			node: node.name().to_string(),
			function: function.name.clone(),
		}
		.into());
	};

	let ty = resolved.ty();
	let compatible = ty.return_type.is_equivalent(&function.ty.return_type)
		&& ty.param_types.len() == function.ty.param_types.len()
		&& ty.param_types.iter().zip(function.ty.param_types.iter()).all(|(l, r)| l.is_equivalent(r));
	if !compatible {
		return Err(failed(node, function, format!("registered with a different type than {}", function)));
	}
	Ok(resolved)
}

/// Calls `function` against a source row.
pub(super) fn invoke(
	node: &PNode,
	function: &PFunction,
	resolved: &Function,
	source_fields: &FieldCollection,
	attributes: &[Value],
	args: &[Value],
) -> Result<Value> {
	let view = RowView::new(source_fields, attributes, args);
	resolved.invoke(&view).map_err(|err| {
		let diagnostic = BuildError::FunctionFailed {
			node: node.name().to_string(),
			function: function.name.clone(),
			reason: err.0.message.clone(),
		}
		.into_diagnostic()
		.with_cause(err.diagnostic());
		Error(Box::new(diagnostic))
	})
}

/// Evaluates a projection input against a live source row.
pub(super) fn evaluate(
	ctx: &BuildContext,
	node: &PNode,
	source_fields: &FieldCollection,
	attributes: &[Value],
	input: &Input,
) -> Result<Value> {
	match input {
		Input::Constant {
			value,
			..
		} => Ok(value.clone()),
		Input::Field(field) => Ok(source_fields
			.position(field)
			.and_then(|position| attributes.get(position))
			.cloned()
			.unwrap_or(Value::Undefined)),
		Input::Function {
			function,
			args,
		} => {
			let args = args
				.iter()
				.map(|arg| evaluate(ctx, node, source_fields, attributes, arg))
				.collect::<Result<Vec<_>>>()?;
			let resolved = resolve(ctx, node, function)?;
			invoke(node, function, &resolved, source_fields, attributes, &args)
		}
	}
}

fn failed(node: &PNode, function: &PFunction, reason: String) -> Error {
	BuildError::FunctionFailed {
		node: node.name().to_string(),
		function: function.name.clone(),
		reason,
	}
	.into()
}
