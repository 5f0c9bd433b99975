// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{collections::HashMap, fmt::Debug, ops::Deref, sync::Arc};

use lattice_plan::{FieldCollection, FunctionType};
use lattice_type::{Result, Value};

/// The source row a row-view function is invoked against.
pub struct RowView<'a> {
	fields: &'a FieldCollection,
	values: &'a [Value],
	args: &'a [Value],
}

impl<'a> RowView<'a> {
	pub fn new(fields: &'a FieldCollection, values: &'a [Value], args: &'a [Value]) -> Self {
		Self {
			fields,
			values,
			args,
		}
	}

	/// The value of a field of the source row.
	pub fn get(&self, field: &str) -> Option<&'a Value> {
		self.fields.position(field).and_then(|position| self.values.get(position))
	}

	/// Evaluated call arguments.
	pub fn args(&self) -> &'a [Value] {
		self.args
	}

	pub fn fields(&self) -> &'a FieldCollection {
		self.fields
	}
}

type ArgsFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;
type RowViewFn = dyn Fn(&RowView<'_>) -> Result<Value> + Send + Sync;

/// How an executable wants to be called.
#[derive(Clone)]
pub enum Invocation {
	/// With the evaluated arguments only.
	Args(Arc<ArgsFn>),
	/// With a view of the whole source row.
	RowView(Arc<RowViewFn>),
}

/// An executable bound to a name in a [`FunctionRegistry`].
#[derive(Clone)]
pub struct Function {
	ty: FunctionType,
	invocation: Invocation,
}

impl Function {
	pub fn args(ty: FunctionType, f: impl Fn(&[Value]) -> Result<Value> + Send + Sync + 'static) -> Self {
		Self {
			ty,
			invocation: Invocation::Args(Arc::new(f)),
		}
	}

	pub fn row_view(ty: FunctionType, f: impl Fn(&RowView<'_>) -> Result<Value> + Send + Sync + 'static) -> Self {
		Self {
			ty,
			invocation: Invocation::RowView(Arc::new(f)),
		}
	}

	pub fn ty(&self) -> &FunctionType {
		&self.ty
	}

	pub fn invocation(&self) -> &Invocation {
		&self.invocation
	}

	pub fn invoke(&self, view: &RowView<'_>) -> Result<Value> {
		match &self.invocation {
			Invocation::Args(f) => f(view.args()),
			Invocation::RowView(f) => f(view),
		}
	}
}

impl Debug for Function {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let invocation = match self.invocation {
			Invocation::Args(_) => "args",
			Invocation::RowView(_) => "row_view",
		};
		f.debug_struct("Function").field("ty", &self.ty).field("invocation", &invocation).finish()
	}
}

pub trait FunctionRegistry: Send + Sync {
	fn resolve(&self, name: &str) -> Option<Function>;
}

#[derive(Clone)]
pub struct Functions(Arc<FunctionsInner>);

impl Functions {
	pub fn empty() -> Functions {
		Functions::builder().build()
	}

	pub fn builder() -> FunctionsBuilder {
		FunctionsBuilder(FunctionsInner {
			functions: HashMap::new(),
		})
	}
}

impl Deref for Functions {
	type Target = FunctionsInner;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl FunctionRegistry for Functions {
	fn resolve(&self, name: &str) -> Option<Function> {
		self.functions.get(name).cloned()
	}
}

#[derive(Clone)]
pub struct FunctionsInner {
	functions: HashMap<String, Function>,
}

impl FunctionsInner {
	pub fn has_function(&self, name: &str) -> bool {
		self.functions.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.functions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.functions.is_empty()
	}
}

pub struct FunctionsBuilder(FunctionsInner);

impl FunctionsBuilder {
	pub fn with_function(mut self, name: impl Into<String>, function: Function) -> Self {
		self.0.functions.insert(name.into(), function);
		self
	}

	pub fn build(self) -> Functions {
		Functions(Arc::new(self.0))
	}
}
