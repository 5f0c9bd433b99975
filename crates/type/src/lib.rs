// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

pub mod error;
pub mod value;

pub use error::{Diagnostic, DiagnosticNode, Error, IntoDiagnostic, TypeError};
pub use value::{OrderedF64, StructMember, StructType, Type, TypeAnnotation, Value};

pub type Result<T> = std::result::Result<T, Error>;
