// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::{
	error,
	fmt::{Display, Formatter},
};

mod diagnostic;
mod r#type;

pub use diagnostic::{Diagnostic, DiagnosticNode, IntoDiagnostic};
pub use r#type::TypeError;

#[derive(Debug, Clone, PartialEq)]
pub struct Error(pub Box<Diagnostic>);

impl Error {
	pub fn diagnostic(self) -> Diagnostic {
		*self.0
	}

	pub fn code(&self) -> &str {
		&self.0.code
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0.render())
	}
}

impl error::Error for Error {}

impl From<Diagnostic> for Error {
	fn from(diagnostic: Diagnostic) -> Self {
		Error(Box::new(diagnostic))
	}
}

/// Wraps a diagnostic into an [`Error`].
#[macro_export]
macro_rules! error {
	($diagnostic:expr) => {
		$crate::error::Error(Box::new($diagnostic))
	};
}

/// Returns early with an [`Error`] built from a diagnostic.
#[macro_export]
macro_rules! return_error {
	($diagnostic:expr) => {
		return Err($crate::error::Error(Box::new($diagnostic)))
	};
}

/// Builds a diagnostic for a broken internal assumption, tagged with the
/// source location it was raised from.
#[macro_export]
macro_rules! internal_error {
	($reason:expr) => {
		$crate::error::Diagnostic::internal($reason, file!(), line!())
	};
	($fmt:expr, $($arg:tt)*) => {
		$crate::error::Diagnostic::internal(format!($fmt, $($arg)*), file!(), line!())
	};
}

#[macro_export]
macro_rules! return_internal_error {
	($reason:expr) => {
		return Err($crate::error::Error(Box::new($crate::internal_error!($reason))))
	};
	($fmt:expr, $($arg:tt)*) => {
		return Err($crate::error::Error(Box::new($crate::internal_error!($fmt, $($arg)*))))
	};
}
