// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lattice_type::Result;

use crate::{
	error::BuildError,
	key::{FieldKey, RowId},
};

/// Encodes row identities.
///
/// `join` and `split` compose the ids of the rows a multi-source row was
/// combined from; a missing component stands for an outer-join null.
pub trait RowIdCodec: Send + Sync {
	fn encode(&self, values: &FieldKey) -> Result<RowId>;

	fn decode(&self, id: &RowId) -> Result<FieldKey>;

	fn join(&self, ids: &[Option<RowId>]) -> Result<RowId>;

	fn split(&self, id: &RowId) -> Result<Vec<Option<RowId>>>;
}

/// [`RowIdCodec`] writing postcard.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostcardRowIdCodec;

impl RowIdCodec for PostcardRowIdCodec {
	fn encode(&self, values: &FieldKey) -> Result<RowId> {
		postcard::to_stdvec(values).map(RowId::new).map_err(codec_error)
	}

	fn decode(&self, id: &RowId) -> Result<FieldKey> {
		postcard::from_bytes(id.as_bytes()).map_err(codec_error)
	}

	fn join(&self, ids: &[Option<RowId>]) -> Result<RowId> {
		postcard::to_stdvec(ids).map(RowId::new).map_err(codec_error)
	}

	fn split(&self, id: &RowId) -> Result<Vec<Option<RowId>>> {
		postcard::from_bytes(id.as_bytes()).map_err(codec_error)
	}
}

fn codec_error(err: postcard::Error) -> lattice_type::Error {
	BuildError::Codec {
		reason: err.to_string(),
	}
	.into()
}

#[cfg(test)]
mod tests {
	use lattice_type::Value;

	use super::*;

	#[test]
	fn test_encode_is_canonical() {
		let codec = PostcardRowIdCodec;
		let left = codec.encode(&FieldKey::new().with("a", 1i64).with("b", "x")).unwrap();
		let right = codec.encode(&FieldKey::new().with("b", "x").with("a", 1i64)).unwrap();
		assert_eq!(left, right);
		assert_eq!(codec.decode(&left).unwrap().get("b"), Some(&Value::utf8("x")));
	}

	#[test]
	fn test_composite_keeps_missing_components() {
		let codec = PostcardRowIdCodec;
		let first = codec.encode(&FieldKey::single("id", 1i64)).unwrap();
		let joined = codec.join(&[Some(first.clone()), None]).unwrap();
		assert_eq!(codec.split(&joined).unwrap(), vec![Some(first), None]);
	}

	#[test]
	fn test_garbage_is_a_codec_error() {
		let err = PostcardRowIdCodec.decode(&RowId::new(vec![0xff, 0xff, 0xff])).unwrap_err();
		assert_eq!(err.code(), "BUILD_007");
	}
}
