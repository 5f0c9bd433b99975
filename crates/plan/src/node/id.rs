// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use xxhash_rust::xxh32::xxh32;

use crate::error::PlanError;

const PREFIX: &str = "nodeid:";

/// Stable, content-derived node id: the 32-bit xxHash of the node name.
///
/// Ids are metadata for cross-process references. Node equality within a
/// plan is identity based and never uses the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
	pub fn from_name(name: &str) -> Self {
		NodeId(xxh32(name.as_bytes(), 0))
	}
}

impl Display for NodeId {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}{:08x}", PREFIX, self.0)
	}
}

impl FromStr for NodeId {
	type Err = PlanError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let hex = s.strip_prefix(PREFIX).ok_or_else(|| PlanError::Decode {
			reason: format!("node id '{}' lacks the '{}' prefix", s, PREFIX),
		})?;
		u32::from_str_radix(hex, 16).map(NodeId).map_err(|_| PlanError::Decode {
			reason: format!("node id '{}' is not hexadecimal", s),
		})
	}
}

impl Serialize for NodeId {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for NodeId {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(serde::de::Error::custom)
	}
}
