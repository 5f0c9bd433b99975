// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Plan node IR for the lattice incremental engine.
//!
//! A plan is a DAG of immutable [`PNode`]s. Every node derives its output
//! [`FieldCollection`] from its kind and its sources at construction time and
//! refuses to exist when that derivation fails, so a [`Plan`] only ever holds
//! well-typed nodes.

pub mod annotation;
pub mod codec;
pub mod error;
pub mod explain;
pub mod field;
pub mod function;
pub mod node;
pub mod plan;
pub mod util;

pub use annotation::{NodeAnnotation, NodeAnnotations};
pub use codec::{decode_node, decode_plan, encode_node, encode_plan};
pub use error::PlanError;
pub use explain::explain_plan;
pub use field::{Field, FieldAnnotation, FieldAnnotationKind, FieldAnnotations, FieldCollection, OnConflict};
pub use function::{FunctionType, PFunction};
pub use node::{
	Branch, CrossJoinMode, Denormalization, Input, Invalidation, Invalidations, JoinLayout, JoinMode, Linking,
	LookupBranch, NodeField, NodeId, NodeKind, PNode, Predicate, Projection, ProjectionLayout, Strength,
	Strictness,
};
pub use plan::Plan;
