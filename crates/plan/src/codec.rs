// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! JSON wire format for plans.
//!
//! Every node is a wrapper object keyed by its kind, e.g.
//! `{"filter": {"name": .., "id": "nodeid:..", "source": .., ..}}`. A node is
//! written in full at its first occurrence in the document and as its bare
//! `"nodeid:.."` string afterwards; decoding resolves those references to the
//! same shared node. Decoding re-runs every construction invariant.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use lattice_type::{Result, Type, Value};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
	annotation::NodeAnnotations,
	error::PlanError,
	node::{
		Branch, CrossJoinMode, Denormalization, Invalidations, JoinMode, Linking, LookupBranch, NodeId, NodeKind,
		PNode, Predicate, Projection, Strictness,
	},
	plan::Plan,
};

#[instrument(name = "plan::codec::encode", level = "debug", skip(plan))]
pub fn encode_plan(plan: &Plan) -> Result<String> {
	encode_node(plan.root())
}

pub fn encode_node(root: &PNode) -> Result<String> {
	let doc = Encoder::default().node_ref(root);
	serde_json::to_string_pretty(&doc).map_err(|err| {
		PlanError::Encode {
			reason: err.to_string(),
		}
		.into()
	})
}

#[instrument(name = "plan::codec::decode", level = "debug", skip(json))]
pub fn decode_plan(json: &str) -> Result<Plan> {
	Plan::new(decode_node(json)?)
}

pub fn decode_node(json: &str) -> Result<PNode> {
	let doc: NodeRef = serde_json::from_str(json).map_err(|err| PlanError::Decode {
		reason: err.to_string(),
	})?;
	Decoder::default().resolve(doc)
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum NodeRef {
	Ref(NodeId),
	Node(Box<NodeDoc>),
}

#[derive(Debug, Serialize, Deserialize)]
struct Body<T> {
	name: String,
	id: NodeId,
	#[serde(default, skip_serializing_if = "NodeAnnotations::is_empty")]
	annotations: NodeAnnotations,
	#[serde(flatten)]
	kind: T,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum NodeDoc {
	Scan(Body<ScanDoc>),
	Values(Body<ValuesDoc>),
	Filter(Body<FilterDoc>),
	Project(Body<ProjectDoc>),
	Join(Body<JoinDoc>),
	CrossJoin(Body<CrossJoinDoc>),
	LookupJoin(Body<LookupJoinDoc>),
	Group(Body<GroupDoc>),
	Union(Body<UnionDoc>),
	Unnest(Body<UnnestDoc>),
	State(Body<StateDoc>),
	Cache(Body<SourceDoc>),
	Output(Body<OutputDoc>),
	Extract(Body<ExtractDoc>),
	Struct(Body<StructDoc>),
	Unify(Body<UnifyDoc>),
	Search(Body<SearchDoc>),
	Scope(Body<SourceDoc>),
	ScopeExit(Body<ScopeExitDoc>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScanDoc {
	schema_table: String,
	fields: IndexMap<String, Type>,
	#[serde(default)]
	id_fields: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValuesDoc {
	fields: IndexMap<String, Type>,
	rows: Vec<Vec<Value>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	index_field: Option<String>,
	#[serde(default)]
	strictness: Strictness,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterDoc {
	source: NodeRef,
	predicate: Predicate,
	#[serde(default)]
	linking: Linking,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectDoc {
	source: NodeRef,
	projection: Projection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BranchDoc {
	node: NodeRef,
	key_fields: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JoinDoc {
	branches: Vec<BranchDoc>,
	mode: JoinMode,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CrossJoinDoc {
	sources: Vec<NodeRef>,
	mode: CrossJoinMode,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupBranchDoc {
	node: NodeRef,
	fields: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupJoinDoc {
	source: NodeRef,
	source_key_fields: Vec<String>,
	branches: Vec<LookupBranchDoc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupDoc {
	source: NodeRef,
	key_fields: Vec<String>,
	list_field: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnionDoc {
	sources: Vec<NodeRef>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	index_field: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnnestDoc {
	source: NodeRef,
	list_field: String,
	unnested_fields: IndexMap<String, Type>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	index_field: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateDoc {
	source: NodeRef,
	#[serde(default)]
	denormalization: Denormalization,
	#[serde(default, skip_serializing_if = "Invalidations::is_empty")]
	invalidations: Invalidations,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	id_fields: Option<Vec<Vec<String>>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SourceDoc {
	source: NodeRef,
}

#[derive(Debug, Serialize, Deserialize)]
struct OutputDoc {
	source: NodeRef,
	targets: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtractDoc {
	source: NodeRef,
	source_field: String,
	struct_member: String,
	output_field: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructDoc {
	source: NodeRef,
	#[serde(rename = "type")]
	ty: Type,
	input_fields: Vec<String>,
	output_field: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnifyDoc {
	source: NodeRef,
	unified_fields: Vec<String>,
	output_field: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchDoc {
	source: NodeRef,
	search: String,
	output_field: String,
	output_type: Type,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScopeExitDoc {
	source: NodeRef,
	scope: String,
}

#[derive(Default)]
struct Encoder {
	seen: HashSet<PNode>,
}

impl Encoder {
	fn node_ref(&mut self, node: &PNode) -> NodeRef {
		if !self.seen.insert(node.clone()) {
			return NodeRef::Ref(node.id());
		}
		NodeRef::Node(Box::new(self.node_doc(node)))
	}

	fn body<T>(node: &PNode, kind: T) -> Body<T> {
		Body {
			name: node.name().to_string(),
			id: node.id(),
			annotations: node.annotations().clone(),
			kind,
		}
	}

	fn node_doc(&mut self, node: &PNode) -> NodeDoc {
		match node.kind() {
			NodeKind::Scan {
				schema_table,
				fields,
				id_fields,
			} => NodeDoc::Scan(Self::body(
				node,
				ScanDoc {
					schema_table: schema_table.clone(),
					fields: fields.clone(),
					id_fields: id_fields.clone(),
				},
			)),
			NodeKind::Values {
				fields,
				rows,
				index_field,
				strictness,
			} => NodeDoc::Values(Self::body(
				node,
				ValuesDoc {
					fields: fields.clone(),
					rows: rows.clone(),
					index_field: index_field.clone(),
					strictness: *strictness,
				},
			)),
			NodeKind::Filter {
				source,
				predicate,
				linking,
			} => {
				let source = self.node_ref(source);
				NodeDoc::Filter(Self::body(
					node,
					FilterDoc {
						source,
						predicate: predicate.clone(),
						linking: *linking,
					},
				))
			}
			NodeKind::Project {
				source,
				projection,
			} => {
				let source = self.node_ref(source);
				NodeDoc::Project(Self::body(
					node,
					ProjectDoc {
						source,
						projection: projection.clone(),
					},
				))
			}
			NodeKind::Join {
				branches,
				mode,
			} => {
				let branches = branches
					.iter()
					.map(|b| BranchDoc {
						node: self.node_ref(&b.node),
						key_fields: b.key_fields.clone(),
					})
					.collect();
				NodeDoc::Join(Self::body(
					node,
					JoinDoc {
						branches,
						mode: *mode,
					},
				))
			}
			NodeKind::CrossJoin {
				sources,
				mode,
			} => {
				let sources = sources.iter().map(|s| self.node_ref(s)).collect();
				NodeDoc::CrossJoin(Self::body(
					node,
					CrossJoinDoc {
						sources,
						mode: *mode,
					},
				))
			}
			NodeKind::LookupJoin {
				source,
				source_key_fields,
				branches,
			} => {
				let source = self.node_ref(source);
				let branches = branches
					.iter()
					.map(|b| LookupBranchDoc {
						node: self.node_ref(&b.node),
						fields: b.fields.clone(),
					})
					.collect();
				NodeDoc::LookupJoin(Self::body(
					node,
					LookupJoinDoc {
						source,
						source_key_fields: source_key_fields.clone(),
						branches,
					},
				))
			}
			NodeKind::Group {
				source,
				key_fields,
				list_field,
			} => {
				let source = self.node_ref(source);
				NodeDoc::Group(Self::body(
					node,
					GroupDoc {
						source,
						key_fields: key_fields.clone(),
						list_field: list_field.clone(),
					},
				))
			}
			NodeKind::Union {
				sources,
				index_field,
			} => {
				let sources = sources.iter().map(|s| self.node_ref(s)).collect();
				NodeDoc::Union(Self::body(
					node,
					UnionDoc {
						sources,
						index_field: index_field.clone(),
					},
				))
			}
			NodeKind::Unnest {
				source,
				list_field,
				unnested_fields,
				index_field,
			} => {
				let source = self.node_ref(source);
				NodeDoc::Unnest(Self::body(
					node,
					UnnestDoc {
						source,
						list_field: list_field.clone(),
						unnested_fields: unnested_fields.clone(),
						index_field: index_field.clone(),
					},
				))
			}
			NodeKind::State {
				source,
				denormalization,
				invalidations,
				id_fields,
			} => {
				let source = self.node_ref(source);
				NodeDoc::State(Self::body(
					node,
					StateDoc {
						source,
						denormalization: *denormalization,
						invalidations: invalidations.clone(),
						id_fields: id_fields.clone(),
					},
				))
			}
			NodeKind::Cache {
				source,
			} => {
				let source = self.node_ref(source);
				NodeDoc::Cache(Self::body(
					node,
					SourceDoc {
						source,
					},
				))
			}
			NodeKind::Output {
				source,
				targets,
			} => {
				let source = self.node_ref(source);
				NodeDoc::Output(Self::body(
					node,
					OutputDoc {
						source,
						targets: targets.clone(),
					},
				))
			}
			NodeKind::Extract {
				source,
				source_field,
				struct_member,
				output_field,
			} => {
				let source = self.node_ref(source);
				NodeDoc::Extract(Self::body(
					node,
					ExtractDoc {
						source,
						source_field: source_field.clone(),
						struct_member: struct_member.clone(),
						output_field: output_field.clone(),
					},
				))
			}
			NodeKind::Struct {
				source,
				ty,
				input_fields,
				output_field,
			} => {
				let source = self.node_ref(source);
				NodeDoc::Struct(Self::body(
					node,
					StructDoc {
						source,
						ty: ty.clone(),
						input_fields: input_fields.clone(),
						output_field: output_field.clone(),
					},
				))
			}
			NodeKind::Unify {
				source,
				unified_fields,
				output_field,
			} => {
				let source = self.node_ref(source);
				NodeDoc::Unify(Self::body(
					node,
					UnifyDoc {
						source,
						unified_fields: unified_fields.clone(),
						output_field: output_field.clone(),
					},
				))
			}
			NodeKind::Search {
				source,
				search,
				output_field,
				output_type,
			} => {
				let source = self.node_ref(source);
				NodeDoc::Search(Self::body(
					node,
					SearchDoc {
						source,
						search: search.clone(),
						output_field: output_field.clone(),
						output_type: output_type.clone(),
					},
				))
			}
			NodeKind::Scope {
				source,
			} => {
				let source = self.node_ref(source);
				NodeDoc::Scope(Self::body(
					node,
					SourceDoc {
						source,
					},
				))
			}
			NodeKind::ScopeExit {
				source,
				scope,
			} => {
				let source = self.node_ref(source);
				NodeDoc::ScopeExit(Self::body(
					node,
					ScopeExitDoc {
						source,
						scope: scope.clone(),
					},
				))
			}
		}
	}
}

#[derive(Default)]
struct Decoder {
	nodes: HashMap<NodeId, PNode>,
}

impl Decoder {
	fn resolve(&mut self, doc: NodeRef) -> Result<PNode> {
		match doc {
			NodeRef::Ref(id) => self.nodes.get(&id).cloned().ok_or_else(|| {
				PlanError::Decode {
					reason: format!("reference to {} precedes its definition", id),
				}
				.into()
			}),
			NodeRef::Node(doc) => self.node(*doc),
		}
	}

	fn resolve_all(&mut self, docs: Vec<NodeRef>) -> Result<Vec<PNode>> {
		docs.into_iter().map(|doc| self.resolve(doc)).collect()
	}

	fn finish(&mut self, body: Body<()>, kind: NodeKind) -> Result<PNode> {
		let node = PNode::new(body.name, body.annotations, kind)?;
		if node.id() != body.id {
			return Err(PlanError::Decode {
				reason: format!("node '{}' declares id {} but hashes to {}", node.name(), body.id, node.id()),
			}
			.into());
		}
		if self.nodes.insert(node.id(), node.clone()).is_some() {
			return Err(PlanError::DuplicateNodeName {
				name: node.name().to_string(),
			}
			.into());
		}
		Ok(node)
	}

	fn node(&mut self, doc: NodeDoc) -> Result<PNode> {
		match doc {
			NodeDoc::Scan(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::Scan {
					schema_table: doc.schema_table,
					fields: doc.fields,
					id_fields: doc.id_fields,
				};
				self.finish(head, kind)
			}
			NodeDoc::Values(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::Values {
					fields: doc.fields,
					rows: doc.rows,
					index_field: doc.index_field,
					strictness: doc.strictness,
				};
				self.finish(head, kind)
			}
			NodeDoc::Filter(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::Filter {
					source: self.resolve(doc.source)?,
					predicate: doc.predicate,
					linking: doc.linking,
				};
				self.finish(head, kind)
			}
			NodeDoc::Project(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::Project {
					source: self.resolve(doc.source)?,
					projection: doc.projection,
				};
				self.finish(head, kind)
			}
			NodeDoc::Join(body) => {
				let (head, doc) = split(body);
				let mut branches = Vec::with_capacity(doc.branches.len());
				for branch in doc.branches {
					branches.push(Branch {
						node: self.resolve(branch.node)?,
						key_fields: branch.key_fields,
					});
				}
				let kind = NodeKind::Join {
					branches,
					mode: doc.mode,
				};
				self.finish(head, kind)
			}
			NodeDoc::CrossJoin(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::CrossJoin {
					sources: self.resolve_all(doc.sources)?,
					mode: doc.mode,
				};
				self.finish(head, kind)
			}
			NodeDoc::LookupJoin(body) => {
				let (head, doc) = split(body);
				let source = self.resolve(doc.source)?;
				let mut branches = Vec::with_capacity(doc.branches.len());
				for branch in doc.branches {
					branches.push(LookupBranch {
						node: self.resolve(branch.node)?,
						fields: branch.fields,
					});
				}
				let kind = NodeKind::LookupJoin {
					source,
					source_key_fields: doc.source_key_fields,
					branches,
				};
				self.finish(head, kind)
			}
			NodeDoc::Group(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::Group {
					source: self.resolve(doc.source)?,
					key_fields: doc.key_fields,
					list_field: doc.list_field,
				};
				self.finish(head, kind)
			}
			NodeDoc::Union(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::Union {
					sources: self.resolve_all(doc.sources)?,
					index_field: doc.index_field,
				};
				self.finish(head, kind)
			}
			NodeDoc::Unnest(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::Unnest {
					source: self.resolve(doc.source)?,
					list_field: doc.list_field,
					unnested_fields: doc.unnested_fields,
					index_field: doc.index_field,
				};
				self.finish(head, kind)
			}
			NodeDoc::State(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::State {
					source: self.resolve(doc.source)?,
					denormalization: doc.denormalization,
					invalidations: doc.invalidations,
					id_fields: doc.id_fields,
				};
				self.finish(head, kind)
			}
			NodeDoc::Cache(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::Cache {
					source: self.resolve(doc.source)?,
				};
				self.finish(head, kind)
			}
			NodeDoc::Output(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::Output {
					source: self.resolve(doc.source)?,
					targets: doc.targets,
				};
				self.finish(head, kind)
			}
			NodeDoc::Extract(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::Extract {
					source: self.resolve(doc.source)?,
					source_field: doc.source_field,
					struct_member: doc.struct_member,
					output_field: doc.output_field,
				};
				self.finish(head, kind)
			}
			NodeDoc::Struct(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::Struct {
					source: self.resolve(doc.source)?,
					ty: doc.ty,
					input_fields: doc.input_fields,
					output_field: doc.output_field,
				};
				self.finish(head, kind)
			}
			NodeDoc::Unify(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::Unify {
					source: self.resolve(doc.source)?,
					unified_fields: doc.unified_fields,
					output_field: doc.output_field,
				};
				self.finish(head, kind)
			}
			NodeDoc::Search(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::Search {
					source: self.resolve(doc.source)?,
					search: doc.search,
					output_field: doc.output_field,
					output_type: doc.output_type,
				};
				self.finish(head, kind)
			}
			NodeDoc::Scope(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::Scope {
					source: self.resolve(doc.source)?,
				};
				self.finish(head, kind)
			}
			NodeDoc::ScopeExit(body) => {
				let (head, doc) = split(body);
				let kind = NodeKind::ScopeExit {
					source: self.resolve(doc.source)?,
					scope: doc.scope,
				};
				self.finish(head, kind)
			}
		}
	}
}

fn header(name: String, id: NodeId, annotations: NodeAnnotations) -> Body<()> {
	Body {
		name,
		id,
		annotations,
		kind: (),
	}
}

fn split<T>(body: Body<T>) -> (Body<()>, T) {
	let Body {
		name,
		id,
		annotations,
		kind,
	} = body;
	(header(name, id, annotations), kind)
}
