//! Configuration tree nodes
//!
//! The central data structure: a tree of path nodes mirroring the shape of a
//! data model, each owning the rules declared against its exact sub-path.
//! Nodes live in an arena owned by the tree and are addressed by copyable
//! ids, which keeps parent and root back-references cycle-free and makes
//! node identity trivially stable: the same path always resolves to the same
//! id.
//!
//! Node creation is purely structural. It manipulates expression shape and
//! type metadata only and never evaluates target data.
//!
//! Copyright (c) 2025 Mutado Team
//! Licensed under the Apache-2.0 license

use std::collections::HashMap;

use tracing::debug;

use crate::expr::ast::Expression;
use crate::expr::builder;
use crate::rules::{AggregatorConfiguration, MutatorConfiguration, ValidatorConfiguration};
use crate::tree::edge::Edge;
use crate::types::{DataType, Key};
use crate::Result;

/// Identifier of a node within one configuration tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A rule payload together with its global declaration order
#[derive(Debug, Clone)]
pub struct Attached<T> {
    pub seq: u64,
    pub config: T,
}

struct NodeData {
    path: Expression,
    node_type: DataType,
    parent: Option<NodeId>,
    children: HashMap<Edge, NodeId>,
    mutators: Vec<Attached<MutatorConfiguration>>,
    validators: Vec<Attached<ValidatorConfiguration>>,
    aggregators: Vec<Attached<AggregatorConfiguration>>,
}

/// A tree of configuration nodes over one root type
///
/// The tree only grows during configuration; once code generation begins it
/// is treated as immutable and may be shared freely across threads.
pub struct ConfigTree {
    configurator_kind: String,
    root_type: DataType,
    nodes: Vec<NodeData>,
    next_seq: u64,
}

impl ConfigTree {
    /// Create a tree whose root node is the identity path over `root_type`
    pub fn new(configurator_kind: impl Into<String>, root_type: DataType) -> Self {
        let root = NodeData {
            path: Expression::parameter(root_type.clone()),
            node_type: root_type.clone(),
            parent: None,
            children: HashMap::new(),
            mutators: Vec::new(),
            validators: Vec::new(),
            aggregators: Vec::new(),
        };
        Self {
            configurator_kind: configurator_kind.into(),
            root_type,
            nodes: vec![root],
            next_seq: 0,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn configurator_kind(&self) -> &str {
        &self.configurator_kind
    }

    pub fn root_type(&self) -> &DataType {
        &self.root_type
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The full access expression from the root parameter to this node
    pub fn path(&self, node: NodeId) -> &Expression {
        &self.nodes[node.0].path
    }

    /// The value type reachable at this node
    pub fn node_type(&self, node: NodeId) -> &DataType {
        &self.nodes[node.0].node_type
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub fn children(&self, node: NodeId) -> impl Iterator<Item = (&Edge, NodeId)> + '_ {
        self.nodes[node.0].children.iter().map(|(e, id)| (e, *id))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Return the child reached through `edge`, synthesizing it when
    /// `create` is set
    ///
    /// With `create = false` an absent child is a normal `None` outcome, not
    /// a fault. A synthesized child's path is this node's path extended by
    /// the edge's expression construction rule, and its type is the static
    /// type of that path, so type errors (unknown member, missing indexer)
    /// surface here, at configuration time.
    pub fn get_child(
        &mut self,
        parent: NodeId,
        edge: &Edge,
        create: bool,
    ) -> Result<Option<NodeId>> {
        if let Some(existing) = self.nodes[parent.0].children.get(edge) {
            return Ok(Some(*existing));
        }
        if !create {
            return Ok(None);
        }
        let path = builder::extend(&self.nodes[parent.0].path, edge)?;
        let node_type = path.static_type()?;
        let id = NodeId(self.nodes.len());
        debug!(path = %path, node_type = %node_type, "creating configuration node");
        self.nodes.push(NodeData {
            path,
            node_type,
            parent: Some(parent),
            children: HashMap::new(),
            mutators: Vec::new(),
            validators: Vec::new(),
            aggregators: Vec::new(),
        });
        self.nodes[parent.0].children.insert(edge.clone(), id);
        Ok(Some(id))
    }

    pub fn go_to_member(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        create: bool,
    ) -> Result<Option<NodeId>> {
        self.get_child(node, &Edge::member(name), create)
    }

    pub fn go_to_array_element(
        &mut self,
        node: NodeId,
        index: i64,
        create: bool,
    ) -> Result<Option<NodeId>> {
        self.get_child(node, &Edge::ArrayIndex(index), create)
    }

    pub fn go_to_each_element(&mut self, node: NodeId, create: bool) -> Result<Option<NodeId>> {
        self.get_child(node, &Edge::Each, create)
    }

    pub fn go_to_array_length(&mut self, node: NodeId, create: bool) -> Result<Option<NodeId>> {
        self.get_child(node, &Edge::array_length(), create)
    }

    pub fn go_to_indexer(
        &mut self,
        node: NodeId,
        keys: Vec<Key>,
        create: bool,
    ) -> Result<Option<NodeId>> {
        self.get_child(node, &Edge::Indexer(keys), create)
    }

    pub fn go_to_type_conversion(
        &mut self,
        node: NodeId,
        target: DataType,
        create: bool,
    ) -> Result<Option<NodeId>> {
        self.get_child(node, &Edge::TypeConversion(target), create)
    }

    pub fn attach_mutator(&mut self, node: NodeId, config: MutatorConfiguration) {
        let seq = self.bump_seq();
        self.nodes[node.0].mutators.push(Attached { seq, config });
    }

    pub fn attach_validator(&mut self, node: NodeId, config: ValidatorConfiguration) {
        let seq = self.bump_seq();
        self.nodes[node.0].validators.push(Attached { seq, config });
    }

    pub fn attach_aggregator(&mut self, node: NodeId, config: AggregatorConfiguration) {
        let seq = self.bump_seq();
        self.nodes[node.0].aggregators.push(Attached { seq, config });
    }

    pub fn mutators(&self, node: NodeId) -> &[Attached<MutatorConfiguration>] {
        &self.nodes[node.0].mutators
    }

    pub fn validators(&self, node: NodeId) -> &[Attached<ValidatorConfiguration>] {
        &self.nodes[node.0].validators
    }

    pub fn aggregators(&self, node: NodeId) -> &[Attached<AggregatorConfiguration>] {
        &self.nodes[node.0].aggregators
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}
