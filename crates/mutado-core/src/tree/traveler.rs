//! Path resolution over a configuration tree
//!
//! The traveler resolves an arbitrary compound access expression, as written
//! by a rule author, into a concrete configuration node, creating
//! intermediate nodes on demand. Resolution is a recursive descent matching
//! the shape of the expression, innermost first.
//!
//! When a concrete indexed or keyed access finds no concrete child but the
//! tree already holds a generalized wildcard child, the traveler falls back
//! to the wildcard and records an array alias pairing the concrete
//! expression with its wildcard-element counterpart. Callers splice those
//! aliases into later resolution passes so that rules written at different
//! specificity levels reconcile.
//!
//! Copyright (c) 2025 Mutado Team
//! Licensed under the Apache-2.0 license

use tracing::trace;

use crate::expr::ast::Expression;
use crate::expr::rewrite::{fold_constant, ArrayAlias};
use crate::tree::edge::Edge;
use crate::tree::node::{ConfigTree, NodeId};
use crate::types::Literal;
use crate::{Error, Result};

/// Outcome of one traversal
#[derive(Debug)]
pub struct Travelled {
    /// The resolved node, or `None` when a non-creating lookup found no child
    pub node: Option<NodeId>,
    /// Array aliases discovered en route, in discovery order
    pub aliases: Vec<ArrayAlias>,
    /// Whether the designated subroot node was visited along the way
    pub visited_subroot: bool,
}

/// Resolves compound access expressions against a configuration tree
pub struct TreeTraveler<'t> {
    tree: &'t mut ConfigTree,
    create: bool,
    subroot: Option<NodeId>,
}

impl<'t> TreeTraveler<'t> {
    pub fn new(tree: &'t mut ConfigTree, create: bool) -> Self {
        Self {
            tree,
            create,
            subroot: None,
        }
    }

    /// Track whether the given node is visited during the traversal
    pub fn with_subroot(mut self, subroot: NodeId) -> Self {
        self.subroot = Some(subroot);
        self
    }

    /// Resolve `expr` starting from the tree root
    pub fn travel(self, expr: &Expression) -> Result<Travelled> {
        let root = self.tree.root();
        self.travel_from(root, expr)
    }

    /// Resolve `expr` starting from the given node
    ///
    /// The expression's root parameter must match the starting node's type;
    /// anything else is a caller bug surfaced as a structural mismatch.
    pub fn travel_from(mut self, start: NodeId, expr: &Expression) -> Result<Travelled> {
        trace!(path = %expr, create = self.create, "travelling configuration tree");
        let mut outcome = Travelled {
            node: None,
            aliases: Vec::new(),
            visited_subroot: false,
        };
        outcome.node = self.walk(start, expr, &mut outcome)?;
        Ok(outcome)
    }

    fn walk(
        &mut self,
        start: NodeId,
        expr: &Expression,
        outcome: &mut Travelled,
    ) -> Result<Option<NodeId>> {
        match expr {
            Expression::Parameter(ty) => {
                if ty != self.tree.node_type(start) {
                    return Err(Error::StructuralMismatch {
                        expected: self.tree.node_type(start).to_string(),
                        actual: ty.to_string(),
                    });
                }
                Ok(Some(self.note(start, outcome)))
            }
            Expression::Length { base } => {
                let Some(node) = self.walk(start, base, outcome)? else {
                    return Ok(None);
                };
                self.step(node, &Edge::array_length(), outcome)
            }
            Expression::Convert { base, target } => {
                let Some(node) = self.walk(start, base, outcome)? else {
                    return Ok(None);
                };
                self.step(node, &Edge::TypeConversion(target.clone()), outcome)
            }
            Expression::Member { base, name } => {
                let Some(node) = self.walk(start, base, outcome)? else {
                    return Ok(None);
                };
                self.step(node, &Edge::member(name.clone()), outcome)
            }
            Expression::Index { base, index } => {
                let Some(node) = self.walk(start, base, outcome)? else {
                    return Ok(None);
                };
                self.walk_index(node, index, outcome)
            }
            Expression::Each { base } | Expression::Current { base } => {
                let Some(node) = self.walk(start, base, outcome)? else {
                    return Ok(None);
                };
                self.step(node, &Edge::Each, outcome)
            }
            Expression::Indexer { base, args } => {
                let Some(node) = self.walk(start, base, outcome)? else {
                    return Ok(None);
                };
                self.walk_indexer(node, args, outcome)
            }
            other => Err(Error::unsupported(other.shape(), "tree traversal")),
        }
    }

    fn walk_index(
        &mut self,
        array: NodeId,
        index: &Expression,
        outcome: &mut Travelled,
    ) -> Result<Option<NodeId>> {
        match fold_constant(index) {
            Some(Literal::Int(i)) => {
                if let Some(child) = self.tree.get_child(array, &Edge::ArrayIndex(i), self.create)? {
                    return Ok(Some(self.note(child, outcome)));
                }
                // No concrete child; degrade to an existing wildcard child.
                let Some(each) = self.tree.get_child(array, &Edge::Each, false)? else {
                    return Ok(None);
                };
                outcome.aliases.push(ArrayAlias {
                    from: self.tree.path(array).clone().index(i),
                    to: self.tree.path(each).clone(),
                });
                Ok(Some(self.note(each, outcome)))
            }
            Some(other) => Err(Error::unsupported(
                format!("index constant {}", other),
                "array element traversal",
            )),
            None => {
                // A computed index can never key a concrete child.
                let Some(each) = self.tree.get_child(array, &Edge::Each, self.create)? else {
                    return Ok(None);
                };
                outcome.aliases.push(ArrayAlias {
                    from: self.tree.path(array).clone().index_expr(index.clone()),
                    to: self.tree.path(each).clone(),
                });
                Ok(Some(self.note(each, outcome)))
            }
        }
    }

    fn walk_indexer(
        &mut self,
        container: NodeId,
        args: &[Expression],
        outcome: &mut Travelled,
    ) -> Result<Option<NodeId>> {
        let mut keys = Vec::with_capacity(args.len());
        for arg in args {
            let key = fold_constant(arg)
                .and_then(|lit| lit.to_key())
                .ok_or_else(|| Error::NonConstantIndexer {
                    expression: arg.to_string(),
                })?;
            keys.push(key);
        }
        if let Some(child) = self
            .tree
            .get_child(container, &Edge::Indexer(keys.clone()), self.create)?
        {
            return Ok(Some(self.note(child, outcome)));
        }
        let Some(each) = self.tree.get_child(container, &Edge::Each, false)? else {
            return Ok(None);
        };
        outcome.aliases.push(ArrayAlias {
            from: self.tree.path(container).clone().indexer(
                keys.iter()
                    .map(|k| Expression::literal(k.to_literal()))
                    .collect(),
            ),
            to: self.tree.path(each).clone(),
        });
        Ok(Some(self.note(each, outcome)))
    }

    fn step(
        &mut self,
        node: NodeId,
        edge: &Edge,
        outcome: &mut Travelled,
    ) -> Result<Option<NodeId>> {
        Ok(self
            .tree
            .get_child(node, edge, self.create)?
            .map(|child| self.note(child, outcome)))
    }

    fn note(&self, node: NodeId, outcome: &mut Travelled) -> NodeId {
        if self.subroot == Some(node) {
            outcome.visited_subroot = true;
        }
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn b_type() -> DataType {
        DataType::object("B", vec![("n", DataType::Int), ("s", DataType::String)])
    }

    fn a_type() -> DataType {
        DataType::object("A", vec![("bs", DataType::array(b_type()))])
    }

    fn tree() -> ConfigTree {
        ConfigTree::new("test", a_type())
    }

    #[test]
    fn test_repeated_traversal_returns_identical_node() {
        let mut tree = tree();
        let path = Expression::parameter(a_type()).member("bs").index(0).member("s");

        let first = TreeTraveler::new(&mut tree, true).travel(&path).unwrap();
        let second = TreeTraveler::new(&mut tree, true).travel(&path).unwrap();
        assert_eq!(first.node.unwrap(), second.node.unwrap());
        // Root, bs, bs[0], bs[0].s and nothing duplicated.
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn test_structural_mismatch_is_fatal() {
        let mut tree = tree();
        let path = Expression::parameter(b_type()).member("n");
        let result = TreeTraveler::new(&mut tree, true).travel(&path);
        assert!(matches!(result, Err(Error::StructuralMismatch { .. })));
    }

    #[test]
    fn test_unsupported_shape_is_fatal() {
        let mut tree = tree();
        let expr = Expression::parameter(a_type())
            .member("bs")
            .length()
            .add(Expression::int(1));
        let result = TreeTraveler::new(&mut tree, true).travel(&expr);
        assert!(matches!(result, Err(Error::UnsupportedExpression { .. })));
    }

    #[test]
    fn test_absent_child_without_create_is_none() {
        let mut tree = tree();
        let path = Expression::parameter(a_type()).member("bs").index(0);
        let outcome = TreeTraveler::new(&mut tree, false).travel(&path).unwrap();
        assert!(outcome.node.is_none());
        assert!(outcome.aliases.is_empty());
    }

    #[test]
    fn test_concrete_index_falls_back_to_each_child() {
        let mut tree = tree();
        let each_path = Expression::parameter(a_type()).member("bs").each();
        let each_node = TreeTraveler::new(&mut tree, true)
            .travel(&each_path)
            .unwrap()
            .node
            .unwrap();

        let concrete = Expression::parameter(a_type()).member("bs").index(2);
        let outcome = TreeTraveler::new(&mut tree, false).travel(&concrete).unwrap();
        assert_eq!(outcome.node.unwrap(), each_node);
        assert_eq!(outcome.aliases.len(), 1);
        assert_eq!(outcome.aliases[0].from.to_string(), "$.bs[2]");
        assert_eq!(outcome.aliases[0].to.to_string(), "$.bs.each()");
    }

    #[test]
    fn test_created_concrete_index_wins_over_each_child() {
        let mut tree = tree();
        let each_path = Expression::parameter(a_type()).member("bs").each();
        TreeTraveler::new(&mut tree, true).travel(&each_path).unwrap();

        let concrete = Expression::parameter(a_type()).member("bs").index(2);
        let outcome = TreeTraveler::new(&mut tree, true).travel(&concrete).unwrap();
        assert!(outcome.aliases.is_empty());
        assert_eq!(tree.path(outcome.node.unwrap()).to_string(), "$.bs[2]");
    }

    #[test]
    fn test_computed_index_degrades_to_wildcard() {
        let mut tree = tree();
        let dynamic = Expression::parameter(a_type())
            .member("bs")
            .index_expr(Expression::parameter(a_type()).member("bs").length());
        let outcome = TreeTraveler::new(&mut tree, true).travel(&dynamic).unwrap();
        assert_eq!(
            tree.path(outcome.node.unwrap()).to_string(),
            "$.bs.each()"
        );
        assert_eq!(outcome.aliases.len(), 1);
        assert_eq!(outcome.aliases[0].to.to_string(), "$.bs.each()");
    }

    #[test]
    fn test_array_length_traversal() {
        let mut tree = tree();
        let path = Expression::parameter(a_type()).member("bs").length();
        let outcome = TreeTraveler::new(&mut tree, true).travel(&path).unwrap();
        assert_eq!(tree.node_type(outcome.node.unwrap()), &DataType::Int);
    }

    #[test]
    fn test_subroot_tracking() {
        let mut tree = tree();
        let bs_path = Expression::parameter(a_type()).member("bs");
        let bs = TreeTraveler::new(&mut tree, true)
            .travel(&bs_path)
            .unwrap()
            .node
            .unwrap();

        let deep = Expression::parameter(a_type()).member("bs").each().member("n");
        let through = TreeTraveler::new(&mut tree, true)
            .with_subroot(bs)
            .travel(&deep)
            .unwrap();
        assert!(through.visited_subroot);

        let root_only = Expression::parameter(a_type());
        let missed = TreeTraveler::new(&mut tree, true)
            .with_subroot(bs)
            .travel(&root_only)
            .unwrap();
        assert!(!missed.visited_subroot);
    }

    #[test]
    fn test_indexer_traversal_requires_constants() {
        let d_type = DataType::object(
            "D",
            vec![("values", DataType::dictionary(DataType::String, DataType::Int))],
        );
        let mut tree = ConfigTree::new("test", d_type.clone());
        let ok = Expression::parameter(d_type.clone())
            .member("values")
            .indexer(vec![Expression::string("k")]);
        let outcome = TreeTraveler::new(&mut tree, true).travel(&ok).unwrap();
        assert_eq!(tree.node_type(outcome.node.unwrap()), &DataType::Int);

        let bad = Expression::parameter(d_type.clone())
            .member("values")
            .indexer(vec![Expression::parameter(d_type).member("values").length()]);
        let result = TreeTraveler::new(&mut tree, true).travel(&bad);
        assert!(matches!(result, Err(Error::NonConstantIndexer { .. })));
    }
}
