//! Image Trees
//!
//! An `ImageTree` node is identified by `(name, filename)` and carries an
//! image value plus either no children or exactly four. A child slot is
//! either a link (a node address resolved lazily through a [`Resolver`]) or
//! a node already materialized in memory. Trees are immutable: insertion,
//! transforms and compression return new trees sharing unaffected subtrees.
//!
//! Links may form cycles (a node may link back to an ancestor), so every
//! traversal either bounds its depth or tracks visited addresses.

pub mod creator;
pub mod edit;
pub mod generator;
pub mod render;
pub mod standard;
pub mod walk;

pub use render::{image_at_quad_key, images_equal, mean_squared_error};

use crate::address::{format_node_address, NodeAddress};
use crate::error::TreeError;
use crate::quadkey::QuadKey;
use crate::store::Resolver;
use crate::types::CHILDREN_PER_NODE;
use crate::value::ImageValue;
use std::sync::Arc;

/// One of the four child slots of a node.
#[derive(Debug, Clone)]
pub enum Child {
    /// Fully qualified node address, resolved on demand
    Link(String),
    Node(Arc<ImageTree>),
}

impl Child {
    pub fn link(&self) -> String {
        match self {
            Child::Link(link) => link.clone(),
            Child::Node(node) => node.address(),
        }
    }

    pub fn resolve(&self, resolver: &dyn Resolver) -> Result<Arc<ImageTree>, TreeError> {
        match self {
            Child::Link(link) => resolver.resolve_node(link),
            Child::Node(node) => Ok(Arc::clone(node)),
        }
    }
}

impl From<Arc<ImageTree>> for Child {
    fn from(node: Arc<ImageTree>) -> Self {
        Child::Node(node)
    }
}

impl From<ImageTree> for Child {
    fn from(node: ImageTree) -> Self {
        Child::Node(Arc::new(node))
    }
}

#[derive(Debug, Clone)]
pub struct ImageTree {
    name: String,
    filename: String,
    value: ImageValue,
    children: Vec<Child>,
}

impl ImageTree {
    /// Fails unless `children` holds zero or four slots.
    pub fn new(
        name: impl Into<String>,
        filename: impl Into<String>,
        value: ImageValue,
        children: Vec<Child>,
    ) -> Result<Self, TreeError> {
        let name = name.into();
        if !children.is_empty() && children.len() != CHILDREN_PER_NODE {
            return Err(TreeError::CreationFailed(format!(
                "Node {} needs 0 or {} children, got {}",
                name,
                CHILDREN_PER_NODE,
                children.len()
            )));
        }
        Ok(ImageTree {
            name,
            filename: filename.into(),
            value,
            children,
        })
    }

    pub fn leaf(name: impl Into<String>, filename: impl Into<String>, value: ImageValue) -> Self {
        ImageTree {
            name: name.into(),
            filename: filename.into(),
            value,
            children: Vec::new(),
        }
    }

    /// Unset value, no children.
    pub fn empty(name: impl Into<String>, filename: impl Into<String>) -> Self {
        ImageTree::leaf(name, filename, ImageValue::Unset)
    }

    pub(crate) fn from_children(
        name: String,
        filename: String,
        value: ImageValue,
        children: [Child; CHILDREN_PER_NODE],
    ) -> Self {
        ImageTree {
            name,
            filename,
            value,
            children: children.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn value(&self) -> &ImageValue {
        &self.value
    }

    /// Raw child slots, empty for leaves.
    pub fn child_slots(&self) -> &[Child] {
        &self.children
    }

    pub fn children_links(&self) -> Vec<String> {
        self.children.iter().map(Child::link).collect()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_set(&self) -> bool {
        self.value.is_set()
    }

    /// Canonical textual identity, `name@file` or `name`.
    pub fn address(&self) -> String {
        format_node_address(&self.filename, &self.name)
    }

    pub fn node_address(&self) -> NodeAddress {
        NodeAddress::new(self.name.clone(), Some(self.filename.clone()))
    }

    pub fn info(&self) -> String {
        format!(
            "{} value={:?} children={:?}",
            self.address(),
            self.value,
            self.children_links()
        )
    }

    /// Same node with a different value.
    pub fn with_value(&self, value: ImageValue) -> ImageTree {
        ImageTree {
            value,
            ..self.clone()
        }
    }

    /// Renamed copy whose slot `k` holds this node's slot `order[k]`.
    pub(crate) fn permuted(&self, name: String, order: [usize; CHILDREN_PER_NODE]) -> ImageTree {
        let children = if self.is_leaf() {
            Vec::new()
        } else {
            order.iter().map(|&index| self.children[index].clone()).collect()
        };
        ImageTree {
            name,
            filename: self.filename.clone(),
            value: self.value.clone(),
            children,
        }
    }

    /// Materialize the child at `index`.
    pub fn child(&self, resolver: &dyn Resolver, index: usize) -> Result<Arc<ImageTree>, TreeError> {
        let slot = self.children.get(index).ok_or_else(|| {
            TreeError::NodeNotFound(format!(
                "The child index {} is out of range in {}",
                index,
                self.address()
            ))
        })?;
        slot.resolve(resolver)
    }

    /// Materialize all children, in quadrant order.
    pub fn children(&self, resolver: &dyn Resolver) -> Result<Vec<Arc<ImageTree>>, TreeError> {
        self.children
            .iter()
            .map(|slot| slot.resolve(resolver))
            .collect()
    }

    /// Walk `quad_key` down from this node.
    pub fn get_descendant(
        &self,
        resolver: &dyn Resolver,
        quad_key: &QuadKey,
    ) -> Result<ImageTree, TreeError> {
        let mut current: Option<Arc<ImageTree>> = None;
        for index in quad_key.indices() {
            let next = match &current {
                Some(node) => node.child(resolver, index)?,
                None => self.child(resolver, index)?,
            };
            current = Some(next);
        }
        Ok(match current {
            Some(node) => node.as_ref().clone(),
            None => self.clone(),
        })
    }

    /// Address of the node at tile coordinates `(x, y, z)`.
    pub fn node_address_at_xyz(
        &self,
        resolver: &dyn Resolver,
        x: u64,
        y: u64,
        z: u32,
    ) -> Result<NodeAddress, TreeError> {
        Ok(self
            .get_descendant(resolver, &QuadKey::from_xyz(x, y, z))?
            .node_address())
    }
}

impl PartialEq for ImageTree {
    /// Shallow comparison: identity, links and value. Use
    /// [`ImageTree::equals`] for a recursive comparison.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.filename == other.filename
            && self.value == other.value
            && self.children_links() == other.children_links()
    }
}
