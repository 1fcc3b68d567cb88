//! GraphMap: create and connect nodes without touching `ImageTree` or the
//! serializer directly.

use crate::address::NodeAddress;
use crate::persistence::{Failure, GraphResult, Persistence, ResultCode};
use crate::quadkey::QuadKey;
use crate::tree::creator::{create_tree, insert_node_link};
use crate::types::Canvas;
use tracing::info;

pub struct GraphMap<P: Persistence> {
    persistence: P,
}

impl<P: Persistence> GraphMap<P> {
    pub fn new(persistence: P) -> Self {
        GraphMap { persistence }
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Create the node `address`. Fails with `NameAlreadyExists` when the
    /// address is taken and `WrongChildrenCount` unless 0 or 4 children
    /// are given.
    pub fn create_node(
        &self,
        address: &NodeAddress,
        image_link: Option<&str>,
        children_links: &[String],
    ) -> GraphResult<NodeAddress> {
        if self.persistence.exists(address) {
            return Err(Failure::new(
                ResultCode::NameAlreadyExists,
                format!("Node {} is already present", address),
            ));
        }
        let tree = create_tree(address, children_links, image_link)?;
        let created = tree.node_address();
        self.persistence.put_tree(tree)?;
        info!(address = %created, "Created node");
        Ok(created)
    }

    /// New root equal to `root` except that `child` sits at `quad_key`.
    /// The new root gets a random address unless one is given.
    pub fn connect_child(
        &self,
        root: &NodeAddress,
        quad_key: &str,
        child: &NodeAddress,
        new_root: Option<NodeAddress>,
    ) -> GraphResult<NodeAddress> {
        let root_tree = self.persistence.get_tree(root)?;
        let quad_key = QuadKey::new(quad_key)?;
        let new_root = new_root.unwrap_or_else(NodeAddress::random);
        let tree = insert_node_link(
            &self.persistence,
            &root_tree,
            &child.to_string(),
            &quad_key,
            new_root.filename_or_empty(),
            &new_root.node_name,
        )?;
        let created = tree.node_address();
        self.persistence.put_tree(tree)?;
        info!(root = %root, child = %child, new_root = %created, "Connected child");
        Ok(created)
    }

    pub fn node_exists(&self, address: &NodeAddress) -> bool {
        self.persistence.exists(address)
    }

    /// Address of the node at `quad_key` below `root`.
    pub fn get_child_name(&self, root: &NodeAddress, quad_key: &str) -> GraphResult<NodeAddress> {
        let root_tree = self.persistence.get_tree(root)?;
        let quad_key = QuadKey::new(quad_key)?;
        let descendant = root_tree.get_descendant(&self.persistence, &quad_key)?;
        Ok(descendant.node_address())
    }

    pub fn get_image_at_quad_key(
        &self,
        root: &NodeAddress,
        resolution: u32,
        quad_key: &str,
    ) -> GraphResult<Canvas> {
        let root_tree = self.persistence.get_tree(root)?;
        let quad_key = QuadKey::new(quad_key)?;
        Ok(root_tree.get_image_at_quad_key(&self.persistence, resolution, &quad_key)?)
    }

    pub fn all_node_links(&self) -> Vec<NodeAddress> {
        self.persistence.all_node_links()
    }
}
