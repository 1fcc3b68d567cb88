//! In-memory persistence with disk fallback.

use crate::address::{resolve_link, NodeAddress};
use crate::config::FetchConfig;
use crate::error::TreeError;
use crate::operator::{apply_operators, parse_operated_name};
use crate::persistence::{Failure, GraphResult, Persistence, ResultCode};
use crate::store::{Resolver, Serializer};
use crate::tree::standard::is_not_found;
use crate::tree::ImageTree;
use crate::types::Canvas;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Trees kept in a map by address. Addresses missing from the map but
/// carrying a file are loaded through a `Serializer` and remembered.
pub struct MemoryPersistence {
    trees: RwLock<HashMap<NodeAddress, Arc<ImageTree>>>,
    serializer: Serializer,
}

impl Default for MemoryPersistence {
    fn default() -> Self {
        MemoryPersistence::new(&FetchConfig::default())
    }
}

impl MemoryPersistence {
    pub fn new(config: &FetchConfig) -> Self {
        MemoryPersistence {
            trees: RwLock::new(HashMap::new()),
            serializer: Serializer::new(config),
        }
    }

    fn stored(&self, address: &NodeAddress) -> Option<Arc<ImageTree>> {
        self.trees.read().get(address).cloned()
    }
}

impl Resolver for MemoryPersistence {
    fn resolve_node(&self, link: &str) -> Result<Arc<ImageTree>, TreeError> {
        let (name, filename) = resolve_link(link)?;
        let (base_name, operations) = parse_operated_name(&name)?;
        let address = NodeAddress::new(base_name, filename);
        if let Some(tree) = self.stored(&address) {
            return Ok(apply_operators(&tree, &operations));
        }
        if address.filename.is_none() {
            return Err(TreeError::NodeNotFound(link.to_string()));
        }
        self.serializer.load_node(link)
    }

    fn fetch_image(&self, url: &str) -> Result<Arc<Canvas>, TreeError> {
        self.serializer.fetch_image(url)
    }
}

impl Persistence for MemoryPersistence {
    fn exists(&self, address: &NodeAddress) -> bool {
        self.trees.read().contains_key(address)
    }

    fn get_tree(&self, address: &NodeAddress) -> GraphResult<Arc<ImageTree>> {
        if let Some(tree) = self.stored(address) {
            return Ok(tree);
        }
        if address.filename.is_some() {
            let tree = self.serializer.load_node(&address.to_string())?;
            if !is_not_found(&tree) {
                debug!(address = %address, "Loaded tree from disk into memory");
                self.trees.write().insert(address.clone(), Arc::clone(&tree));
                return Ok(tree);
            }
        }
        Err(Failure::new(
            ResultCode::NodeLinkNotFound,
            format!("{} not found in memory persistence", address),
        ))
    }

    fn put_tree(&self, tree: ImageTree) -> GraphResult<()> {
        let address = tree.node_address();
        debug!(address = %address, "Stored tree in memory");
        self.trees.write().insert(address, Arc::new(tree));
        Ok(())
    }

    fn all_node_links(&self) -> Vec<NodeAddress> {
        let mut links: Vec<NodeAddress> = self.trees.read().keys().cloned().collect();
        links.sort();
        links
    }
}
