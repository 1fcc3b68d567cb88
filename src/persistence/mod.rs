//! Persistence Façade
//!
//! A thin create/connect/query API over image trees. Every call returns a
//! [`GraphResult`]: the value, or a [`Failure`] carrying a numeric code.

pub mod graph_map;
pub mod memory;
pub mod result;

pub use graph_map::GraphMap;
pub use memory::MemoryPersistence;
pub use result::{Failure, GraphResult, ResultCode};

use crate::address::NodeAddress;
use crate::store::{save_tree_only_filename, Resolver, Serializer};
use crate::tree::standard::is_not_found;
use crate::tree::ImageTree;
use std::sync::Arc;

/// Storage of image trees addressed by node address.
///
/// A persistence is also the resolver for the trees it hands out, so links
/// between stored nodes resolve through it.
pub trait Persistence: Resolver {
    fn exists(&self, address: &NodeAddress) -> bool;

    fn get_tree(&self, address: &NodeAddress) -> GraphResult<Arc<ImageTree>>;

    fn put_tree(&self, tree: ImageTree) -> GraphResult<()>;

    fn all_node_links(&self) -> Vec<NodeAddress>;
}

/// Disk-backed persistence. Stored trees are written to their own file,
/// which must not exist yet.
impl Persistence for Serializer {
    fn exists(&self, address: &NodeAddress) -> bool {
        address.filename.is_some() && self.node_exists(&address.to_string())
    }

    fn get_tree(&self, address: &NodeAddress) -> GraphResult<Arc<ImageTree>> {
        let tree = self.load_node(&address.to_string())?;
        if is_not_found(&tree) {
            return Err(Failure::not_found(address));
        }
        Ok(tree)
    }

    fn put_tree(&self, tree: ImageTree) -> GraphResult<()> {
        if tree.filename().is_empty() {
            return Err(Failure::new(
                ResultCode::StorageFailure,
                format!("Node {} has no file to be saved in", tree.name()),
            ));
        }
        save_tree_only_filename(self, &tree, tree.filename())?;
        Ok(())
    }

    fn all_node_links(&self) -> Vec<NodeAddress> {
        self.loaded_node_addresses()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Pixel;
    use tempfile::TempDir;

    #[test]
    fn test_serializer_persistence() {
        let dir = TempDir::new().unwrap();
        let filename = dir.path().join("p.tsv").display().to_string();
        let serializer = Serializer::default();
        let address = NodeAddress::in_file("solo", &filename);
        assert!(!serializer.exists(&address));

        let tree = ImageTree::leaf("solo", &filename, Pixel::new(9, 9, 9).into());
        serializer.put_tree(tree).unwrap();
        assert!(serializer.exists(&address));
        assert_eq!(serializer.get_tree(&address).unwrap().name(), "solo");
        assert_eq!(serializer.all_node_links(), vec![address]);

        let again = ImageTree::leaf("solo", &filename, Pixel::new(1, 1, 1).into());
        let failure = serializer.put_tree(again).unwrap_err();
        assert_eq!(failure.code, ResultCode::NameAlreadyExists);
    }

    #[test]
    fn test_serializer_missing_tree() {
        let serializer = Serializer::default();
        let failure = serializer
            .get_tree(&NodeAddress::in_file("x", "/nonexistent/graphmap/x.tsv"))
            .unwrap_err();
        assert_eq!(failure.code, ResultCode::NodeLinkNotFound);
    }
}
