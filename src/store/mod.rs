//! Tree Store
//!
//! Node records, the per-file encodings and the `Serializer` that loads
//! files on demand and resolves node links across them.

pub mod format;
pub mod forest;
pub mod io;
pub mod serializer;
pub mod treemap;
pub mod tsv;

pub use format::FileType;
pub use serializer::{
    compress_and_save, create_tree_from_image_url, save_tree, save_tree_only_filename,
    save_tree_overwrite, Serializer,
};
pub use treemap::TreeMap;

use crate::address::{format_node_address, resolve_link};
use crate::error::TreeError;
use crate::tree::{Child, ImageTree};
use crate::types::Canvas;
use crate::value::ImageValue;
use std::sync::Arc;

/// Resolves node links and image URLs on behalf of tree operations.
///
/// Trees never hold a back-reference to whatever loaded them; every
/// operation that may need to materialize a linked child or fetch an image
/// takes a resolver explicitly.
pub trait Resolver: Send + Sync {
    /// Load the node addressed by `link` (`name@file`, optionally operator
    /// prefixed).
    fn resolve_node(&self, link: &str) -> Result<Arc<ImageTree>, TreeError>;

    /// Fetch an image, padded to a power-of-two square.
    fn fetch_image(&self, url: &str) -> Result<Arc<Canvas>, TreeError>;
}

/// Flat, file-independent description of one node as stored in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub name: String,
    pub value: ImageValue,
    /// Fully qualified child addresses, empty or four of them
    pub children_links: Vec<String>,
}

impl NodeRecord {
    pub fn from_tree(tree: &ImageTree) -> Self {
        NodeRecord {
            name: tree.name().to_string(),
            value: tree.value().clone(),
            children_links: tree.children_links(),
        }
    }

    /// Build the node as owned by `filename`, children left as links.
    pub fn into_tree(self, filename: &str) -> Result<ImageTree, TreeError> {
        let children = self
            .children_links
            .iter()
            .map(|link| Child::Link(qualify_link(link, filename)))
            .collect();
        let value = match self.value {
            ImageValue::Node(link) => ImageValue::Node(qualify_link(&link, filename)),
            other => other,
        };
        ImageTree::new(self.name, filename, value, children)
    }
}

/// Links without a file refer to the file they are stored in.
pub fn qualify_link(link: &str, filename: &str) -> String {
    match resolve_link(link) {
        Ok((name, None)) => format_node_address(filename, &name),
        _ => link.to_string(),
    }
}

/// Links into `filename` are stored as bare names within that file.
pub fn relative_link(link: &str, filename: &str) -> String {
    match resolve_link(link) {
        Ok((name, Some(file))) if file == filename => name,
        _ => link.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify_and_relativize() {
        assert_eq!(qualify_link("son", "a.tsv"), "son@a.tsv");
        assert_eq!(qualify_link("son@b.tsv", "a.tsv"), "son@b.tsv");
        assert_eq!(relative_link("son@a.tsv", "a.tsv"), "son");
        assert_eq!(relative_link("son@b.tsv", "a.tsv"), "son@b.tsv");
        assert_eq!(relative_link("son", "a.tsv"), "son");
    }

    #[test]
    fn test_record_into_tree_qualifies_children() {
        let record = NodeRecord {
            name: "father".into(),
            value: ImageValue::Unset,
            children_links: vec!["a".into(), "b".into(), "c@x.tsv".into(), "d".into()],
        };
        let tree = record.into_tree("f.tsv").unwrap();
        assert_eq!(
            tree.children_links(),
            vec!["a@f.tsv", "b@f.tsv", "c@x.tsv", "d@f.tsv"]
        );
        assert_eq!(tree.address(), "father@f.tsv");
    }

    #[test]
    fn test_record_with_three_children_fails() {
        let record = NodeRecord {
            name: "bad".into(),
            value: ImageValue::Unset,
            children_links: vec!["a".into(), "b".into(), "c".into()],
        };
        assert!(matches!(
            record.into_tree("f.tsv"),
            Err(TreeError::CreationFailed(_))
        ));
    }
}
