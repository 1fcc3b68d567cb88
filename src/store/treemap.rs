//! Per-file index of node name to materialized node.

use crate::error::{StorageError, TreeError};
use crate::store::format::FileType;
use crate::store::{forest, tsv, NodeRecord};
use crate::tree::ImageTree;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct TreeMap {
    filename: String,
    nodes: HashMap<String, Arc<ImageTree>>,
}

impl TreeMap {
    pub fn from_records(records: Vec<NodeRecord>, filename: &str) -> Result<Self, TreeError> {
        let mut nodes = HashMap::with_capacity(records.len());
        for record in records {
            let tree = record.into_tree(filename)?;
            nodes.insert(tree.name().to_string(), Arc::new(tree));
        }
        Ok(TreeMap {
            filename: filename.to_string(),
            nodes,
        })
    }

    /// Decode raw (already decompressed) file contents by file type.
    pub fn decode(contents: &[u8], filename: &str) -> Result<Self, TreeError> {
        let records = match FileType::of(filename) {
            FileType::Tsv => {
                let text = std::str::from_utf8(contents)
                    .map_err(|e| StorageError::Decode(format!("{}: {}", filename, e)))?;
                tsv::decode(text)?
            }
            FileType::Forest => forest::decode(contents, filename)?,
            FileType::Unknown => {
                return Err(StorageError::UnknownFileType(filename.to_string()).into())
            }
        };
        TreeMap::from_records(records, filename)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn get_node(&self, name: &str) -> Option<Arc<ImageTree>> {
        self.nodes.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Encode node records in the format implied by `filename`.
pub fn encode_records(records: &[NodeRecord], filename: &str) -> Result<Vec<u8>, StorageError> {
    match FileType::of(filename) {
        FileType::Tsv => Ok(tsv::encode(records, filename).into_bytes()),
        FileType::Forest => forest::encode(records, filename),
        FileType::Unknown => Err(StorageError::UnknownFileType(filename.to_string())),
    }
}
