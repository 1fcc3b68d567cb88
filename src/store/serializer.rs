//! Serializer
//!
//! Loads tree files on demand and resolves node links across them. Every
//! file is parsed at most once per serializer instance and kept for the
//! lifetime of that instance; there is no invalidation. The saving
//! functions partition a tree by owning file and write one file per
//! partition.

use crate::address::{resolve_link, NodeAddress};
use crate::config::FetchConfig;
use crate::error::{StorageError, TreeError};
use crate::operator::{apply_operators, parse_operated_name};
use crate::store::io;
use crate::store::treemap::{encode_records, TreeMap};
use crate::store::{NodeRecord, Resolver};
use crate::tree::standard::{is_not_found, not_found_node};
use crate::tree::ImageTree;
use crate::types::Canvas;
use crate::value::{ImageFetcher, ImageValue, WebImage};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct Serializer {
    tree_maps: RwLock<HashMap<String, Arc<TreeMap>>>,
    fetcher: ImageFetcher,
    timeout: Duration,
}

impl Default for Serializer {
    fn default() -> Self {
        Serializer::new(&FetchConfig::default())
    }
}

impl Serializer {
    pub fn new(config: &FetchConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        Serializer {
            tree_maps: RwLock::new(HashMap::new()),
            fetcher: ImageFetcher::new(config.image_cache_capacity, timeout),
            timeout,
        }
    }

    /// Load the node addressed by `link`.
    ///
    /// Links without a file, missing files and names absent from their file
    /// all yield the grey not-found placeholder. Malformed links, unknown
    /// operator tags and undecodable files are errors.
    pub fn load_node(&self, link: &str) -> Result<Arc<ImageTree>, TreeError> {
        let (name, filename) = resolve_link(link)?;
        let Some(filename) = filename.filter(|f| !f.is_empty()) else {
            debug!(link = %link, "Link without file");
            return Ok(not_found_node(""));
        };
        let Some(tree_map) = self.tree_map(&filename)? else {
            warn!(file = %filename, "Tree file not found");
            return Ok(not_found_node(&filename));
        };

        let (base_name, operations) = parse_operated_name(&name)?;
        match tree_map.get_node(&base_name) {
            Some(tree) => Ok(apply_operators(&tree, &operations)),
            None => {
                warn!(node = %base_name, file = %filename, "Node not found in file");
                Ok(not_found_node(&filename))
            }
        }
    }

    /// Parse `contents` as the file `filename`, remember it, and load
    /// `name` from it.
    pub fn load_from_string(
        &self,
        name: &str,
        filename: &str,
        contents: &[u8],
    ) -> Result<Arc<ImageTree>, TreeError> {
        let tree_map = Arc::new(TreeMap::decode(contents, filename)?);
        self.tree_maps
            .write()
            .insert(filename.to_string(), tree_map);
        self.load_node(&format!("{}@{}", name, filename))
    }

    /// Memoized tree map of `filename`, `None` when the file does not exist.
    pub fn tree_map(&self, filename: &str) -> Result<Option<Arc<TreeMap>>, TreeError> {
        if let Some(tree_map) = self.tree_maps.read().get(filename) {
            return Ok(Some(Arc::clone(tree_map)));
        }

        let Some(contents) = io::read_contents(filename, self.timeout)? else {
            return Ok(None);
        };
        let tree_map = Arc::new(TreeMap::decode(&contents, filename)?);
        info!(file = %filename, nodes = tree_map.len(), "Loaded tree file");
        self.tree_maps
            .write()
            .insert(filename.to_string(), Arc::clone(&tree_map));
        Ok(Some(tree_map))
    }

    /// Files parsed so far.
    pub fn loaded_files(&self) -> Vec<String> {
        self.tree_maps.read().keys().cloned().collect()
    }

    /// Addresses of every node in every file parsed so far.
    pub fn loaded_node_addresses(&self) -> Vec<NodeAddress> {
        let maps = self.tree_maps.read();
        let mut addresses: Vec<NodeAddress> = maps
            .values()
            .flat_map(|map| {
                map.names()
                    .map(|name| NodeAddress::in_file(name, map.filename()))
                    .collect::<Vec<_>>()
            })
            .collect();
        addresses.sort();
        addresses
    }

    pub fn fetcher(&self) -> &ImageFetcher {
        &self.fetcher
    }

    /// True when `link` loads to a real node rather than the placeholder.
    pub fn node_exists(&self, link: &str) -> bool {
        matches!(self.load_node(link), Ok(tree) if !is_not_found(&tree))
    }
}

impl Resolver for Serializer {
    fn resolve_node(&self, link: &str) -> Result<Arc<ImageTree>, TreeError> {
        self.load_node(link)
    }

    fn fetch_image(&self, url: &str) -> Result<Arc<Canvas>, TreeError> {
        Ok(self.fetcher.fetch(url)?)
    }
}

fn write_partition(
    filename: &str,
    records: &BTreeMap<String, NodeRecord>,
    overwrite: bool,
) -> Result<(), TreeError> {
    let records: Vec<NodeRecord> = records.values().cloned().collect();
    let bytes = encode_records(&records, filename)?;
    io::write_contents(filename, &bytes, overwrite)?;
    info!(file = %filename, nodes = records.len(), overwrite, "Saved tree file");
    Ok(())
}

fn check_destination(filename: &str) -> Result<(), StorageError> {
    if io::file_exists(filename) {
        return Err(StorageError::AlreadyExists(filename.to_string()));
    }
    Ok(())
}

/// Save every node reachable from `tree`, one file per owning file.
///
/// Fails before writing anything if any destination already exists. Files
/// are written independently; a failure part way leaves earlier files
/// written. Returns the files written.
pub fn save_tree(resolver: &dyn Resolver, tree: &ImageTree) -> Result<Vec<String>, TreeError> {
    let dictionary = tree.node_dictionary(resolver)?;
    for filename in dictionary.keys() {
        check_destination(filename)?;
    }
    for (filename, records) in &dictionary {
        write_partition(filename, records, false)?;
    }
    Ok(dictionary.into_keys().collect())
}

/// Save only the nodes owned by `filename`, refusing to overwrite.
pub fn save_tree_only_filename(
    resolver: &dyn Resolver,
    tree: &ImageTree,
    filename: &str,
) -> Result<(), TreeError> {
    check_destination(filename)?;
    let records = tree.node_dictionary_for(resolver, filename)?;
    write_partition(filename, &records, false)
}

/// Save only the nodes owned by `filename`, replacing any existing file.
pub fn save_tree_overwrite(
    resolver: &dyn Resolver,
    tree: &ImageTree,
    filename: &str,
) -> Result<(), TreeError> {
    let records = tree.node_dictionary_for(resolver, filename)?;
    write_partition(filename, &records, true)
}

/// Compress `tree`, log the node count reduction, and save the result.
pub fn compress_and_save(resolver: &dyn Resolver, tree: &ImageTree) -> Result<ImageTree, TreeError> {
    let before = tree.count_nodes(resolver)?;
    let compressed = tree.compress(resolver)?;
    let after = compressed.count_nodes(resolver)?;
    info!(
        before,
        after,
        ratio = after as f64 / before.max(1) as f64,
        "Compressed tree"
    );
    save_tree(resolver, &compressed)?;
    Ok(compressed)
}

/// Leaf at `name@filename` showing the image at `url`.
pub fn create_tree_from_image_url(url: &str, name: &str, filename: &str) -> ImageTree {
    ImageTree::leaf(name, filename, ImageValue::WebImage(WebImage::new(url)))
}
