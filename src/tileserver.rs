//! Tile Server
//!
//! Serves tiles of one or more root trees by `(x, y, z)` coordinates. Each
//! root link gets its own `Serializer`, loaded on first request and kept
//! until dropped. Rendered tiles go through the optional disk cache, keyed
//! by the root's file and `root name/quadkey`.

use crate::address::NodeAddress;
use crate::cache::{encode_jpeg, CacheStats, TileCache, TileKey};
use crate::config::{CacheConfig, FetchConfig, GraphMapConfig, TileConfig};
use crate::error::{StorageError, TreeError};
use crate::quadkey::QuadKey;
use crate::store::Serializer;
use crate::task::BackgroundTask;
use crate::tree::render::check_resolution;
use crate::tree::standard::is_not_found;
use crate::tree::ImageTree;
use crate::types::Canvas;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A loaded root tree together with the serializer resolving its links.
pub struct TileRoot {
    pub serializer: Serializer,
    pub tree: Arc<ImageTree>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TileServerStats {
    pub roots_loaded: usize,
    pub cache: Option<CacheStats>,
}

pub struct TileServer {
    roots: RwLock<HashMap<String, Arc<TileRoot>>>,
    cache: Option<Mutex<TileCache>>,
    populate_limit: usize,
    tiles: TileConfig,
    fetch: FetchConfig,
}

impl TileServer {
    /// Server without a disk cache.
    pub fn new(tiles: TileConfig, fetch: FetchConfig) -> Self {
        TileServer {
            roots: RwLock::new(HashMap::new()),
            cache: None,
            populate_limit: CacheConfig::default().populate_limit,
            tiles,
            fetch,
        }
    }

    pub fn with_cache(mut self, cache: TileCache) -> Self {
        self.cache = Some(Mutex::new(cache.with_jpeg_quality(self.tiles.jpeg_quality)));
        self
    }

    /// Limit used by [`TileServer::populate_cache_default`].
    pub fn with_populate_limit(mut self, limit: usize) -> Self {
        self.populate_limit = limit;
        self
    }

    /// Server with the disk cache described by `config`, when a cache
    /// directory can be determined.
    pub fn from_config(config: &GraphMapConfig) -> Result<Self, StorageError> {
        let server = TileServer::new(config.tiles.clone(), config.fetch.clone())
            .with_populate_limit(config.cache.populate_limit);
        match config.cache.resolve_dir() {
            Some(dir) => Ok(server.with_cache(TileCache::open(dir, config.cache.capacity)?)),
            None => {
                warn!("No cache directory available, serving tiles without a disk cache");
                Ok(server)
            }
        }
    }

    /// Loaded root for `root_link`, loading it on first use. A root that
    /// only resolves to the not-found placeholder is an error.
    pub fn root(&self, root_link: &str) -> Result<Arc<TileRoot>, TreeError> {
        if let Some(root) = self.roots.read().get(root_link) {
            return Ok(Arc::clone(root));
        }

        let serializer = Serializer::new(&self.fetch);
        let tree = serializer.load_node(root_link)?;
        if is_not_found(&tree) {
            return Err(TreeError::NodeNotFound(root_link.to_string()));
        }
        info!(root = %root_link, "Loaded tile server root");
        let root = Arc::new(TileRoot { serializer, tree });
        self.roots
            .write()
            .insert(root_link.to_string(), Arc::clone(&root));
        Ok(root)
    }

    pub fn get_tile_image(
        &self,
        root_link: &str,
        x: u64,
        y: u64,
        z: u32,
        resolution: u32,
    ) -> Result<Canvas, TreeError> {
        check_resolution(resolution)?;
        self.check_zoom(z)?;
        let root = self.root(root_link)?;
        self.tile_at_quad_key(&root, &QuadKey::from_xyz(x, y, z), resolution)
    }

    /// JPEG-encoded tile.
    pub fn get_tile_jpeg(
        &self,
        root_link: &str,
        x: u64,
        y: u64,
        z: u32,
        resolution: u32,
    ) -> Result<Vec<u8>, TreeError> {
        let image = self.get_tile_image(root_link, x, y, z, resolution)?;
        Ok(encode_jpeg(&image, self.tiles.jpeg_quality)?)
    }

    pub fn get_node_link(
        &self,
        root_link: &str,
        x: u64,
        y: u64,
        z: u32,
    ) -> Result<NodeAddress, TreeError> {
        self.check_zoom(z)?;
        let root = self.root(root_link)?;
        root.tree.node_address_at_xyz(&root.serializer, x, y, z)
    }

    /// Forget a loaded root. Returns false when it was not loaded.
    pub fn drop_root_link(&self, root_link: &str) -> bool {
        let dropped = self.roots.write().remove(root_link).is_some();
        if dropped {
            info!(root = %root_link, "Dropped tile server root");
        } else {
            debug!(root = %root_link, "Root link not loaded");
        }
        dropped
    }

    pub fn loaded_roots(&self) -> Vec<String> {
        self.roots.read().keys().cloned().collect()
    }

    /// Drop every loaded root and empty the disk cache.
    pub fn cache_burst(&self) -> Result<String, StorageError> {
        let dropped = {
            let mut roots = self.roots.write();
            let count = roots.len();
            roots.clear();
            count
        };
        let mut message = format!("Dropped {} tile server roots", dropped);
        if let Some(cache) = &self.cache {
            message.push_str(". ");
            message.push_str(&cache.lock().cache_burst()?);
        }
        info!("{}", message);
        Ok(message)
    }

    pub fn stats(&self) -> TileServerStats {
        TileServerStats {
            roots_loaded: self.roots.read().len(),
            cache: self.cache.as_ref().map(|cache| cache.lock().stats()),
        }
    }

    pub fn stats_json(&self) -> serde_json::Value {
        serde_json::json!(self.stats())
    }

    /// Render tiles breadth first from the root until the cache holds
    /// `limit` files, every node visited once and no deeper than the
    /// configured maximum zoom. Returns the number of tiles rendered.
    pub fn populate_cache(&self, root_link: &str, limit: usize) -> Result<usize, TreeError> {
        let Some(cache) = &self.cache else {
            warn!("Populate requested without a disk cache");
            return Ok(0);
        };
        let root = self.root(root_link)?;
        let resolution = self.tiles.default_resolution;
        check_resolution(resolution)?;

        let starting_count = cache.lock().count();
        info!(
            root = %root_link,
            files = starting_count,
            limit,
            "Starting tile cache populator"
        );

        let mut visited = HashSet::from([root.tree.address()]);
        let mut queue = VecDeque::from([(Arc::clone(&root.tree), QuadKey::root())]);
        let mut rendered = 0;
        while let Some((node, quad_key)) = queue.pop_front() {
            if starting_count + rendered >= limit {
                break;
            }
            self.tile_at_quad_key(&root, &quad_key, resolution)?;
            rendered += 1;

            if quad_key.len() as u32 >= self.tiles.max_zoom {
                continue;
            }
            for (index, child) in node.children(&root.serializer)?.into_iter().enumerate() {
                if visited.insert(child.address()) {
                    queue.push_back((child, quad_key.child(index)));
                }
            }
        }
        info!(root = %root_link, rendered, "Tile cache populator finished");
        Ok(rendered)
    }

    /// [`TileServer::populate_cache`] with the configured populate limit.
    pub fn populate_cache_default(&self, root_link: &str) -> Result<usize, TreeError> {
        self.populate_cache(root_link, self.populate_limit)
    }

    pub fn populate_cache_default_async(
        self: &Arc<Self>,
        root_link: impl Into<String>,
    ) -> BackgroundTask<Result<usize, TreeError>> {
        self.populate_cache_async(root_link, self.populate_limit)
    }

    pub fn populate_cache_async(
        self: &Arc<Self>,
        root_link: impl Into<String>,
        limit: usize,
    ) -> BackgroundTask<Result<usize, TreeError>> {
        let server = Arc::clone(self);
        let root_link = root_link.into();
        BackgroundTask::start(move || server.populate_cache(&root_link, limit))
    }

    fn check_zoom(&self, z: u32) -> Result<(), TreeError> {
        if z > self.tiles.max_zoom {
            return Err(TreeError::ZoomOutOfRange {
                zoom: z,
                max: self.tiles.max_zoom,
            });
        }
        Ok(())
    }

    fn tile_at_quad_key(
        &self,
        root: &TileRoot,
        quad_key: &QuadKey,
        resolution: u32,
    ) -> Result<Canvas, TreeError> {
        let key = TileKey::new(
            root.tree.filename(),
            format!("{}/{}", root.tree.name(), quad_key.as_str()),
            resolution,
        );

        if let Some(cache) = &self.cache {
            let cache = cache.lock();
            if cache.has_image(&key) {
                match cache.get_image(&key) {
                    Ok(image) => return Ok(image),
                    Err(e) => warn!(error = %e, "Unreadable cached tile, rendering again"),
                }
            }
        }

        let image = root
            .tree
            .get_image_at_quad_key(&root.serializer, resolution, quad_key)?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.lock().put_image(&image, &key) {
                warn!(error = %e, "Failed to cache tile");
            }
        }
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::save_tree;
    use crate::tree::test_support::Detached;
    use crate::tree::{Child, ImageTree};
    use crate::value::Pixel;
    use tempfile::TempDir;

    fn write_sample(dir: &TempDir) -> String {
        let filename = dir.path().join("tiles.tsv").display().to_string();
        let leaf = |name: &str, r, g, b| {
            Child::from(ImageTree::leaf(name, &filename, Pixel::new(r, g, b).into()))
        };
        let tree = ImageTree::new(
            "root",
            &filename,
            Pixel::new(0, 0, 0).into(),
            vec![
                leaf("a", 255, 0, 0),
                leaf("b", 0, 255, 0),
                leaf("c", 0, 0, 255),
                leaf("d", 255, 255, 255),
            ],
        )
        .unwrap();
        save_tree(&Detached, &tree).unwrap();
        format!("root@{}", filename)
    }

    fn server(dir: &TempDir) -> TileServer {
        let cache = TileCache::open(dir.path().join("cache"), 100).unwrap();
        TileServer::new(TileConfig::default(), FetchConfig::default()).with_cache(cache)
    }

    #[test]
    fn test_tile_image_and_cache_fill() {
        let dir = TempDir::new().unwrap();
        let root = write_sample(&dir);
        let server = server(&dir);

        let tile = server.get_tile_image(&root, 1, 0, 1, 8).unwrap();
        assert_eq!(tile.dimensions(), (8, 8));
        assert_eq!(tile.get_pixel(4, 4).0, [0, 255, 0]);
        assert_eq!(server.stats().cache.unwrap().count, 1);

        let again = server.get_tile_image(&root, 1, 0, 1, 8).unwrap();
        assert_eq!(again.dimensions(), (8, 8));
        assert_eq!(server.stats().cache.unwrap().count, 1);
    }

    #[test]
    fn test_unknown_root_is_not_found() {
        let dir = TempDir::new().unwrap();
        let server = server(&dir);
        let missing = format!("root@{}", dir.path().join("absent.tsv").display());
        assert!(matches!(
            server.get_tile_image(&missing, 0, 0, 0, 8),
            Err(TreeError::NodeNotFound(_))
        ));
        assert!(server.loaded_roots().is_empty());
    }

    #[test]
    fn test_node_link_and_drop() {
        let dir = TempDir::new().unwrap();
        let root = write_sample(&dir);
        let server = server(&dir);

        let address = server.get_node_link(&root, 0, 1, 1).unwrap();
        assert_eq!(address.node_name, "c");
        assert!(server.drop_root_link(&root));
        assert!(!server.drop_root_link(&root));
    }

    #[test]
    fn test_populate_and_burst() {
        let dir = TempDir::new().unwrap();
        let root = write_sample(&dir);
        let server = Arc::new(server(&dir));

        let rendered = server.populate_cache_async(root.clone(), 3).wait().unwrap().unwrap();
        assert_eq!(rendered, 3);
        assert_eq!(server.stats().cache.unwrap().count, 3);

        assert_eq!(server.populate_cache(&root, 100).unwrap(), 5);

        server.cache_burst().unwrap();
        let stats = server.stats_json();
        assert_eq!(stats["roots_loaded"], 0);
        assert_eq!(stats["cache"]["count"], 0);
    }

    #[test]
    fn test_populate_with_configured_limit() {
        let dir = TempDir::new().unwrap();
        let root = write_sample(&dir);
        let config = GraphMapConfig {
            cache: CacheConfig {
                dir: Some(dir.path().join("configured")),
                capacity: 100,
                populate_limit: 2,
            },
            ..GraphMapConfig::default()
        };
        let server = Arc::new(TileServer::from_config(&config).unwrap());
        assert_eq!(server.populate_cache_default(&root).unwrap(), 2);
        assert_eq!(server.stats().cache.unwrap().count, 2);

        // the limit counts files already cached
        let rendered = server
            .populate_cache_default_async(root.clone())
            .wait()
            .unwrap()
            .unwrap();
        assert_eq!(rendered, 0);
    }

    #[test]
    fn test_jpeg_tile() {
        let dir = TempDir::new().unwrap();
        let root = write_sample(&dir);
        let server = TileServer::new(TileConfig::default(), FetchConfig::default());
        let bytes = server.get_tile_jpeg(&root, 0, 0, 0, 16).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert!(server.get_tile_image(&root, 0, 0, 0, 12).is_err());
    }

    #[test]
    fn test_zoom_beyond_maximum_rejected() {
        let dir = TempDir::new().unwrap();
        let root = write_sample(&dir);
        let tiles = TileConfig {
            max_zoom: 64,
            ..TileConfig::default()
        };
        let server = TileServer::new(tiles, FetchConfig::default());
        assert!(matches!(
            server.get_tile_image(&root, 0, 0, 65, 8),
            Err(TreeError::ZoomOutOfRange { zoom: 65, max: 64 })
        ));
        assert!(matches!(
            server.get_node_link(&root, u64::MAX, 0, 65),
            Err(TreeError::ZoomOutOfRange { .. })
        ));
        // within range, the sample tree simply ends after one level
        assert!(matches!(
            server.get_node_link(&root, u64::MAX, 0, 64),
            Err(TreeError::NodeNotFound(_))
        ));
        assert_eq!(server.get_node_link(&root, 1, 0, 1).unwrap().node_name, "b");
    }
}
