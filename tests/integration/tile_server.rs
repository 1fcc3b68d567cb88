use super::seeded_tree;
use graphmap::config::{FetchConfig, TileConfig};
use graphmap::store::save_tree;
use graphmap::tree::{images_equal, mean_squared_error};
use graphmap::{Serializer, TileCache, TileServer};
use std::sync::Arc;
use tempfile::TempDir;

fn setup(capacity: usize) -> (TempDir, String, Arc<TileServer>) {
    let dir = TempDir::new().unwrap();
    let filename = dir.path().join("world.itpb.gz").display().to_string();
    let tree = seeded_tree(21, "world", &filename, 4);
    save_tree(&Serializer::default(), &tree).unwrap();

    let tiles = TileConfig {
        default_resolution: 16,
        ..TileConfig::default()
    };
    let cache = TileCache::open(dir.path().join("cache"), capacity).unwrap();
    let server = TileServer::new(tiles, FetchConfig::default()).with_cache(cache);
    (dir, format!("world@{}", filename), Arc::new(server))
}

#[test]
fn cached_tiles_stay_close_to_fresh_renders() {
    let (_dir, root, server) = setup(100);
    let fresh = server.get_tile_image(&root, 2, 1, 2, 16).unwrap();
    assert_eq!(server.stats().cache.unwrap().count, 1);
    let cached = server.get_tile_image(&root, 2, 1, 2, 16).unwrap();
    assert_eq!(cached.dimensions(), fresh.dimensions());
    assert!(mean_squared_error(&fresh, &cached) < 1000.0);

    let uncached = TileServer::new(TileConfig::default(), FetchConfig::default());
    let direct = uncached.get_tile_image(&root, 2, 1, 2, 16).unwrap();
    assert!(images_equal(&fresh, &direct));
    assert_eq!(
        server.get_node_link(&root, 2, 1, 2).unwrap().node_name,
        "world12"
    );
}

#[test]
fn populate_respects_cache_capacity() {
    let (_dir, root, server) = setup(10);
    let task = server.populate_cache_async(root.clone(), 50);
    let rendered = task.wait().unwrap().unwrap();
    assert_eq!(rendered, 50);

    let stats = server.stats().cache.unwrap();
    assert!(stats.count <= 10);
    assert_eq!(stats.count, TileCache::open(stats.dir.clone(), 10).unwrap().count());
}

#[test]
fn populate_stops_at_limit() {
    let (_dir, root, server) = setup(1000);
    assert_eq!(server.populate_cache(&root, 7).unwrap(), 7);
    assert_eq!(server.stats().cache.unwrap().count, 7);
    assert_eq!(server.populate_cache(&root, 7).unwrap(), 0);
}
