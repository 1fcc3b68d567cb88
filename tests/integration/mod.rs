//! Integration tests exercising trees through files on disk.

mod graph_map;
mod render_consistency;
mod serializer_round_trip;
mod tile_server;

use graphmap::tree::generator::random_tree;
use graphmap::{ImageTree, Pixel};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Deterministic random tree of `height` levels owned by `filename`.
pub fn seeded_tree(seed: u64, name: &str, filename: &str, height: usize) -> ImageTree {
    let mut rng = StdRng::seed_from_u64(seed);
    random_tree(&mut rng, name, filename, height, Pixel::new(120, 60, 200), 40)
}
