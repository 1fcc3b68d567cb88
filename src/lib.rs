//! GraphMap: Lazily-Loaded Infinite Raster Images
//!
//! An image is stored as a quadtree whose nodes carry a color, a web image
//! or a nested tree, and whose children may live in other files. Any
//! quadkey region renders at any power-of-two resolution, loading only the
//! files it touches.

pub mod address;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod operator;
pub mod persistence;
pub mod quadkey;
pub mod store;
pub mod task;
pub mod tileserver;
pub mod tree;
pub mod types;
pub mod value;

pub use address::NodeAddress;
pub use cache::{TileCache, TileKey};
pub use config::GraphMapConfig;
pub use error::{ApiError, StorageError, TaskError, TreeError};
pub use persistence::{GraphMap, MemoryPersistence, Persistence};
pub use quadkey::QuadKey;
pub use store::{Resolver, Serializer};
pub use tileserver::TileServer;
pub use tree::{Child, ImageTree};
pub use value::{ImageValue, Pixel};
