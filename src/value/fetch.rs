//! Image fetching
//!
//! Web images are downloaded (or read from disk for local paths), decoded,
//! padded to a power-of-two square and kept in a bounded LRU cache owned by
//! the fetcher. Each serializer owns its own fetcher; there is no process
//! wide image cache.

use crate::error::StorageError;
use crate::store::io;
use crate::types::Canvas;
use image::imageops::{self, FilterType};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Side of the black square returned for images that do not exist.
pub const MISSING_IMAGE_SIDE: u32 = 256;

pub struct ImageFetcher {
    cache: Mutex<LruCache<String, Arc<Canvas>>>,
    timeout: Duration,
}

impl ImageFetcher {
    pub fn new(capacity: usize, timeout: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        ImageFetcher {
            cache: Mutex::new(LruCache::new(capacity)),
            timeout,
        }
    }

    pub fn fetch(&self, url: &str) -> Result<Arc<Canvas>, StorageError> {
        if let Some(image) = self.cache.lock().get(url) {
            return Ok(Arc::clone(image));
        }

        let image = Arc::new(self.load(url)?);
        self.cache.lock().put(url.to_string(), Arc::clone(&image));
        Ok(image)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.lock().len()
    }

    fn load(&self, url: &str) -> Result<Canvas, StorageError> {
        let Some(bytes) = io::fetch_bytes(url, self.timeout)? else {
            warn!(url = %url, "Image not found, using black placeholder");
            return Ok(Canvas::new(MISSING_IMAGE_SIDE, MISSING_IMAGE_SIDE));
        };
        let decoded = image::load_from_memory(&bytes)?.to_rgb8();
        debug!(
            url = %url,
            width = decoded.width(),
            height = decoded.height(),
            "Fetched image"
        );
        Ok(reshape_proper(decoded))
    }
}

/// Resize so the longer side equals `max_resolution`, keeping aspect ratio.
pub fn stretch_keep_aspect(image: &Canvas, max_resolution: u32) -> Canvas {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Canvas::new(max_resolution, max_resolution);
    }
    let (new_width, new_height) = if width >= height {
        let h = (u64::from(height) * u64::from(max_resolution) / u64::from(width)) as u32;
        (max_resolution, h.max(1))
    } else {
        let w = (u64::from(width) * u64::from(max_resolution) / u64::from(height)) as u32;
        (w.max(1), max_resolution)
    };
    imageops::resize(image, new_width, new_height, FilterType::Triangle)
}

/// Place the image at the top-left of a black square whose side is the
/// next power of two not smaller than its longer side.
pub fn reshape_proper(image: Canvas) -> Canvas {
    let (width, height) = image.dimensions();
    let side = width.max(height).max(1).next_power_of_two();
    if width == side && height == side {
        return image;
    }
    let stretched = stretch_keep_aspect(&image, side);
    let mut canvas = Canvas::new(side, side);
    imageops::replace(&mut canvas, &stretched, 0, 0);
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_stretch_keep_aspect() {
        let image = Canvas::new(500, 300);
        let stretched = stretch_keep_aspect(&image, 600);
        assert_eq!(stretched.dimensions(), (600, 360));

        let square = Canvas::new(300, 300);
        assert_eq!(stretch_keep_aspect(&square, 600).dimensions(), (600, 600));
    }

    #[test]
    fn test_reshape_proper_pads_with_black() {
        let image = Canvas::from_pixel(100, 50, Rgb([200, 10, 10]));
        let proper = reshape_proper(image);
        assert_eq!(proper.dimensions(), (128, 128));
        assert_eq!(proper.get_pixel(0, 0).0[0], 200);
        assert_eq!(proper.get_pixel(0, 127).0, [0, 0, 0]);
    }

    #[test]
    fn test_reshape_proper_keeps_power_of_two_squares() {
        let image = Canvas::from_pixel(64, 64, Rgb([1, 2, 3]));
        assert_eq!(reshape_proper(image.clone()), image);
    }

    #[test]
    fn test_fetch_local_file_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.png");
        Canvas::from_pixel(8, 8, Rgb([0, 0, 255]))
            .save(&path)
            .unwrap();

        let fetcher = ImageFetcher::new(2, Duration::from_secs(1));
        let url = path.to_string_lossy().to_string();
        let first = fetcher.fetch(&url).unwrap();
        let second = fetcher.fetch(&url).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.get_pixel(3, 3).0, [0, 0, 255]);
        assert_eq!(fetcher.cached_len(), 1);
    }

    #[test]
    fn test_missing_local_image_is_black_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let url = dir.path().join("nope.jpg").to_string_lossy().to_string();
        let fetcher = ImageFetcher::new(1, Duration::from_secs(1));
        let image = fetcher.fetch(&url).unwrap();
        assert_eq!(image.dimensions(), (MISSING_IMAGE_SIDE, MISSING_IMAGE_SIDE));
        assert!(image.pixels().all(|p| p.0 == [0, 0, 0]));
    }
}
