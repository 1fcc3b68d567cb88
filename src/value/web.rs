//! External raster images referenced by URL or local path.

use crate::error::TreeError;
use crate::store::Resolver;
use crate::types::Canvas;
use image::imageops::{self, FilterType};
use std::sync::Arc;

const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// True when the link names a raster image rather than a tree node.
pub fn is_image_file(link: &str) -> bool {
    let lower = link.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// An image fetched lazily through the resolver's image cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebImage {
    url: String,
}

impl WebImage {
    pub fn new(url: impl Into<String>) -> Self {
        WebImage { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The fetched image, already padded to a power-of-two square.
    pub fn full_resolution_image(&self, resolver: &dyn Resolver) -> Result<Arc<Canvas>, TreeError> {
        resolver.fetch_image(&self.url)
    }

    pub fn render(&self, resolver: &dyn Resolver, resolution: u32) -> Result<Canvas, TreeError> {
        let full = self.full_resolution_image(resolver)?;
        if full.dimensions() == (resolution, resolution) {
            return Ok(full.as_ref().clone());
        }
        // Nearest sampling keeps quadrant crops aligned with direct renders.
        Ok(imageops::resize(
            full.as_ref(),
            resolution,
            resolution,
            FilterType::Nearest,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file("https://i.imgur.com/abc.jpg"));
        assert!(is_image_file("/tmp/x.PNG"));
        assert!(is_image_file("photo.jpeg"));
        assert!(!is_image_file("tree.tsv"));
        assert!(!is_image_file("root@forest.itpb.gz"));
    }
}
