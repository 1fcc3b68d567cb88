//! Image Values
//!
//! The value attached to a node answers "what does this region look like"
//! before any children are painted over it. It is a closed set of variants:
//! nothing, a solid color, an external raster image, or another tree
//! addressed by link.

pub mod fetch;
pub mod pixel;
pub mod web;

pub use fetch::{reshape_proper, stretch_keep_aspect, ImageFetcher};
pub use pixel::{average_pixels, Pixel, SIMILARITY_THRESHOLD};
pub use web::{is_image_file, WebImage};

use crate::error::TreeError;
use crate::store::Resolver;
use crate::types::Canvas;

/// Nested tree values may reference trees whose values are trees again.
/// Rendering gives up past this depth.
pub const MAX_VALUE_NESTING: usize = 16;

/// Resolution used when a nested tree stands in for a full-resolution image.
pub const NESTED_TREE_RESOLUTION: u32 = 256;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ImageValue {
    #[default]
    Unset,
    Pixel(Pixel),
    WebImage(WebImage),
    /// Another tree, by node address
    Node(String),
}

impl ImageValue {
    /// Value referenced by an image column: image files become web images,
    /// anything else is treated as a node address.
    pub fn from_image_link(link: &str) -> ImageValue {
        if is_image_file(link) {
            ImageValue::WebImage(WebImage::new(link))
        } else {
            ImageValue::Node(link.to_string())
        }
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, ImageValue::Unset)
    }

    pub fn pixel(&self) -> Option<&Pixel> {
        match self {
            ImageValue::Pixel(p) => Some(p),
            _ => None,
        }
    }

    /// Link written to the image column of the encodings, if any.
    pub fn image_link(&self) -> Option<&str> {
        match self {
            ImageValue::WebImage(web) => Some(web.url()),
            ImageValue::Node(link) => Some(link),
            _ => None,
        }
    }

    /// Render the value alone at `resolution`. Unset values render black.
    pub fn render(&self, resolver: &dyn Resolver, resolution: u32) -> Result<Canvas, TreeError> {
        self.render_nested(resolver, resolution, 0)
    }

    pub(crate) fn render_nested(
        &self,
        resolver: &dyn Resolver,
        resolution: u32,
        nesting: usize,
    ) -> Result<Canvas, TreeError> {
        match self {
            ImageValue::Unset => Ok(Canvas::new(resolution, resolution)),
            ImageValue::Pixel(p) => Ok(p.canvas(resolution)),
            ImageValue::WebImage(web) => web.render(resolver, resolution),
            ImageValue::Node(link) => {
                if nesting >= MAX_VALUE_NESTING {
                    return Err(TreeError::CreationFailed(format!(
                        "Nested tree value {} exceeds nesting depth {}",
                        link, MAX_VALUE_NESTING
                    )));
                }
                let tree = resolver.resolve_node(link)?;
                let mut canvas = Canvas::new(resolution, resolution);
                tree.render_nested(resolver, resolution, &mut canvas, nesting + 1)?;
                Ok(canvas)
            }
        }
    }

    /// Largest natural rendering of the value, used when zooming through
    /// quadkeys below a node that carries it.
    pub fn full_resolution_image(&self, resolver: &dyn Resolver) -> Result<Canvas, TreeError> {
        match self {
            ImageValue::Unset => Ok(Canvas::new(1, 1)),
            ImageValue::Pixel(p) => Ok(p.canvas(1)),
            ImageValue::WebImage(web) => Ok(web.full_resolution_image(resolver)?.as_ref().clone()),
            ImageValue::Node(_) => self.render(resolver, NESTED_TREE_RESOLUTION),
        }
    }
}

impl From<Pixel> for ImageValue {
    fn from(pixel: Pixel) -> Self {
        ImageValue::Pixel(pixel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_image_link() {
        assert_eq!(
            ImageValue::from_image_link("http://a.com/b.jpg"),
            ImageValue::WebImage(WebImage::new("http://a.com/b.jpg"))
        );
        assert_eq!(
            ImageValue::from_image_link("pic.PNG"),
            ImageValue::WebImage(WebImage::new("pic.PNG"))
        );
        assert_eq!(
            ImageValue::from_image_link("root@other.tsv"),
            ImageValue::Node("root@other.tsv".to_string())
        );
    }

    #[test]
    fn test_is_set() {
        assert!(!ImageValue::Unset.is_set());
        assert!(ImageValue::Pixel(Pixel::new(0, 0, 0)).is_set());
        assert!(ImageValue::Node("x".into()).is_set());
    }

    #[test]
    fn test_image_link() {
        assert_eq!(ImageValue::Unset.image_link(), None);
        assert_eq!(ImageValue::from(Pixel::new(1, 2, 3)).image_link(), None);
        assert_eq!(
            ImageValue::from_image_link("a.jpg").image_link(),
            Some("a.jpg")
        );
    }
}
