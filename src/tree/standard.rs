//! Well-known nodes.

use crate::tree::ImageTree;
use crate::value::Pixel;
use std::sync::Arc;

/// Name of the placeholder returned when a link does not resolve.
pub const NOT_FOUND_NAME: &str = "standard_nodes.not_found_node";

pub const NOT_FOUND_PIXEL: Pixel = Pixel::new(128, 128, 128);
pub const RED: Pixel = Pixel::new(255, 0, 0);
pub const GREEN: Pixel = Pixel::new(0, 255, 0);
pub const BLUE: Pixel = Pixel::new(0, 0, 255);

/// Grey leaf standing in for an unresolvable node of `filename`.
pub fn not_found_node(filename: &str) -> Arc<ImageTree> {
    Arc::new(ImageTree::leaf(
        NOT_FOUND_NAME,
        filename,
        NOT_FOUND_PIXEL.into(),
    ))
}

pub fn is_not_found(tree: &ImageTree) -> bool {
    tree.name() == NOT_FOUND_NAME
}

pub fn red_pixel_tree(filename: &str) -> ImageTree {
    ImageTree::leaf("red", filename, RED.into())
}

pub fn green_pixel_tree(filename: &str) -> ImageTree {
    ImageTree::leaf("green", filename, GREEN.into())
}

pub fn blue_pixel_tree(filename: &str) -> ImageTree {
    ImageTree::leaf("blue", filename, BLUE.into())
}
