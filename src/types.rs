//! Core types and constants shared across the image tree system.

use image::RgbImage;

/// Rendered raster: square RGB canvas, row-major, 8 bits per channel.
pub type Canvas = RgbImage;

/// Every non-leaf node has exactly this many children.
pub const CHILDREN_PER_NODE: usize = 4;

/// Separates node name from its owning file in a node address (`name@file`).
pub const SEPARATOR_CHARACTER: char = '@';

/// Separates an operator tag from the rest of a node name (`rot90#name`).
pub const OPERATOR_SEPARATOR: char = '#';

/// Marker used in versioned filenames (`fruits.ver_3.tsv`).
pub const VERSION_STRING: &str = "ver_";

/// File extension of the binary forest encoding.
pub const FOREST_FILE_EXTENSION: &str = ".itpb";

/// Returns true when `value` is a power of two (1 included).
pub fn is_power_of_two(value: u32) -> bool {
    value != 0 && value & (value - 1) == 0
}
