//! Rendering
//!
//! A node paints its own value as the background, then each child paints
//! its quadrant on top at half the resolution. Quadkey renders walk the
//! path down, carrying the deepest set value (cropped to the remaining
//! quadkey) as the background for the node at the end of the path. Both
//! paths agree pixel for pixel on power-of-two resolutions.

use crate::error::TreeError;
use crate::quadkey::QuadKey;
use crate::store::Resolver;
use crate::tree::ImageTree;
use crate::types::{is_power_of_two, Canvas};
use image::imageops::{self, FilterType};

/// Renders below this mean squared error are considered identical.
pub const IMAGE_EQUALITY_TOLERANCE: f64 = 0.1;

pub(crate) fn check_resolution(resolution: u32) -> Result<(), TreeError> {
    if is_power_of_two(resolution) {
        Ok(())
    } else {
        Err(TreeError::InvalidResolution(resolution))
    }
}

/// Top-left corner of quadrant `index` in a canvas of side `2 * half`.
fn quadrant_origin(index: usize, half: u32) -> (u32, u32) {
    let x = if index % 2 == 1 { half } else { 0 };
    let y = if index >= 2 { half } else { 0 };
    (x, y)
}

impl ImageTree {
    /// Paint this tree onto `canvas`, which must be `resolution` square.
    pub fn render(
        &self,
        resolver: &dyn Resolver,
        resolution: u32,
        canvas: &mut Canvas,
    ) -> Result<(), TreeError> {
        self.render_nested(resolver, resolution, canvas, 0)
    }

    pub(crate) fn render_nested(
        &self,
        resolver: &dyn Resolver,
        resolution: u32,
        canvas: &mut Canvas,
        nesting: usize,
    ) -> Result<(), TreeError> {
        check_resolution(resolution)?;
        if canvas.dimensions() != (resolution, resolution) {
            return Err(TreeError::CanvasMismatch {
                expected: resolution,
                actual: canvas.dimensions(),
            });
        }

        if self.is_set() {
            *canvas = self.value().render_nested(resolver, resolution, nesting)?;
        }
        if self.is_leaf() || resolution == 1 {
            return Ok(());
        }

        let half = resolution / 2;
        for (index, child) in self.children(resolver)?.iter().enumerate() {
            let (x, y) = quadrant_origin(index, half);
            let mut quadrant = imageops::crop_imm(canvas, x, y, half, half).to_image();
            child.render_nested(resolver, half, &mut quadrant, nesting)?;
            imageops::replace(canvas, &quadrant, i64::from(x), i64::from(y));
        }
        Ok(())
    }

    /// Render the whole tree onto a fresh black canvas.
    pub fn get_image(&self, resolver: &dyn Resolver, resolution: u32) -> Result<Canvas, TreeError> {
        check_resolution(resolution)?;
        let mut canvas = Canvas::new(resolution, resolution);
        self.render(resolver, resolution, &mut canvas)?;
        Ok(canvas)
    }

    /// Render the region addressed by `quad_key` at `resolution`.
    pub fn get_image_at_quad_key(
        &self,
        resolver: &dyn Resolver,
        resolution: u32,
        quad_key: &QuadKey,
    ) -> Result<Canvas, TreeError> {
        check_resolution(resolution)?;
        self.render_at_quad_key(resolver, resolution, quad_key, None)
    }

    pub fn get_image_at_xyz(
        &self,
        resolver: &dyn Resolver,
        x: u64,
        y: u64,
        z: u32,
        resolution: u32,
    ) -> Result<Canvas, TreeError> {
        self.get_image_at_quad_key(resolver, resolution, &QuadKey::from_xyz(x, y, z))
    }

    fn render_at_quad_key(
        &self,
        resolver: &dyn Resolver,
        resolution: u32,
        quad_key: &QuadKey,
        background: Option<Canvas>,
    ) -> Result<Canvas, TreeError> {
        let Some(index) = quad_key.head() else {
            let mut canvas = background.unwrap_or_else(|| Canvas::new(resolution, resolution));
            self.render(resolver, resolution, &mut canvas)?;
            return Ok(canvas);
        };

        let background = if self.is_set() {
            let full = self.value().full_resolution_image(resolver)?;
            Some(image_at_quad_key(&full, resolution, quad_key))
        } else {
            background
        };

        if self.is_leaf() {
            return Ok(background.unwrap_or_else(|| Canvas::new(resolution, resolution)));
        }
        self.child(resolver, index)?
            .render_at_quad_key(resolver, resolution, &quad_key.tail(), background)
    }
}

/// Crop the region of `image` addressed by `quad_key` and scale it to
/// `resolution`. Cropping stops once the region is a single pixel.
pub fn image_at_quad_key(image: &Canvas, resolution: u32, quad_key: &QuadKey) -> Canvas {
    let (mut x, mut y) = (0u32, 0u32);
    let mut side = image.width().min(image.height());
    for index in quad_key.indices() {
        if side <= 1 {
            break;
        }
        side /= 2;
        let (dx, dy) = quadrant_origin(index, side);
        x += dx;
        y += dy;
    }
    let side = side.max(1);
    let region = imageops::crop_imm(image, x, y, side, side).to_image();
    if region.dimensions() == (resolution, resolution) {
        return region;
    }
    imageops::resize(&region, resolution, resolution, FilterType::Nearest)
}

/// Mean over pixels of the summed squared channel differences.
pub fn mean_squared_error(a: &Canvas, b: &Canvas) -> f64 {
    if a.dimensions() != b.dimensions() {
        return f64::INFINITY;
    }
    let pixels = u64::from(a.width()) * u64::from(a.height());
    if pixels == 0 {
        return 0.0;
    }
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw().iter())
        .map(|(x, y)| {
            let d = u64::from(x.abs_diff(*y));
            d * d
        })
        .sum();
    total as f64 / pixels as f64
}

pub fn images_equal(a: &Canvas, b: &Canvas) -> bool {
    mean_squared_error(a, b) < IMAGE_EQUALITY_TOLERANCE
}
