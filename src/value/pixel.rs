//! Solid color pixels.

use crate::error::TreeError;
use crate::types::Canvas;
use image::Rgb;

/// Channels differing by this much or more are never approximately equal.
pub const SIMILARITY_THRESHOLD: u8 = 5;

/// A solid RGB color covering the whole region of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Pixel { r, g, b }
    }

    /// Build from integer components.
    ///
    /// Zero components mean "unset" and yield `None`; exactly three in
    /// `0..=255` yield a pixel; anything else is a creation failure.
    pub fn from_components(components: &[i64]) -> Result<Option<Pixel>, TreeError> {
        match components {
            [] => Ok(None),
            [r, g, b] => {
                let channel = |c: i64| {
                    u8::try_from(c).map_err(|_| {
                        TreeError::CreationFailed(format!("Invalid pixel {:?}", components))
                    })
                };
                Ok(Some(Pixel::new(channel(*r)?, channel(*g)?, channel(*b)?)))
            }
            _ => Err(TreeError::CreationFailed(format!(
                "{:?} is incorrect format for pixel",
                components
            ))),
        }
    }

    pub fn rgb(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn approximately_equal(&self, other: &Pixel) -> bool {
        self.rgb()
            .iter()
            .zip(other.rgb().iter())
            .all(|(a, b)| a.abs_diff(*b) < SIMILARITY_THRESHOLD)
    }

    /// Uniform canvas of this color.
    pub fn canvas(&self, resolution: u32) -> Canvas {
        Canvas::from_pixel(resolution, resolution, Rgb(self.rgb()))
    }

    /// Text form used by the line-oriented encoding, three tab-terminated fields.
    pub fn serialize(pixel: Option<&Pixel>) -> String {
        match pixel {
            Some(p) => format!("{}\t{}\t{}\t", p.r, p.g, p.b),
            None => "\t\t\t".to_string(),
        }
    }

    pub fn deserialize(serialized: &str) -> Result<Option<Pixel>, TreeError> {
        let fields: Vec<&str> = serialized.split('\t').collect();
        Pixel::deserialize_fields(&fields)
    }

    /// Parse the non-empty fields of a list as pixel components.
    pub fn deserialize_fields(fields: &[&str]) -> Result<Option<Pixel>, TreeError> {
        let components = fields
            .iter()
            .filter(|f| !f.is_empty())
            .map(|f| {
                f.trim().parse::<i64>().map_err(|_| {
                    TreeError::CreationFailed(format!("Invalid pixel component {:?}", f))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Pixel::from_components(&components)
    }
}

impl From<[u8; 3]> for Pixel {
    fn from(rgb: [u8; 3]) -> Self {
        Pixel::new(rgb[0], rgb[1], rgb[2])
    }
}

/// Arithmetic mean per channel, rounded down.
pub fn average_pixels(pixels: &[Pixel]) -> Pixel {
    if pixels.is_empty() {
        return Pixel::new(0, 0, 0);
    }
    let count = pixels.len() as u32;
    let mean = |channel: fn(&Pixel) -> u8| {
        let total: u32 = pixels.iter().map(|p| u32::from(channel(p))).sum();
        (total / count) as u8
    };
    Pixel::new(mean(|p| p.r), mean(|p| p.g), mean(|p| p.b))
}
