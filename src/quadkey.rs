//! QuadKeys
//!
//! A quadkey is a path from the root of an image tree, one character per
//! level: `0` top-left, `1` top-right, `2` bottom-left, `3` bottom-right.
//! The empty quadkey addresses the root itself.

use crate::error::TreeError;
use std::fmt;
use std::str::FromStr;

/// Validated quadkey (every character in `0..=3`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuadKey(String);

impl QuadKey {
    pub fn new(quad_key: &str) -> Result<Self, TreeError> {
        if !is_valid_quadkey(quad_key) {
            return Err(TreeError::InvalidQuadKey(quad_key.to_string()));
        }
        Ok(QuadKey(quad_key.to_string()))
    }

    pub fn root() -> Self {
        QuadKey(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Depth below the root.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First quadrant index, `None` at the root.
    pub fn head(&self) -> Option<usize> {
        self.0.bytes().next().map(|b| usize::from(b - b'0'))
    }

    /// Quadkey relative to the first quadrant.
    pub fn tail(&self) -> QuadKey {
        QuadKey(self.0.get(1..).unwrap_or_default().to_string())
    }

    /// Quadrant indices from the top of the tree down.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.bytes().map(|b| usize::from(b - b'0'))
    }

    /// Quadkey of the `index` child of this one.
    pub fn child(&self, index: usize) -> QuadKey {
        debug_assert!(index < 4, "child index out of range");
        let mut key = self.0.clone();
        key.push(char::from(b'0' + index as u8));
        QuadKey(key)
    }

    /// Prefix of the first `depth` characters.
    pub fn prefix(&self, depth: usize) -> QuadKey {
        QuadKey(self.0[..depth.min(self.0.len())].to_string())
    }

    /// Suffix after the first `depth` characters.
    pub fn suffix(&self, depth: usize) -> QuadKey {
        QuadKey(self.0[depth.min(self.0.len())..].to_string())
    }

    pub fn from_xyz(x: u64, y: u64, z: u32) -> QuadKey {
        QuadKey(xyz_to_quadkey(x, y, z))
    }

    /// Tile coordinates of this quadkey. Fails when `x` or `y` does not
    /// fit in 64 bits.
    pub fn to_xyz(&self) -> Result<(u64, u64, u32), TreeError> {
        let overflow = || TreeError::InvalidQuadKey(self.0.clone());
        let z = u32::try_from(self.len()).map_err(|_| overflow())?;
        let mut x = 0u64;
        let mut y = 0u64;
        for index in self.indices() {
            x = push_bit(x, index as u64 & 1).ok_or_else(overflow)?;
            y = push_bit(y, index as u64 >> 1).ok_or_else(overflow)?;
        }
        Ok((x, y, z))
    }
}

impl fmt::Display for QuadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for QuadKey {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuadKey::new(s)
    }
}

fn push_bit(value: u64, bit: u64) -> Option<u64> {
    value.checked_mul(2)?.checked_add(bit)
}

pub fn is_valid_quadkey(quad_key: &str) -> bool {
    quad_key.bytes().all(|b| (b'0'..=b'3').contains(&b))
}

/// Convert tile pyramid coordinates to a quadkey of length `z`.
///
/// Each level contributes `2 * y_bit + x_bit`, most significant level first.
/// Levels above bit 63 contribute `0`.
pub fn xyz_to_quadkey(x: u64, y: u64, z: u32) -> String {
    (0..z)
        .rev()
        .map(|level| {
            let x_bit = x.checked_shr(level).unwrap_or(0) & 1;
            let y_bit = y.checked_shr(level).unwrap_or(0) & 1;
            char::from(b'0' + (2 * y_bit + x_bit) as u8)
        })
        .collect()
}

/// Inverse of [`xyz_to_quadkey`].
pub fn quadkey_to_xyz(quad_key: &str) -> Result<(u64, u64, u32), TreeError> {
    QuadKey::new(quad_key)?.to_xyz()
}

/// Tile path in `z/y/x` order.
pub fn get_path_zyx(x: u64, y: u64, z: u32) -> String {
    format!("{}/{}/{}", z, y, x)
}
