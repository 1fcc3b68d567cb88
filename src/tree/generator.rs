//! Tree generators: random trees for tests and benchmarks, and trees built
//! from raster images.

use crate::error::TreeError;
use crate::tree::{Child, ImageTree};
use crate::types::{is_power_of_two, Canvas, CHILDREN_PER_NODE};
use crate::value::{ImageValue, Pixel};
use image::imageops;
use rand::Rng;

/// Each channel shifted by a uniform amount in `-variance..=variance`,
/// wrapping modulo 256.
pub fn similar_pixel<R: Rng>(rng: &mut R, pixel: Pixel, variance: u8) -> Pixel {
    let variance = i16::from(variance);
    let mut shift = |c: u8| (i16::from(c) + rng.random_range(-variance..=variance)).rem_euclid(256) as u8;
    Pixel::new(shift(pixel.r), shift(pixel.g), shift(pixel.b))
}

/// Full tree of `height` levels, children named `name + digit`, each node
/// colored similar to its parent.
pub fn random_tree<R: Rng>(
    rng: &mut R,
    name: &str,
    filename: &str,
    height: usize,
    pixel: Pixel,
    variance: u8,
) -> ImageTree {
    let own = similar_pixel(rng, pixel, variance);
    let children = if height > 1 {
        (0..CHILDREN_PER_NODE)
            .map(|i| {
                Child::from(random_tree(
                    rng,
                    &format!("{}{}", name, i),
                    filename,
                    height - 1,
                    own,
                    variance,
                ))
            })
            .collect()
    } else {
        Vec::new()
    };
    tree_with_children(name, filename, own, children)
}

/// Like [`random_tree`], but each node stops early with probability 1/4.
pub fn random_tree_var_child<R: Rng>(
    rng: &mut R,
    name: &str,
    filename: &str,
    height: usize,
    pixel: Pixel,
    variance: u8,
) -> ImageTree {
    let own = similar_pixel(rng, pixel, variance);
    let have_children = rng.random_range(0..CHILDREN_PER_NODE) > 0;
    let children = if height > 1 && have_children {
        (0..CHILDREN_PER_NODE)
            .map(|i| {
                Child::from(random_tree_var_child(
                    rng,
                    &format!("{}{}", name, i),
                    filename,
                    height - 1,
                    own,
                    variance,
                ))
            })
            .collect()
    } else {
        Vec::new()
    };
    tree_with_children(name, filename, own, children)
}

fn tree_with_children(name: &str, filename: &str, pixel: Pixel, children: Vec<Child>) -> ImageTree {
    match <[Child; CHILDREN_PER_NODE]>::try_from(children) {
        Ok(children) => ImageTree::from_children(
            name.to_string(),
            filename.to_string(),
            pixel.into(),
            children,
        ),
        Err(_) => ImageTree::leaf(name, filename, pixel.into()),
    }
}

/// Tree whose leaves are the single pixels of `image`, named by appending
/// quadrant digits to `name`. The image must be a power-of-two square.
pub fn from_image(name: &str, filename: &str, image: &Canvas) -> Result<ImageTree, TreeError> {
    let (width, height) = image.dimensions();
    if width != height || !is_power_of_two(width) {
        return Err(TreeError::CreationFailed(format!(
            "Image of {}x{} is not a power-of-two square",
            width, height
        )));
    }
    Ok(from_region(name, filename, image, 0, 0, width))
}

fn from_region(name: &str, filename: &str, image: &Canvas, x: u32, y: u32, side: u32) -> ImageTree {
    if side == 1 {
        return ImageTree::leaf(name, filename, Pixel::from(image.get_pixel(x, y).0).into());
    }
    let half = side / 2;
    let children = [(0, 0), (half, 0), (0, half), (half, half)]
        .iter()
        .enumerate()
        .map(|(i, (dx, dy))| {
            Child::from(from_region(
                &format!("{}{}", name, i),
                filename,
                image,
                x + dx,
                y + dy,
                half,
            ))
        })
        .collect::<Vec<_>>();
    match <[Child; CHILDREN_PER_NODE]>::try_from(children) {
        Ok(children) => {
            ImageTree::from_children(name.to_string(), filename.to_string(), ImageValue::Unset, children)
        }
        Err(_) => ImageTree::empty(name, filename),
    }
}

/// Convenience wrapper cropping `image` to its top-left power-of-two square.
pub fn from_any_image(name: &str, filename: &str, image: &Canvas) -> Result<ImageTree, TreeError> {
    let side = image.width().min(image.height());
    if side == 0 {
        return Err(TreeError::CreationFailed("Empty image".to_string()));
    }
    let side = 1u32 << (31 - side.leading_zeros());
    let square = imageops::crop_imm(image, 0, 0, side, side).to_image();
    from_image(name, filename, &square)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::test_support::Detached;
    use image::Rgb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_similar_pixel_within_variance() {
        let mut rng = StdRng::seed_from_u64(7);
        let base = Pixel::new(100, 100, 100);
        for _ in 0..50 {
            let p = similar_pixel(&mut rng, base, 3);
            assert!(p.r.abs_diff(100) <= 3 && p.g.abs_diff(100) <= 3 && p.b.abs_diff(100) <= 3);
        }
        assert_eq!(similar_pixel(&mut rng, base, 0), base);
    }

    #[test]
    fn test_random_tree_is_full() {
        let mut rng = StdRng::seed_from_u64(1);
        let tree = random_tree(&mut rng, "main", "gen.tsv", 3, Pixel::new(0, 0, 0), 5);
        assert_eq!(tree.count_nodes(&Detached).unwrap(), 1 + 4 + 16);
        assert_eq!(tree.height(&Detached, 10).unwrap(), 3);
    }

    #[test]
    fn test_random_tree_var_child_bounded() {
        let mut rng = StdRng::seed_from_u64(2);
        let tree = random_tree_var_child(&mut rng, "main", "gen.tsv", 4, Pixel::new(0, 0, 0), 5);
        assert!(tree.height(&Detached, 10).unwrap() <= 4);
    }

    #[test]
    fn test_from_image() {
        let mut image = Canvas::new(2, 2);
        image.put_pixel(1, 0, Rgb([1, 2, 3]));
        image.put_pixel(1, 1, Rgb([9, 9, 9]));
        let tree = from_image("img", "img.tsv", &image).unwrap();
        assert_eq!(tree.count_nodes(&Detached).unwrap(), 5);
        assert_eq!(
            tree.children_links(),
            vec!["img0@img.tsv", "img1@img.tsv", "img2@img.tsv", "img3@img.tsv"]
        );
        let rendered = tree.get_image(&Detached, 2).unwrap();
        assert_eq!(rendered, image);
    }

    #[test]
    fn test_from_image_rejects_non_square() {
        assert!(from_image("x", "x.tsv", &Canvas::new(4, 2)).is_err());
        assert!(from_image("x", "x.tsv", &Canvas::new(3, 3)).is_err());
        assert_eq!(
            from_any_image("x", "x.tsv", &Canvas::new(5, 7))
                .unwrap()
                .count_nodes(&Detached)
                .unwrap(),
            21
        );
    }
}
