use super::seeded_tree;
use graphmap::tree::{image_at_quad_key, images_equal};
use graphmap::{Child, ImageTree, ImageValue, MemoryPersistence, Pixel, QuadKey};
use image::{Rgb, RgbImage};
use tempfile::TempDir;

const QUAD_KEYS: [&str; 8] = ["", "0", "1", "3", "12", "213", "0000", "3333"];

fn assert_consistent(tree: &ImageTree, resolver: &MemoryPersistence, full_resolution: u32) {
    let full = tree.get_image(resolver, full_resolution).unwrap();
    for key in QUAD_KEYS {
        let quad_key = QuadKey::new(key).unwrap();
        let tile_resolution = (full_resolution >> quad_key.len()).max(1);
        let direct = tree
            .get_image_at_quad_key(resolver, tile_resolution, &quad_key)
            .unwrap();
        let cropped = image_at_quad_key(&full, tile_resolution, &quad_key);
        assert!(images_equal(&direct, &cropped), "quadkey {:?} differs", key);
    }
}

#[test]
fn quad_key_render_matches_crop_of_full_render() {
    let tree = seeded_tree(11, "root", "", 5);
    assert_consistent(&tree, &MemoryPersistence::default(), 64);
}

#[test]
fn web_image_background_matches_crop() {
    let dir = TempDir::new().unwrap();
    let picture = dir.path().join("gradient.png");
    let gradient = RgbImage::from_fn(8, 8, |x, y| Rgb([(x * 30) as u8, (y * 30) as u8, 90]));
    gradient.save(&picture).unwrap();

    let detail = seeded_tree(5, "detail", "", 3);
    let children = vec![
        Child::from(ImageTree::leaf("red", "", Pixel::new(255, 0, 0).into())),
        Child::from(ImageTree::empty("hole", "")),
        Child::from(ImageTree::empty("gap", "")),
        Child::from(detail),
    ];
    let value = ImageValue::from_image_link(&picture.display().to_string());
    assert!(value.image_link().is_some());
    let tree = ImageTree::new("photo", "", value, children).unwrap();
    assert_consistent(&tree, &MemoryPersistence::default(), 64);
}

#[test]
fn operators_rotate_the_render() {
    let tree = seeded_tree(2, "spin", "", 3);
    let resolver = MemoryPersistence::default();
    let original = tree.get_image(&resolver, 8).unwrap();

    let rotated = graphmap::operator::operate_tree(
        &std::sync::Arc::new(tree),
        graphmap::operator::Operation::Rotate180,
    );
    let image = rotated.get_image(&resolver, 8).unwrap();
    let top_left = image_at_quad_key(&image, 4, &QuadKey::new("0").unwrap());
    let bottom_right = image_at_quad_key(&original, 4, &QuadKey::new("3").unwrap());
    assert!(images_equal(&top_left, &bottom_right));
}
