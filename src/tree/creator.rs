//! Building new trees out of old ones.
//!
//! Both insertion helpers copy the path from the old root down to the
//! quadkey into a new file under new names (`new_name`, `new_name + digit`,
//! ...), leaving every other subtree shared with the old tree.

use crate::address::NodeAddress;
use crate::error::TreeError;
use crate::quadkey::QuadKey;
use crate::store::format::is_gzip;
use crate::store::{qualify_link, Resolver};
use crate::tree::{Child, ImageTree};
use crate::types::VERSION_STRING;
use crate::value::{is_image_file, ImageValue, WebImage};
use tracing::info;

/// New tree equal to `old_tree` except that the node at `quad_key` is the
/// node addressed by `link`.
pub fn insert_node_link(
    resolver: &dyn Resolver,
    old_tree: &ImageTree,
    link: &str,
    quad_key: &QuadKey,
    filename: &str,
    new_name: &str,
) -> Result<ImageTree, TreeError> {
    let Some(index) = quad_key.head() else {
        return Err(TreeError::InvalidQuadKey(
            "Quadkey for inserting a node link cannot be blank".to_string(),
        ));
    };

    if old_tree.is_leaf() {
        let new_tree = ImageTree::leaf(new_name, filename, old_tree.value().clone());
        let another = resolver.resolve_node(link)?;
        return new_tree.insert(resolver, another, quad_key);
    }

    let replacement = if quad_key.len() == 1 {
        Child::Link(link.to_string())
    } else {
        let old_child = old_tree.child(resolver, index)?;
        Child::from(insert_node_link(
            resolver,
            &old_child,
            link,
            &quad_key.tail(),
            filename,
            &format!("{}{}", new_name, index),
        )?)
    };
    copy_with_child(old_tree, filename, new_name, index, replacement)
}

/// New tree equal to `old_tree` except that the node at `quad_key` shows
/// the image at `image_url`.
pub fn insert_image(
    resolver: &dyn Resolver,
    old_tree: &ImageTree,
    image_url: &str,
    quad_key: &QuadKey,
    filename: &str,
    new_name: &str,
) -> Result<ImageTree, TreeError> {
    let Some(index) = quad_key.head() else {
        return Ok(ImageTree::leaf(
            new_name,
            filename,
            ImageValue::WebImage(WebImage::new(image_url)),
        ));
    };

    if old_tree.is_leaf() {
        let new_tree = ImageTree::leaf(new_name, filename, old_tree.value().clone());
        return new_tree.insert_image_at_quad_key(resolver, image_url, quad_key);
    }

    let old_child = old_tree.child(resolver, index)?;
    let new_child = insert_image(
        resolver,
        &old_child,
        image_url,
        &quad_key.tail(),
        filename,
        &format!("{}{}", new_name, index),
    )?;
    copy_with_child(old_tree, filename, new_name, index, Child::from(new_child))
}

fn copy_with_child(
    old_tree: &ImageTree,
    filename: &str,
    new_name: &str,
    index: usize,
    replacement: Child,
) -> Result<ImageTree, TreeError> {
    let mut children = old_tree.child_slots().to_vec();
    let slot = children.get_mut(index).ok_or_else(|| {
        TreeError::NodeNotFound(format!(
            "The child index {} is out of range in {}",
            index,
            old_tree.address()
        ))
    })?;
    *slot = replacement;
    ImageTree::new(new_name, filename, old_tree.value().clone(), children)
}

/// Insert either an image (for image file links) or a node link into the
/// tree at `old_root_link`, producing a new root at `name@filename`.
pub fn create_tree_from_old(
    resolver: &dyn Resolver,
    old_root_link: &str,
    link_to_insert: &str,
    quad_key: &QuadKey,
    filename: &str,
    name: &str,
) -> Result<ImageTree, TreeError> {
    info!(
        link = %link_to_insert,
        new_root = %format!("{}@{}", name, filename),
        old_root = %old_root_link,
        "Inserting into tree"
    );
    let old_tree = resolver.resolve_node(old_root_link)?;
    if is_image_file(link_to_insert) {
        insert_image(resolver, &old_tree, link_to_insert, quad_key, filename, name)
    } else {
        insert_node_link(resolver, &old_tree, link_to_insert, quad_key, filename, name)
    }
}

/// Node at `address` with the given child links and optional image link.
pub fn create_tree(
    address: &NodeAddress,
    children_links: &[String],
    image_link: Option<&str>,
) -> Result<ImageTree, TreeError> {
    let value = image_link
        .map(ImageValue::from_image_link)
        .unwrap_or_default();
    let children = children_links
        .iter()
        .map(|link| Child::Link(qualify_link(link, address.filename_or_empty())))
        .collect();
    ImageTree::new(
        address.node_name.clone(),
        address.filename_or_empty(),
        value,
        children,
    )
}

/// Filename of the next version: bumps the last `ver_N` component, or
/// inserts `ver_1` before the extension (before both extensions for gzip
/// files).
pub fn next_version_name(filename: &str) -> String {
    let mut components: Vec<String> = filename.split('.').map(str::to_string).collect();

    let versioned = components
        .iter()
        .rposition(|component| component.contains(VERSION_STRING));
    if let Some(position) = versioned {
        let current = components[position]
            .rsplit(VERSION_STRING)
            .next()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        components[position] = format!("{}{}", VERSION_STRING, current + 1);
        return components.join(".");
    }

    let from_end = if is_gzip(filename) { 2 } else { 1 };
    let insertion_point = components.len().saturating_sub(from_end);
    components.insert(insertion_point, format!("{}1", VERSION_STRING));
    components.join(".")
}
