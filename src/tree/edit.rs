//! Copy-on-write edits: insertion, re-homing and compression.

use crate::address::resolve_link;
use crate::error::TreeError;
use crate::quadkey::QuadKey;
use crate::store::{qualify_link, Resolver};
use crate::tree::{Child, ImageTree};
use crate::value::{average_pixels, ImageValue, Pixel, WebImage};
use std::collections::HashSet;
use std::sync::Arc;

impl ImageTree {
    /// Same node with four empty children named `name + digit`.
    pub fn grow_empty(&self) -> ImageTree {
        let children = (0..4)
            .map(|i| Child::from(ImageTree::empty(format!("{}{}", self.name, i), self.filename.clone())))
            .collect();
        ImageTree {
            children,
            ..self.clone()
        }
    }

    /// Same node with slot `index` replaced. Leaves are grown first.
    pub fn replace_child(&self, index: usize, child: Child) -> Result<ImageTree, TreeError> {
        let mut tree = if self.is_leaf() {
            self.grow_empty()
        } else {
            self.clone()
        };
        let slot = tree.children.get_mut(index).ok_or_else(|| {
            TreeError::NodeNotFound(format!(
                "The child index {} is out of range in {}",
                index,
                self.address()
            ))
        })?;
        *slot = child;
        Ok(tree)
    }

    /// New tree with `subtree` at `quad_key`, growing empty placeholders
    /// through leaves on the way down.
    pub fn insert(
        &self,
        resolver: &dyn Resolver,
        subtree: Arc<ImageTree>,
        quad_key: &QuadKey,
    ) -> Result<ImageTree, TreeError> {
        let Some(index) = quad_key.head() else {
            return Err(TreeError::CreationFailed(
                "Quadkey cannot be blank for insertion".to_string(),
            ));
        };
        let base = if self.is_leaf() {
            self.grow_empty()
        } else {
            self.clone()
        };
        let replacement = if quad_key.len() == 1 {
            subtree
        } else {
            let below = base.child(resolver, index)?;
            Arc::new(below.insert(resolver, subtree, &quad_key.tail())?)
        };
        base.replace_child(index, Child::Node(replacement))
    }

    /// Insert a web image leaf named `name + quad_key` at `quad_key`.
    pub fn insert_image_at_quad_key(
        &self,
        resolver: &dyn Resolver,
        image_url: &str,
        quad_key: &QuadKey,
    ) -> Result<ImageTree, TreeError> {
        let leaf = ImageTree::leaf(
            format!("{}{}", self.name, quad_key),
            self.filename.clone(),
            ImageValue::WebImage(WebImage::new(image_url)),
        );
        self.insert(resolver, Arc::new(leaf), quad_key)
    }

    /// Deepest node along `quad_key` carrying a set value, with the
    /// quadkey remaining below it. `None` when no node on the path is set.
    pub fn lowest_set_node(
        &self,
        resolver: &dyn Resolver,
        quad_key: &QuadKey,
    ) -> Result<Option<(ImageTree, QuadKey)>, TreeError> {
        let mut best = self.is_set().then(|| (self.clone(), quad_key.clone()));
        let mut current: Option<Arc<ImageTree>> = None;
        for (depth, index) in quad_key.indices().enumerate() {
            let node = match &current {
                Some(node) if node.is_leaf() => break,
                Some(node) => node.child(resolver, index)?,
                None if self.is_leaf() => break,
                None => self.child(resolver, index)?,
            };
            if node.is_set() {
                best = Some((node.as_ref().clone(), quad_key.suffix(depth + 1)));
            }
            current = Some(node);
        }
        Ok(best)
    }

    /// Copy re-homed into `filename`: every in-memory node and link that
    /// shared this node's file moves along.
    pub fn with_filename(&self, filename: &str) -> ImageTree {
        let old = self.filename.clone();
        self.rehome(&old, filename)
    }

    fn rehome(&self, old: &str, new: &str) -> ImageTree {
        if self.filename != old {
            return self.clone();
        }
        let children = self
            .children
            .iter()
            .map(|slot| match slot {
                Child::Node(node) => Child::Node(Arc::new(node.rehome(old, new))),
                Child::Link(link) => match resolve_link(link) {
                    Ok((name, Some(file))) if file == old => Child::Link(qualify_link(&name, new)),
                    _ => slot.clone(),
                },
            })
            .collect();
        ImageTree {
            name: self.name.clone(),
            filename: new.to_string(),
            value: self.value.clone(),
            children,
        }
    }

    /// Lossy compression. Post-order, a node collapses into a pixel leaf
    /// when its four children are pixel leaves approximately equal to its
    /// own pixel, or to their average when its value is unset.
    pub fn compress(&self, resolver: &dyn Resolver) -> Result<ImageTree, TreeError> {
        let mut visited = HashSet::new();
        self.compress_inner(resolver, &mut visited)
    }

    fn compress_inner(
        &self,
        resolver: &dyn Resolver,
        visited: &mut HashSet<String>,
    ) -> Result<ImageTree, TreeError> {
        visited.insert(self.address());
        if self.is_leaf() {
            return Ok(self.clone());
        }

        let mut children = Vec::with_capacity(self.children.len());
        for slot in &self.children {
            if let Child::Link(link) = slot {
                if visited.contains(link) {
                    children.push(slot.clone());
                    continue;
                }
            }
            let child = slot.resolve(resolver)?;
            // a link resolving to a different address (the not-found
            // placeholder) stays a link
            if let Child::Link(link) = slot {
                if child.address() != *link {
                    children.push(slot.clone());
                    continue;
                }
            }
            children.push(Child::from(child.compress_inner(resolver, visited)?));
        }

        let compressed = ImageTree {
            children,
            ..self.clone()
        };
        Ok(compressed.collapse_similar_children())
    }

    fn collapse_similar_children(self) -> ImageTree {
        match self.collapsed_pixel() {
            Some(target) => ImageTree::leaf(self.name, self.filename, ImageValue::Pixel(target)),
            None => self,
        }
    }

    fn collapsed_pixel(&self) -> Option<Pixel> {
        let own = match &self.value {
            ImageValue::Pixel(p) => Some(*p),
            ImageValue::Unset => None,
            _ => return None,
        };
        let pixels = self
            .children
            .iter()
            .map(|slot| match slot {
                Child::Node(node) if node.is_leaf() => node.value.pixel().copied(),
                _ => None,
            })
            .collect::<Option<Vec<Pixel>>>()?;
        let target = own.unwrap_or_else(|| average_pixels(&pixels));
        pixels
            .iter()
            .all(|p| p.approximately_equal(&target))
            .then_some(target)
    }
}
