//! Traversals. Every walk dedupes nodes by address so cyclic links
//! terminate.

use crate::error::TreeError;
use crate::store::{NodeRecord, Resolver};
use crate::tree::standard::is_not_found;
use crate::tree::ImageTree;
use std::collections::{BTreeMap, HashMap, HashSet};

/// File name to node name to record, for every reachable node.
pub type NodeDictionary = BTreeMap<String, BTreeMap<String, NodeRecord>>;

impl ImageTree {
    /// Depth-first pre-order walk over reachable nodes, each visited once.
    /// `action` returns true to skip the children of the current node.
    pub fn visit<F>(&self, resolver: &dyn Resolver, mut action: F) -> Result<(), TreeError>
    where
        F: FnMut(&ImageTree) -> bool,
    {
        let mut visited = HashSet::new();
        self.visit_inner(resolver, &mut action, &mut visited)
    }

    fn visit_inner(
        &self,
        resolver: &dyn Resolver,
        action: &mut dyn FnMut(&ImageTree) -> bool,
        visited: &mut HashSet<String>,
    ) -> Result<(), TreeError> {
        if !visited.insert(self.address()) {
            return Ok(());
        }
        if action(self) {
            return Ok(());
        }
        for child in self.children(resolver)? {
            child.visit_inner(resolver, action, visited)?;
        }
        Ok(())
    }

    /// Map every reachable node through `f`, in visiting order.
    pub fn select<T, F>(&self, resolver: &dyn Resolver, mut f: F) -> Result<Vec<T>, TreeError>
    where
        F: FnMut(&ImageTree) -> T,
    {
        let mut selected = Vec::new();
        self.visit(resolver, |node| {
            selected.push(f(node));
            false
        })?;
        Ok(selected)
    }

    /// Number of distinct reachable nodes.
    pub fn count_nodes(&self, resolver: &dyn Resolver) -> Result<usize, TreeError> {
        let mut count = 0;
        self.visit(resolver, |_| {
            count += 1;
            false
        })?;
        Ok(count)
    }

    /// Height of the tree, counting at most `max_height` levels. Each node
    /// is measured once per remaining depth, so cycles cost at most
    /// `nodes * max_height` visits.
    pub fn height(&self, resolver: &dyn Resolver, max_height: usize) -> Result<usize, TreeError> {
        let mut measured = HashMap::new();
        self.height_inner(resolver, max_height, &mut measured)
    }

    fn height_inner(
        &self,
        resolver: &dyn Resolver,
        max_height: usize,
        measured: &mut HashMap<(String, usize), usize>,
    ) -> Result<usize, TreeError> {
        if self.is_leaf() || max_height <= 1 {
            return Ok(max_height.min(1));
        }
        let key = (self.address(), max_height);
        if let Some(height) = measured.get(&key) {
            return Ok(*height);
        }
        let mut tallest = 0;
        for child in self.children(resolver)? {
            tallest = tallest.max(child.height_inner(resolver, max_height - 1, measured)?);
        }
        measured.insert(key, 1 + tallest);
        Ok(1 + tallest)
    }

    /// Partition every reachable node by owning file. Placeholders standing
    /// in for unresolvable links are left out.
    pub fn node_dictionary(&self, resolver: &dyn Resolver) -> Result<NodeDictionary, TreeError> {
        let mut dictionary = NodeDictionary::new();
        self.visit(resolver, |node| {
            if is_not_found(node) {
                return true;
            }
            dictionary
                .entry(node.filename().to_string())
                .or_default()
                .insert(node.name().to_string(), NodeRecord::from_tree(node));
            false
        })?;
        Ok(dictionary)
    }

    /// Records of the nodes owned by `filename`, not descending into other
    /// files.
    pub fn node_dictionary_for(
        &self,
        resolver: &dyn Resolver,
        filename: &str,
    ) -> Result<BTreeMap<String, NodeRecord>, TreeError> {
        let mut records = BTreeMap::new();
        self.visit(resolver, |node| {
            if node.filename() != filename || is_not_found(node) {
                return true;
            }
            records.insert(node.name().to_string(), NodeRecord::from_tree(node));
            false
        })?;
        Ok(records)
    }

    /// Recursive structural equality: same name, links and value at every
    /// node, children compared in order.
    pub fn equals(&self, other: &ImageTree, resolver: &dyn Resolver) -> Result<bool, TreeError> {
        let mut visited = HashSet::new();
        self.equals_inner(other, resolver, &mut visited)
    }

    fn equals_inner(
        &self,
        other: &ImageTree,
        resolver: &dyn Resolver,
        visited: &mut HashSet<(String, String)>,
    ) -> Result<bool, TreeError> {
        if self.name() != other.name()
            || self.value() != other.value()
            || self.children_links() != other.children_links()
        {
            return Ok(false);
        }
        if !visited.insert((self.address(), other.address())) {
            return Ok(true);
        }
        let mine = self.children(resolver)?;
        let theirs = other.children(resolver)?;
        for (a, b) in mine.iter().zip(theirs.iter()) {
            if !a.equals_inner(b, resolver, visited)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
