//! Tree Operators
//!
//! Geometric operators (rotations, mirror) act on a node by permuting its
//! four child slots. They are applied lazily: a node name prefixed with
//! `tag#` segments (`rot90#rot180#base`) denotes `base` with those
//! operators applied, and the serializer resolves such names on load.

use crate::error::TreeError;
use crate::tree::ImageTree;
use crate::types::{CHILDREN_PER_NODE, OPERATOR_SEPARATOR};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Permutation of the four child slots: output slot `k` takes input slot
/// `self.0[k]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transform([usize; CHILDREN_PER_NODE]);

impl Transform {
    pub const IDENTITY: Transform = Transform([0, 1, 2, 3]);
    pub const ROTATE_90: Transform = Transform([2, 0, 3, 1]);
    pub const ROTATE_180: Transform = Transform([3, 2, 1, 0]);
    pub const MIRROR_VERTICAL: Transform = Transform([1, 0, 3, 2]);

    /// Input slot feeding each output slot.
    pub fn table(&self) -> [usize; CHILDREN_PER_NODE] {
        self.0
    }

    pub fn is_identity(&self) -> bool {
        *self == Transform::IDENTITY
    }

    /// `self` followed by `then`.
    pub fn then(self, then: Transform) -> Transform {
        let mut table = [0; CHILDREN_PER_NODE];
        for (slot, &index) in table.iter_mut().zip(then.0.iter()) {
            *slot = self.0[index];
        }
        Transform(table)
    }

    /// Net transform of an operator list; the last listed operator is
    /// applied first.
    pub fn compose(operations: &[Operation]) -> Transform {
        operations
            .iter()
            .rev()
            .fold(Transform::IDENTITY, |net, op| net.then(op.transform()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Rotate90,
    Rotate180,
    MirrorVertical,
}

impl Operation {
    pub const ALL: [Operation; 3] = [
        Operation::Rotate90,
        Operation::Rotate180,
        Operation::MirrorVertical,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Operation::Rotate90 => "rot90",
            Operation::Rotate180 => "rot180",
            Operation::MirrorVertical => "mirrorv",
        }
    }

    pub fn transform(&self) -> Transform {
        match self {
            Operation::Rotate90 => Transform::ROTATE_90,
            Operation::Rotate180 => Transform::ROTATE_180,
            Operation::MirrorVertical => Transform::MIRROR_VERTICAL,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Operation {
    type Err = TreeError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.tag() == tag)
            .ok_or_else(|| TreeError::UnknownOperator(tag.to_string()))
    }
}

/// Prefix `name` with one operator tag.
pub fn format_name(name: &str, operation: Operation) -> String {
    format!("{}{}{}", operation.tag(), OPERATOR_SEPARATOR, name)
}

/// Prefix `name` with every tag of `operations`, in textual order.
pub fn format_operated_name(name: &str, operations: &[Operation]) -> String {
    operations
        .iter()
        .rev()
        .fold(name.to_string(), |acc, op| format_name(&acc, *op))
}

/// Split off the leading operator tag of `name`, if any.
pub fn extract_first_operator(name: &str) -> Result<(&str, Option<Operation>), TreeError> {
    match name.split_once(OPERATOR_SEPARATOR) {
        Some((tag, rest)) => Ok((rest, Some(tag.parse()?))),
        None => Ok((name, None)),
    }
}

/// Base name and operator list of an operator-prefixed name.
pub fn parse_operated_name(name: &str) -> Result<(String, Vec<Operation>), TreeError> {
    let mut operations = Vec::new();
    let mut rest = name;
    while let (remaining, Some(op)) = extract_first_operator(rest)? {
        operations.push(op);
        rest = remaining;
    }
    Ok((rest.to_string(), operations))
}

/// Apply `operations` to `tree`. Returns the same tree when the net
/// transform is the identity or the tree is a leaf.
pub fn apply_operators(tree: &Arc<ImageTree>, operations: &[Operation]) -> Arc<ImageTree> {
    let net = Transform::compose(operations);
    if net.is_identity() || tree.is_leaf() {
        return Arc::clone(tree);
    }
    Arc::new(tree.permuted(format_operated_name(tree.name(), operations), net.table()))
}

pub fn operate_tree(tree: &Arc<ImageTree>, operation: Operation) -> Arc<ImageTree> {
    apply_operators(tree, &[operation])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::test_support::*;
    use proptest::prelude::*;

    #[test]
    fn test_rotate_90_twice_is_180() {
        let twice = Transform::ROTATE_90.then(Transform::ROTATE_90);
        assert_eq!(twice, Transform::ROTATE_180);
        assert!(Transform::MIRROR_VERTICAL
            .then(Transform::MIRROR_VERTICAL)
            .is_identity());
    }

    #[test]
    fn test_compose_identity() {
        let ops = [Operation::Rotate90, Operation::Rotate90, Operation::Rotate180];
        assert!(Transform::compose(&ops).is_identity());
        assert!(Transform::compose(&[]).is_identity());
        // rotating then mirroring transposes the quadrants
        assert_eq!(
            Transform::ROTATE_90.then(Transform::MIRROR_VERTICAL).table(),
            [0, 2, 1, 3]
        );
    }

    #[test]
    fn test_apply_operators_identity_returns_same_tree() {
        let tree = Arc::new(sample_tree());
        let ops = [Operation::Rotate90, Operation::Rotate90, Operation::Rotate180];
        let operated = apply_operators(&tree, &ops);
        assert!(Arc::ptr_eq(&tree, &operated));
        assert!(operated.equals(&tree, &Detached).unwrap());
    }

    #[test]
    fn test_rotate_90() {
        let tree = Arc::new(sample_tree());
        let rotated = operate_tree(&tree, Operation::Rotate90);
        assert_eq!(rotated.name(), "rot90#father");
        assert_eq!(
            rotated.children_links(),
            vec!["son2@test.tsv", "son0@test.tsv", "son3@test.tsv", "son1@test.tsv"]
        );
        assert_eq!(rotated.value(), tree.value());
    }

    #[test]
    fn test_rotate_90_twice_matches_180() {
        let tree = Arc::new(sample_tree());
        let twice = apply_operators(&tree, &[Operation::Rotate90, Operation::Rotate90]);
        let once = operate_tree(&tree, Operation::Rotate180);
        assert_eq!(twice.children_links(), once.children_links());
        assert_eq!(twice.name(), "rot90#rot90#father");
    }

    #[test]
    fn test_leaf_is_unchanged() {
        let leaf = Arc::new(pixel_leaf("x", 1, 2, 3));
        assert!(Arc::ptr_eq(&leaf, &operate_tree(&leaf, Operation::MirrorVertical)));
    }

    #[test]
    fn test_extract_operator() {
        assert_eq!(
            extract_first_operator("rot90#benki@pinka.tsv").unwrap(),
            ("benki@pinka.tsv", Some(Operation::Rotate90))
        );
        assert_eq!(extract_first_operator("plain").unwrap(), ("plain", None));
        assert!(matches!(
            extract_first_operator("spin#x"),
            Err(TreeError::UnknownOperator(_))
        ));
    }

    #[test]
    fn test_parse_operated_name() {
        let (name, ops) = parse_operated_name("rot90#rot180#mirrorv#jiji").unwrap();
        assert_eq!(name, "jiji");
        assert_eq!(
            ops,
            vec![Operation::Rotate90, Operation::Rotate180, Operation::MirrorVertical]
        );
    }

    fn operation() -> impl Strategy<Value = Operation> {
        prop::sample::select(Operation::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn name_codec_round_trip(base in "[a-z][a-z0-9_]{0,12}", ops in prop::collection::vec(operation(), 0..6)) {
            let name = format_operated_name(&base, &ops);
            let (parsed, parsed_ops) = parse_operated_name(&name).unwrap();
            prop_assert_eq!(parsed, base);
            prop_assert_eq!(parsed_ops, ops);
        }

        #[test]
        fn compose_is_associative(a in prop::collection::vec(operation(), 0..4), b in prop::collection::vec(operation(), 0..4)) {
            let mut joined = a.clone();
            joined.extend(b.iter().copied());
            let split = Transform::compose(&b).then(Transform::compose(&a));
            prop_assert_eq!(Transform::compose(&joined), split);
        }
    }
}
