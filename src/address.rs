//! Node Addresses
//!
//! A node is identified across files by the textual address `name@file`, or
//! just `name` for anonymous in-memory nodes. Two addresses are equal when
//! both the name and the file match exactly.

use crate::error::TreeError;
use crate::types::SEPARATOR_CHARACTER;
use rand::distr::Alphanumeric;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Format the canonical textual identity of a node.
pub fn format_node_address(filename: &str, node_name: &str) -> String {
    if filename.is_empty() {
        node_name.to_string()
    } else {
        format!("{}{}{}", node_name, SEPARATOR_CHARACTER, filename)
    }
}

/// Split a link into node name and filename.
///
/// Returns `(name, None)` when no separator is present and fails when the
/// link carries more than one separator.
pub fn resolve_link(link: &str) -> Result<(String, Option<String>), TreeError> {
    let mut parts = link.split(SEPARATOR_CHARACTER);
    let name = parts.next().unwrap_or_default().to_string();
    let filename = parts.next().map(str::to_string);
    if parts.next().is_some() {
        return Err(TreeError::InvalidLink(link.to_string()));
    }
    Ok((name, filename))
}

/// Logical key of a node: name plus owning file (local path, URL, or none).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeAddress {
    pub node_name: String,
    pub filename: Option<String>,
}

impl NodeAddress {
    pub fn new(node_name: impl Into<String>, filename: Option<String>) -> Self {
        Self {
            node_name: node_name.into(),
            filename: filename.filter(|f| !f.is_empty()),
        }
    }

    /// Anonymous address with no owning file.
    pub fn anonymous(node_name: impl Into<String>) -> Self {
        Self::new(node_name, None)
    }

    pub fn in_file(node_name: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::new(node_name, Some(filename.into()))
    }

    /// Address named `root` in a freshly generated random file.
    pub fn random() -> Self {
        let filename: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(20)
            .map(char::from)
            .collect();
        Self::in_file("root", filename)
    }

    /// Owning file, empty for anonymous nodes.
    pub fn filename_or_empty(&self) -> &str {
        self.filename.as_deref().unwrap_or("")
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_node_address(
            self.filename_or_empty(),
            &self.node_name,
        ))
    }
}

impl FromStr for NodeAddress {
    type Err = TreeError;

    fn from_str(link: &str) -> Result<Self, Self::Err> {
        let (node_name, filename) = resolve_link(link)?;
        Ok(NodeAddress::new(node_name, filename))
    }
}
