//! Binary forest encoding (`.itpb`): a length-prefixed list of node records
//! encoded with bincode.

use crate::error::{StorageError, TreeError};
use crate::store::{relative_link, NodeRecord};
use crate::value::{ImageValue, Pixel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ForestPixel {
    r: u8,
    g: u8,
    b: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ForestNode {
    name: String,
    children: Vec<String>,
    pixel: Option<ForestPixel>,
    image_link: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ImageForest {
    forest: Vec<ForestNode>,
}

pub fn encode(records: &[NodeRecord], filename: &str) -> Result<Vec<u8>, StorageError> {
    let forest = ImageForest {
        forest: records
            .iter()
            .map(|record| ForestNode {
                name: record.name.clone(),
                children: record
                    .children_links
                    .iter()
                    .map(|link| relative_link(link, filename))
                    .collect(),
                pixel: record.value.pixel().map(|p| ForestPixel {
                    r: p.r,
                    g: p.g,
                    b: p.b,
                }),
                image_link: record
                    .value
                    .image_link()
                    .map(|link| relative_link(link, filename)),
            })
            .collect(),
    };
    bincode::serialize(&forest).map_err(|e| StorageError::Encode(format!("{}: {}", filename, e)))
}

pub fn decode(bytes: &[u8], filename: &str) -> Result<Vec<NodeRecord>, TreeError> {
    let forest: ImageForest = bincode::deserialize(bytes)
        .map_err(|e| StorageError::Decode(format!("{}: {}", filename, e)))?;

    forest
        .forest
        .into_iter()
        .map(|node| {
            if !node.children.is_empty() && node.children.len() != 4 {
                return Err(TreeError::CreationFailed(format!(
                    "Node {} has {} children",
                    node.name,
                    node.children.len()
                )));
            }
            let value = match (node.image_link, node.pixel) {
                (Some(link), _) => ImageValue::from_image_link(&link),
                (None, Some(p)) => ImageValue::Pixel(Pixel::new(p.r, p.g, p.b)),
                (None, None) => ImageValue::Unset,
            };
            Ok(NodeRecord {
                name: node.name,
                value,
                children_links: node.children,
            })
        })
        .collect()
}
