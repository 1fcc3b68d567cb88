//! Line-oriented text encoding.
//!
//! One node per line, tab separated:
//! `name R G B child0 child1 child2 child3 [image]`. Color and children
//! fields are empty when unset; the image column is only written when the
//! node references an image or another tree.

use crate::error::TreeError;
use crate::store::{relative_link, NodeRecord};
use crate::value::{ImageValue, Pixel};

pub fn encode_record(record: &NodeRecord, filename: &str) -> String {
    let mut line = String::with_capacity(64);
    line.push_str(&record.name);
    line.push('\t');
    line.push_str(&Pixel::serialize(record.value.pixel()));

    let children: Vec<String> = if record.children_links.is_empty() {
        vec![String::new(); 4]
    } else {
        record
            .children_links
            .iter()
            .map(|link| relative_link(link, filename))
            .collect()
    };
    line.push_str(&children.join("\t"));

    if let Some(link) = record.value.image_link() {
        line.push('\t');
        line.push_str(&relative_link(link, filename));
    }
    line.push('\n');
    line
}

pub fn encode(records: &[NodeRecord], filename: &str) -> String {
    records
        .iter()
        .map(|record| encode_record(record, filename))
        .collect()
}

pub fn decode_line(line: &str) -> Result<NodeRecord, TreeError> {
    let fields: Vec<&str> = line.split('\t').collect();
    let name = fields[0].trim().to_string();
    if name.is_empty() {
        return Err(TreeError::CreationFailed(format!(
            "Line without node name: {:?}",
            line
        )));
    }

    let pixel_fields = fields.get(1..4.min(fields.len())).unwrap_or_default();
    let pixel = Pixel::deserialize_fields(pixel_fields)?;

    let children_links: Vec<String> = fields
        .get(4..8.min(fields.len()))
        .unwrap_or_default()
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();
    if !children_links.is_empty() && children_links.len() != 4 {
        return Err(TreeError::CreationFailed(format!(
            "Node {} has {} children",
            name,
            children_links.len()
        )));
    }

    let image_link = fields.get(8).map(|f| f.trim()).filter(|f| !f.is_empty());
    let value = match (image_link, pixel) {
        (Some(link), _) => ImageValue::from_image_link(link),
        (None, Some(pixel)) => ImageValue::Pixel(pixel),
        (None, None) => ImageValue::Unset,
    };

    Ok(NodeRecord {
        name,
        value,
        children_links,
    })
}

pub fn decode(contents: &str) -> Result<Vec<NodeRecord>, TreeError> {
    contents
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(decode_line)
        .collect()
}
