//! File type detection by filename.

use crate::types::FOREST_FILE_EXTENSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Tab separated, one node per line
    Tsv,
    /// Binary forest records
    Forest,
    Unknown,
}

impl FileType {
    pub fn of(filename: &str) -> FileType {
        let name = filename.rsplit('/').next().unwrap_or(filename);
        if name.split('.').skip(1).any(|component| component == "tsv") {
            return FileType::Tsv;
        }
        let stripped = strip_gzip_suffix(name);
        if stripped.ends_with(FOREST_FILE_EXTENSION) {
            return FileType::Forest;
        }
        FileType::Unknown
    }
}

pub fn is_gzip(filename: &str) -> bool {
    filename.ends_with(".gz") || filename.ends_with(".gzip")
}

pub fn is_web_link(filename: &str) -> bool {
    filename.starts_with("http")
}

fn strip_gzip_suffix(filename: &str) -> &str {
    filename
        .strip_suffix(".gzip")
        .or_else(|| filename.strip_suffix(".gz"))
        .unwrap_or(filename)
}
