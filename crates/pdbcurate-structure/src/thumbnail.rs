//! Structure thumbnail images.

use serde::{Deserialize, Serialize};

pub const RCSB_IMAGE_HOST: &str = "https://cdn.rcsb.org/images/structures";
pub const RCSB_ENTRY_BASE: &str = "https://www.rcsb.org/structure";

/// RCSB entry page for a structure.
pub fn entry_page_url(structure_id: &str) -> String {
    format!("{}/{}", RCSB_ENTRY_BASE, structure_id.trim().to_uppercase())
}

/// Where assembly thumbnails are served from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThumbnailSource {
    pub host: String,
}

impl Default for ThumbnailSource {
    fn default() -> Self {
        Self { host: RCSB_IMAGE_HOST.to_string() }
    }
}

impl ThumbnailSource {
    pub fn new(host: &str) -> Self {
        Self { host: host.trim_end_matches('/').to_string() }
    }

    /// Image URL for the first biological assembly of a structure, or `None`
    /// when the record carries no structure id.
    pub fn url(&self, structure_id: &str) -> Option<String> {
        let id = structure_id.trim();
        if id.is_empty() {
            return None;
        }
        Some(format!("{}/{}_assembly-1.jpeg", self.host, id.to_lowercase()))
    }
}
