//! pdbcurate-structure: everything the browser page needs to show a
//! structure.
//!
//! 1. Thumbnail URLs on the RCSB image CDN
//! 2. 3D viewer settings (script location, color schemes)
//! 3. PDB coordinate files, fetched from RCSB and cached on disk

pub mod error;
pub mod fetcher;
pub mod thumbnail;
pub mod viewer;

pub use error::{Result, StructureError};
pub use fetcher::{validate_pdb_id, StructureFetcher};
pub use thumbnail::{entry_page_url, ThumbnailSource};
pub use viewer::{ColorScheme, ViewerConfig, VIEWER_ERROR, VIEWER_SCRIPT_URL};
