//! PDB coordinate fetching with an on-disk cache.

use reqwest::Client;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, instrument};

use crate::error::{Result, StructureError};

pub const RCSB_DOWNLOAD_BASE: &str = "https://files.rcsb.org/download";

/// Check that `id` looks like a PDB id and return its upper-case form.
pub fn validate_pdb_id(id: &str) -> Result<String> {
    let id = id.trim();
    if id.len() == 4 && id.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(id.to_ascii_uppercase())
    } else {
        Err(StructureError::InvalidId(id.to_string()))
    }
}

/// Client for fetching PDB coordinate files from RCSB.
pub struct StructureFetcher {
    client: Client,
    cache_dir: PathBuf,
    download_base: String,
}

impl StructureFetcher {
    pub fn new<P: AsRef<Path>>(cache_dir: P, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            cache_dir: cache_dir.as_ref().to_path_buf(),
            download_base: RCSB_DOWNLOAD_BASE.to_string(),
        })
    }

    /// Point downloads at another host serving `{base}/{ID}.pdb`.
    pub fn with_download_base(mut self, base: &str) -> Self {
        self.download_base = base.trim_end_matches('/').to_string();
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, id: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.pdb", id.to_lowercase()))
    }

    /// Fetch a PDB file by its ID, returning the cached path.
    #[instrument(skip(self))]
    pub async fn fetch_pdb(&self, pdb_id: &str) -> Result<PathBuf> {
        let id = validate_pdb_id(pdb_id)?;
        let file_path = self.cache_path(&id);

        if fs::try_exists(&file_path).await? {
            debug!("PDB {} found in cache", id);
            return Ok(file_path);
        }

        info!("Fetching PDB {} from RCSB", id);
        let url = format!("{}/{}.pdb", self.download_base, id);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(StructureError::Upstream {
                id,
                status: response.status().as_u16(),
            });
        }
        let content = response.bytes().await?;

        // Each download gets its own temp file, renamed into place when complete.
        fs::create_dir_all(&self.cache_dir).await?;
        let cache_dir = self.cache_dir.clone();
        let target = file_path.clone();
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let mut partial = tempfile::NamedTempFile::new_in(&cache_dir)?;
            partial.write_all(&content)?;
            partial.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(io::Error::other)??;

        Ok(file_path)
    }

    /// Fetch a PDB file and return its text.
    pub async fn read_pdb(&self, pdb_id: &str) -> Result<String> {
        let path = self.fetch_pdb(pdb_id).await?;
        Ok(fs::read_to_string(path).await?)
    }
}
