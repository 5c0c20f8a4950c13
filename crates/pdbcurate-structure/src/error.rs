use thiserror::Error;

#[derive(Debug, Error)]
pub enum StructureError {
    #[error("Invalid PDB id `{0}`: expected 4 alphanumeric characters")]
    InvalidId(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RCSB returned {status} for {id}")]
    Upstream { id: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown color scheme: {0}")]
    UnknownScheme(String),
}

pub type Result<T> = std::result::Result<T, StructureError>;
