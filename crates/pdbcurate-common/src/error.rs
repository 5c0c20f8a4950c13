use thiserror::Error;

#[derive(Debug, Error)]
pub enum CurateError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Row is missing required column `{0}`")]
    MissingColumn(String),

    #[error("Unknown dataset preset: {0}")]
    UnknownPreset(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Status `{0}` is not part of the status vocabulary")]
    InvalidStatus(String),
}

pub type Result<T> = std::result::Result<T, CurateError>;
