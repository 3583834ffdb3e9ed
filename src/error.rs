use std::path::PathBuf;

use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, VocabError>;

/// Enum representing all possible errors in the zhvocab_rs library.
#[derive(Error, Debug)]
pub enum VocabError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("ZIP archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML deserialization error: {0}")]
    XmlParse(#[from] quick_xml::DeError),

    #[error("XML read error: {0}")]
    XmlRead(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required data file not found: {0}")]
    DataFileNotFound(String),

    #[error("dictionary returned no result container")]
    NoResultContainer,

    #[error("translation service returned no result container")]
    NoTranslationResult,

    /// Raised by the dataset builder after a resolution fault. The partial
    /// store has already been written to `path`; the original fault is the
    /// chained source.
    #[error("failed to fetch data; progress has been saved to {path:?}")]
    CheckpointSaved {
        path: PathBuf,
        #[source]
        source: Box<VocabError>,
    },

    #[error("Internal error: {0}")]
    Internal(String), // For unexpected situations
}

impl VocabError {
    /// Whether this error belongs to the lookup class: a transport fault or
    /// an unparsable/absent lookup result.
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            VocabError::Network(_) | VocabError::NoResultContainer | VocabError::NoTranslationResult
        )
    }
}
