use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to fetch manifest entry {url}: {source}")]
    ManifestFetch {
        url: String,
        #[source]
        source: ApiError,
    },

    #[error("Manifest entry {url} returned status {status}")]
    ManifestStatus { url: String, status: u16 },

    #[error("Cache version {0} has not been installed")]
    NotInstalled(String),

    #[error("Invalid cache label: {0:?}")]
    InvalidLabel(String),

    #[error("Cache storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl CacheError {
    /// True for failures caused by the network rather than local storage
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            CacheError::ManifestFetch { .. } | CacheError::ManifestStatus { .. }
        )
    }
}
