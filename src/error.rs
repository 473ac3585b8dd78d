use std::path::PathBuf;

/// Errors raised while loading, scanning or watching a catalog source.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Duplicate item id {0} in catalog")]
    DuplicateId(u64),

    #[error("Item {0} has an empty image source")]
    EmptySource(u64),

    #[error("Unknown tag category: {0}")]
    UnknownTagCategory(String),

    #[error("Catalog watcher failed: {0}")]
    Watch(#[from] notify::Error),
}

/// Errors raised while loading an engine configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Errors raised by an image fetch running on the prefetch pool.
#[derive(Debug, thiserror::Error)]
pub enum PrefetchError {
    #[error("Failed to fetch {source_uri}: {reason}")]
    Fetch { source_uri: String, reason: String },

    #[error("I/O error fetching {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
