/// Error types.
///
/// Store failures are fatal at startup. An empty catalog is an expected
/// state that callers guard against; it never aborts a session.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("image database unavailable at {}: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("image database query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no images loaded")]
    Empty,
}
