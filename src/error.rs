//! # Errors
//!
//! Error types shared by the compiler, the store seam and the translator.

use crate::model::{LocalId, ScriptId};
use thiserror::Error;

/// Failure reported by a [`DialplanStore`](crate::store::DialplanStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage is unavailable: {0}")]
    Unavailable(String),

    #[error("Script not found: {0}")]
    ScriptNotFound(ScriptId),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Compilation failure.
///
/// The first three variants are structural: the graph cannot be walked.
/// The load variants wrap a [`StoreError`] raised while fetching input.
#[derive(Error, Debug)]
pub enum DialplanError {
    #[error("Could not find start block")]
    StartBlockNotFound,

    #[error("Could not find block with local id {0}")]
    BlockNotFound(LocalId),

    #[error("Could not find default case block for switch {0}")]
    DefaultCaseNotFound(LocalId),

    #[error("Could not load the script with id {id}")]
    ScriptLoad {
        id: ScriptId,
        #[source]
        source: StoreError,
    },

    #[error("Could not load the context list")]
    ContextLoad(#[source] StoreError),
}

impl DialplanError {
    /// True for errors caused by the shape of the graph rather than by I/O.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::StartBlockNotFound | Self::BlockNotFound(_) | Self::DefaultCaseNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DialplanError>;
