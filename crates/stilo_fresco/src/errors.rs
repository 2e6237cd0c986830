//! Render-time errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The resolved captures could not be serialised to JSON.
    #[error("failed to serialise captures: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A captured resource settled in the rejected state.
    #[error("captured resource rejected: {0}")]
    ResourceRejected(String),
}
