/// Convenience result type used across splatfilm.
pub type FilmResult<T> = Result<T, FilmError>;

/// Top-level error taxonomy used by block APIs.
///
/// Invalid sample values are not errors: they are reported through a
/// [`DiagnosticSink`](crate::DiagnosticSink) and accumulation proceeds.
#[derive(thiserror::Error, Debug)]
pub enum FilmError {
    /// Invalid block construction or merge input (tensor rank, border, channel counts).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed sample batch (value counts, mismatched lengths).
    #[error("batch error: {0}")]
    Batch(String),

    /// A loop trace that does not apply to the block it is replayed against.
    #[error("trace error: {0}")]
    Trace(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FilmError {
    /// Build a [`FilmError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`FilmError::Batch`] value.
    pub fn batch(msg: impl Into<String>) -> Self {
        Self::Batch(msg.into())
    }

    /// Build a [`FilmError::Trace`] value.
    pub fn trace(msg: impl Into<String>) -> Self {
        Self::Trace(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
