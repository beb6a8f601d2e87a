//! Ergonomic error context helpers.
//!
//! Provides an extension trait for adding context to `Result` types,
//! converting IO errors at the engine boundary into context-rich
//! [`PipeError`] variants.

use crate::base::error::PipeError;
use std::io;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add transport context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use pipenet::base::context::IoResultExt;
    ///
    /// let n = socket.read(&mut buf).await
    ///     .transport_context("example.com:443")?;
    /// // Error: "transport error: example.com:443: connection reset"
    /// ```
    fn transport_context(self, endpoint: &str) -> Result<T, PipeError>;

    /// Add engine context to an IO error.
    fn engine_context(self, engine: &str) -> Result<T, PipeError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn transport_context(self, endpoint: &str) -> Result<T, PipeError> {
        self.map_err(|e| PipeError::Transport(format!("{endpoint}: {e}")))
    }

    fn engine_context(self, engine: &str) -> Result<T, PipeError> {
        self.map_err(|e| PipeError::Transport(format!("engine {engine}: {e}")))
    }
}
