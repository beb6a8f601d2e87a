use thiserror::Error;

/// Crate-wide error type.
///
/// A single flat enum so that close causes can be stored in a channel,
/// cloned out to both ends, and compared in tests. Engines wrap their
/// native errors into [`PipeError::Transport`] before handing them to a
/// channel or pipeline (see [`crate::base::context::IoResultExt`]).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum PipeError {
    // Configuration errors (setup time, never during execution)
    #[error("phase `{0}` is not registered in this pipeline")]
    PhaseNotRegistered(String),
    #[error("engine `{0}` is already registered")]
    DuplicateEngine(String),

    // Channel errors
    #[error("channel closed for write")]
    ChannelClosedForWrite,
    #[error("channel cancelled")]
    ChannelCancelled,
    #[error("unexpected end of stream ({expected} more bytes expected)")]
    UnexpectedEndOfStream { expected: usize },

    // Suspension slot misuse
    #[error("suspension slot already occupied")]
    SlotOccupied,

    // Cancellation (a distinct outcome, not a failure)
    #[error("call cancelled")]
    CallCancelled,

    // Transport failures surfaced by an engine
    #[error("transport error: {0}")]
    Transport(String),

    // Failures raised by interceptors / plugins
    #[error("{0}")]
    Application(String),
}

impl PipeError {
    /// Wrap an engine's native error for use as a close cause.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        PipeError::Transport(err.to_string())
    }

    /// Wrap a plugin-level failure message.
    pub fn application(msg: impl Into<String>) -> Self {
        PipeError::Application(msg.into())
    }

    /// True for cancellation outcomes.
    ///
    /// Cancellation must not be logged as a failure or retried; callers
    /// check this before error reporting.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            PipeError::CallCancelled | PipeError::ChannelCancelled
        )
    }

    /// True for errors raised at configuration time rather than during a
    /// call.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PipeError::PhaseNotRegistered(_) | PipeError::DuplicateEngine(_)
        )
    }
}
