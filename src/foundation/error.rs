/// Convenience result type used across mediashift.
pub type ShiftResult<T> = Result<T, ShiftError>;

/// Top-level error taxonomy used by pipeline APIs.
#[derive(thiserror::Error, Debug)]
pub enum ShiftError {
    /// Unreadable or corrupt source media. Fatal, never retried.
    #[error("decode error: {0}")]
    Decode(String),

    /// Numeric failure while transforming a frame or audio buffer.
    #[error(
        "transform error{}: {message}",
        frame.map(|f| format!(" (frame {f})")).unwrap_or_default()
    )]
    Transform {
        /// Frame index that failed, when the failure is frame-local.
        frame: Option<u64>,
        /// Human-readable reason.
        message: String,
    },

    /// External encoder failure or non-zero exit.
    #[error("encode error: {0}")]
    Encode(String),

    /// Resume data exists but cannot be used.
    #[error("checkpoint corrupt: {0}")]
    CheckpointCorrupt(String),

    /// Fingerprint computation failed on source or output.
    #[error("analysis error: {0}")]
    Analysis(String),

    /// Invalid user-provided configuration or data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Serializable tag for [`ShiftError`] used in reports and outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`ShiftError::Decode`].
    Decode,
    /// See [`ShiftError::Transform`].
    Transform,
    /// See [`ShiftError::Encode`].
    Encode,
    /// See [`ShiftError::CheckpointCorrupt`].
    CheckpointCorrupt,
    /// See [`ShiftError::Analysis`].
    Analysis,
    /// See [`ShiftError::Validation`].
    Validation,
    /// See [`ShiftError::Other`].
    Other,
}

impl ShiftError {
    /// Build a [`ShiftError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a frame-agnostic [`ShiftError::Transform`] value.
    pub fn transform(msg: impl Into<String>) -> Self {
        Self::Transform {
            frame: None,
            message: msg.into(),
        }
    }

    /// Build a [`ShiftError::Transform`] value tagged with the failing frame.
    pub fn transform_at(frame: u64, msg: impl Into<String>) -> Self {
        Self::Transform {
            frame: Some(frame),
            message: msg.into(),
        }
    }

    /// Build a [`ShiftError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ShiftError::CheckpointCorrupt`] value.
    pub fn checkpoint_corrupt(msg: impl Into<String>) -> Self {
        Self::CheckpointCorrupt(msg.into())
    }

    /// Build a [`ShiftError::Analysis`] value.
    pub fn analysis(msg: impl Into<String>) -> Self {
        Self::Analysis(msg.into())
    }

    /// Build a [`ShiftError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Re-tag a frame-agnostic transform error with a frame index.
    pub fn at_frame(self, frame: u64) -> Self {
        match self {
            Self::Transform {
                frame: None,
                message,
            } => Self::Transform {
                frame: Some(frame),
                message,
            },
            other => other,
        }
    }

    /// Taxonomy tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::Transform { .. } => ErrorKind::Transform,
            Self::Encode(_) => ErrorKind::Encode,
            Self::CheckpointCorrupt(_) => ErrorKind::CheckpointCorrupt,
            Self::Analysis(_) => ErrorKind::Analysis,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
