//! Error types for the session core
//!
//! Operations against destroyed clients or surfaces are not errors; they
//! are logged and ignored at the call site. The variants here cover the
//! cases a caller has to be able to tell apart.

use thiserror::Error;

use crate::surface::SurfaceId;

/// Errors raised by the compositor session core and its collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(&'static str),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("render backend error: {0}")]
    Backend(String),

    #[error("session runtime has stopped")]
    SessionStopped,
}

impl SessionError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Rejections of drag-and-drop requests
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DragError {
    #[error("a drag is already in progress on this device")]
    AlreadyDragging,

    #[error("drag origin surface {0} no longer exists")]
    OriginGone(SurfaceId),

    #[error("no drag in progress")]
    NotDragging,

    #[error("unknown input device: {0}")]
    UnknownDevice(String),
}

/// Result type for session core operations
pub type Result<T> = std::result::Result<T, SessionError>;
