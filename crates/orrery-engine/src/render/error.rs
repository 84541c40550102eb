use std::fmt;

/// Errors surfaced by the renderer's name-based API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No render mode is registered under this name.
    UnknownMode { name: String },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::UnknownMode { name } => write!(f, "unknown render mode \"{name}\""),
        }
    }
}

impl std::error::Error for RenderError {}
