//! dwplay Script Host
//!
//! QuickJS-based host for short per-frame drawing programs.
//!
//! Features:
//! - QuickJS runtime via rquickjs
//! - Canvas bindings (`c`, `x = c.getContext("2d")`)
//! - Shorthand globals (`S`, `C`, `T`, `R`, `escape`, `unescape`)
//! - Console API forwarded to tracing

mod bindings;
mod console;
mod escape;
mod globals;
mod host;

pub use bindings::SharedCanvas;
pub use escape::{escape, escape_units, unescape, unescape_units};
pub use globals::{format_g, format_rgba};
pub use host::ScriptHost;

/// Script error
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("JavaScript engine error: {0}")]
    Engine(String),

    #[error("Syntax error: {message}")]
    Compile {
        message: String,
        stack: Option<String>,
    },

    #[error("Script does not define an entry function")]
    MissingEntry,

    #[error("Uncaught exception: {message}")]
    Exception {
        message: String,
        stack: Option<String>,
    },

    #[error(transparent)]
    Canvas(#[from] dwp_canvas::CanvasError),
}

impl ScriptError {
    /// JavaScript stack trace, when the engine recorded one
    pub fn stack(&self) -> Option<&str> {
        match self {
            Self::Compile { stack, .. } | Self::Exception { stack, .. } => stack.as_deref(),
            _ => None,
        }
    }
}
