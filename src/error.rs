//! Crate-level error types.

use std::fmt;

/// Errors produced by the molscene crate.
///
/// Non-fatal conditions (unknown residue codes, dropped malformed bonds,
/// degraded representations) are not errors; they surface as
/// [`crate::events::Warning`] values accumulated alongside successful
/// results.
#[derive(Debug)]
pub enum Error {
    /// Content is not recognizable as any supported structure format.
    /// Fatal to the load attempt; any previously built structure is
    /// untouched.
    Format(String),
    /// Content matched a format but is structurally broken beyond
    /// recoverable defaults (e.g. truncated mid-record).
    Parse(String),
    /// Malformed selection expression. Fatal to that evaluation call only.
    SelectionSyntax(String),
    /// Invalid representation configuration (malformed preset TOML or an
    /// out-of-range option value).
    Config(String),
    /// A long-running geometry build observed its cancellation token.
    /// Distinct from failure: partial buffers were released cleanly.
    Cancelled,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(msg) => write!(f, "unrecognized format: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::SelectionSyntax(msg) => {
                write!(f, "selection syntax error: {msg}")
            }
            Self::Config(msg) => {
                write!(f, "invalid representation config: {msg}")
            }
            Self::Cancelled => write!(f, "build cancelled"),
        }
    }
}

impl std::error::Error for Error {}
