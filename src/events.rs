//! Non-fatal warning events.
//!
//! Every recoverable anomaly (a garbled optional field, a dropped malformed
//! bond, a degraded representation) produces a [`Warning`] that is
//! accumulated into the enclosing operation's result and mirrored to the
//! `log` crate. Warnings never abort the operation that raised them.

use std::fmt;

/// Severity of an emitted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational notice (e.g. a representation-build cancellation).
    Info,
    /// Recoverable anomaly worth surfacing to the user.
    Warning,
}

/// Category of a non-fatal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// An optional field was missing or garbled and defaulted.
    Parse,
    /// A residue short code had no registry entry; `UNK` substituted.
    UnknownResidue,
    /// A bond record referenced a non-existent atom and was dropped.
    DroppedBond,
    /// Bond inference skipped or adjusted a suspicious pair.
    BondInference,
    /// A residue lacked required backbone atoms; run broken to coil.
    IncompleteBackbone,
    /// A representation degraded to an empty buffer (e.g. cartoon over a
    /// selection with no backbone atoms).
    DegradedRepresentation,
    /// An identifier in a selection expression matched nothing.
    UnresolvedIdentifier,
    /// A representation build observed its cancellation token.
    BuildCancelled,
}

/// A non-fatal event with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Event category.
    pub kind: WarningKind,
    /// Severity level.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

impl Warning {
    /// Create a warning-severity event and mirror it to the log.
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        let message = message.into();
        log::warn!("{message}");
        Self {
            kind,
            severity: Severity::Warning,
            message,
        }
    }

    /// Create an info-severity notice and mirror it to the log.
    pub fn info(kind: WarningKind, message: impl Into<String>) -> Self {
        let message = message.into();
        log::info!("{message}");
        Self {
            kind,
            severity: Severity::Info,
            message,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
