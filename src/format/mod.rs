//! Structure-file format detection and parsing.
//!
//! Parsers are leaves: they convert an already-resident byte buffer into an
//! ordered [`RecordStream`] and know nothing about typed structures or
//! geometry. Format is sniffed from the content signature, with an optional
//! caller-provided hint (format name or file extension) taking precedence.

mod pdb;
mod record;
mod xyz;

pub use record::{AtomRecord, RawRecord, RecordStream, SsHint};

use crate::error::Error;

/// Supported structure-file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Fixed-column PDB.
    Pdb,
    /// XYZ coordinate frames.
    Xyz,
}

impl Format {
    /// Resolve a caller hint — a format name or file extension, case
    /// insensitive (`"pdb"`, `"ent"`, `"xyz"`).
    #[must_use]
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().trim_start_matches('.').to_ascii_lowercase().as_str()
        {
            "pdb" | "ent" => Some(Self::Pdb),
            "xyz" => Some(Self::Xyz),
            _ => None,
        }
    }
}

/// Detect the format of a byte buffer.
///
/// An explicit `hint` that names a supported format wins; otherwise the
/// content signature decides.
pub fn detect(bytes: &[u8], hint: Option<&str>) -> Result<Format, Error> {
    if let Some(format) = hint.and_then(Format::from_hint) {
        return Ok(format);
    }

    let content = String::from_utf8_lossy(bytes);
    if pdb::sniff(&content) {
        Ok(Format::Pdb)
    } else if xyz::sniff(&content) {
        Ok(Format::Xyz)
    } else {
        Err(Error::Format(
            "content matches no supported structure format".to_owned(),
        ))
    }
}

/// Parse a byte buffer into a raw record stream.
pub fn parse(
    bytes: &[u8],
    hint: Option<&str>,
) -> Result<(Format, RecordStream), Error> {
    let format = detect(bytes, hint)?;
    let content = String::from_utf8_lossy(bytes);
    let stream = match format {
        Format::Pdb => pdb::parse(&content)?,
        Format::Xyz => xyz::parse(&content)?,
    };
    Ok((format, stream))
}
