//! Raw record stream: the parser output consumed by the structure builder.
//!
//! Parsing is a pure fold over the byte buffer producing an immutable
//! record sequence; no typed structure assembly happens here.

use glam::Vec3;

use crate::chem::Element;
use crate::events::Warning;
use crate::model::SsKind;

/// One atom line from the source file.
#[derive(Debug, Clone)]
pub struct AtomRecord {
    /// File serial number.
    pub serial: i64,
    /// Atom name, trimmed.
    pub name: String,
    /// Alternate-location indicator.
    pub alt_loc: Option<char>,
    /// Residue short code, trimmed.
    pub res_name: String,
    /// Chain identifier.
    pub chain_id: String,
    /// Residue sequence number.
    pub res_seq: i64,
    /// Insertion code.
    pub insertion: Option<char>,
    /// Position in angstroms.
    pub position: Vec3,
    /// Occupancy (defaults to 1.0).
    pub occupancy: f32,
    /// Temperature factor (defaults to 0.0).
    pub b_factor: f32,
    /// Element, resolved from the element column or the atom name.
    pub element: Element,
    /// True for HETATM records.
    pub het: bool,
}

/// A secondary-structure hint carried by the format (HELIX/SHEET/TURN).
#[derive(Debug, Clone)]
pub struct SsHint {
    /// Helix, sheet, or turn.
    pub kind: SsKind,
    /// Chain the hint applies to.
    pub chain_id: String,
    /// First residue sequence number (inclusive).
    pub start_seq: i64,
    /// Last residue sequence number (inclusive).
    pub end_seq: i64,
}

/// A raw record produced by a format parser.
#[derive(Debug, Clone)]
pub enum RawRecord {
    /// ATOM or HETATM.
    Atom(AtomRecord),
    /// Explicit bond declaration: one source serial, bonded serials.
    Bond {
        /// Serial of the declaring atom.
        from: i64,
        /// Serials of its bonded partners.
        to: Vec<i64>,
    },
    /// Secondary-structure hint.
    Ss(SsHint),
    /// Start of a structural model (NMR ensemble member).
    ModelStart,
    /// End of a structural model.
    ModelEnd,
    /// Chain terminator (TER).
    ChainBreak,
}

/// Ordered record sequence plus the recoverable anomalies met while
/// producing it.
#[derive(Debug, Default)]
pub struct RecordStream {
    /// Records in file order.
    pub records: Vec<RawRecord>,
    /// Non-fatal parse warnings.
    pub warnings: Vec<Warning>,
}

impl RecordStream {
    /// Count of atom records across all models.
    #[must_use]
    pub fn atom_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r, RawRecord::Atom(_)))
            .count()
    }
}
