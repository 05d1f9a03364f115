//! Fixed-column PDB parser.
//!
//! Tolerant where the format allows it: garbled optional fields (occupancy,
//! temperature factor, element column) default with a warning. A line that
//! is truncated before the coordinate columns is unrecoverable and fails
//! the whole load with [`Error::Parse`].

use glam::Vec3;

use super::record::{AtomRecord, RawRecord, RecordStream, SsHint};
use crate::chem::Element;
use crate::error::Error;
use crate::events::{Warning, WarningKind};
use crate::model::SsKind;

/// Record names that identify a byte stream as PDB content.
const SIGNATURE_RECORDS: &[&str] = &[
    "ATOM", "HETATM", "HEADER", "MODEL", "REMARK", "CRYST1", "COMPND",
    "TITLE", "HELIX", "SHEET", "TURN", "CONECT", "SEQRES", "TER", "END",
];

/// True when the content looks like a PDB file.
#[must_use]
pub fn sniff(content: &str) -> bool {
    content
        .lines()
        .take(32)
        .filter(|l| !l.trim().is_empty())
        .any(|line| {
            let tag = line.get(..6).unwrap_or(line).trim_end();
            SIGNATURE_RECORDS.contains(&tag)
        })
}

/// Parse PDB content into a raw record stream.
pub fn parse(content: &str) -> Result<RecordStream, Error> {
    let mut stream = RecordStream::default();

    for (line_no, line) in content.lines().enumerate() {
        let tag = line.get(..6).unwrap_or(line).trim_end();
        match tag {
            "ATOM" | "HETATM" => {
                let record = parse_atom_line(
                    line,
                    line_no + 1,
                    tag == "HETATM",
                    &mut stream.warnings,
                )?;
                stream.records.push(RawRecord::Atom(record));
            }
            "CONECT" => {
                if let Some(record) = parse_conect_line(line) {
                    stream.records.push(record);
                }
            }
            "HELIX" => {
                parse_ss_line(line, SsKind::Helix, &mut stream);
            }
            "SHEET" => {
                parse_ss_line(line, SsKind::Sheet, &mut stream);
            }
            "TURN" => {
                parse_ss_line(line, SsKind::Turn, &mut stream);
            }
            "MODEL" => stream.records.push(RawRecord::ModelStart),
            "ENDMDL" => stream.records.push(RawRecord::ModelEnd),
            "TER" => stream.records.push(RawRecord::ChainBreak),
            _ => {} // headers, remarks, etc.
        }
    }

    Ok(stream)
}

/// Columns are 1-based in the PDB spec; `col` converts to 0-based slices.
fn col(line: &str, start: usize, end: usize) -> &str {
    let s = start - 1;
    line.get(s..end.min(line.len())).unwrap_or("")
}

fn parse_atom_line(
    line: &str,
    line_no: usize,
    het: bool,
    warnings: &mut Vec<Warning>,
) -> Result<AtomRecord, Error> {
    // Coordinates end at column 54; anything shorter is truncated.
    if line.len() < 54 {
        return Err(Error::Parse(format!(
            "line {line_no}: ATOM record truncated ({} cols)",
            line.len()
        )));
    }

    let parse_coord = |s: &str, axis: &str| -> Result<f32, Error> {
        s.trim().parse::<f32>().map_err(|_| {
            Error::Parse(format!(
                "line {line_no}: unreadable {axis} coordinate {s:?}"
            ))
        })
    };

    let x = parse_coord(col(line, 31, 38), "x")?;
    let y = parse_coord(col(line, 39, 46), "y")?;
    let z = parse_coord(col(line, 47, 54), "z")?;

    let serial = col(line, 7, 11).trim().parse::<i64>().unwrap_or_else(|_| {
        warnings.push(Warning::new(
            WarningKind::Parse,
            format!("line {line_no}: missing atom serial, defaulting to 0"),
        ));
        0
    });

    let name = col(line, 13, 16).trim().to_owned();
    let alt_loc = col(line, 17, 17).chars().next().filter(|c| *c != ' ');
    let res_name = col(line, 18, 20).trim().to_owned();
    let chain_id = {
        let id = col(line, 22, 22).trim();
        if id.is_empty() { "A" } else { id }.to_owned()
    };
    let res_seq = col(line, 23, 26).trim().parse::<i64>().unwrap_or_else(|_| {
        warnings.push(Warning::new(
            WarningKind::Parse,
            format!("line {line_no}: missing residue number, defaulting to 0"),
        ));
        0
    });
    let insertion = col(line, 27, 27).chars().next().filter(|c| *c != ' ');

    let occupancy = parse_optional_f32(
        col(line, 55, 60),
        1.0,
        line_no,
        "occupancy",
        warnings,
    );
    let b_factor = parse_optional_f32(
        col(line, 61, 66),
        0.0,
        line_no,
        "temperature factor",
        warnings,
    );

    // Element column is optional in practice; fall back to the atom-name
    // heuristic rather than warn on every legacy file.
    let element = {
        let sym = col(line, 77, 78).trim();
        if sym.is_empty() {
            Element::from_atom_name(&name)
        } else {
            match Element::from_symbol(sym) {
                Element::Unknown => Element::from_atom_name(&name),
                e => e,
            }
        }
    };

    Ok(AtomRecord {
        serial,
        name,
        alt_loc,
        res_name,
        chain_id,
        res_seq,
        insertion,
        position: Vec3::new(x, y, z),
        occupancy,
        b_factor,
        element,
        het,
    })
}

fn parse_optional_f32(
    field: &str,
    default: f32,
    line_no: usize,
    what: &str,
    warnings: &mut Vec<Warning>,
) -> f32 {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return default;
    }
    trimmed.parse::<f32>().unwrap_or_else(|_| {
        warnings.push(Warning::new(
            WarningKind::Parse,
            format!("line {line_no}: garbled {what} {trimmed:?}, using {default}"),
        ));
        default
    })
}

fn parse_conect_line(line: &str) -> Option<RawRecord> {
    let from = col(line, 7, 11).trim().parse::<i64>().ok()?;
    let to: Vec<i64> = [(12, 16), (17, 21), (22, 26), (27, 31)]
        .iter()
        .filter_map(|&(s, e)| col(line, s, e).trim().parse::<i64>().ok())
        .collect();
    if to.is_empty() {
        return None;
    }
    Some(RawRecord::Bond { from, to })
}

fn parse_ss_line(line: &str, kind: SsKind, stream: &mut RecordStream) {
    let (chain_cols, start_cols, end_cols) = match kind {
        // HELIX: initChainID col 20, initSeqNum 22-25, endSeqNum 34-37
        SsKind::Helix => ((20, 20), (22, 25), (34, 37)),
        // SHEET: initChainID col 22, initSeqNum 23-26, endSeqNum 34-37
        SsKind::Sheet => ((22, 22), (23, 26), (34, 37)),
        // TURN: initChainID col 20, initSeqNum 21-24, endSeqNum 32-35
        _ => ((20, 20), (21, 24), (32, 35)),
    };

    let chain_id = col(line, chain_cols.0, chain_cols.1).trim().to_owned();
    let start = col(line, start_cols.0, start_cols.1).trim().parse::<i64>();
    let end = col(line, end_cols.0, end_cols.1).trim().parse::<i64>();

    match (start, end) {
        (Ok(start_seq), Ok(end_seq)) if !chain_id.is_empty() => {
            stream.records.push(RawRecord::Ss(SsHint {
                kind,
                chain_id,
                start_seq,
                end_seq,
            }));
        }
        _ => {
            stream.warnings.push(Warning::new(
                WarningKind::Parse,
                format!("unreadable {kind:?} record dropped: {line:?}"),
            ));
        }
    }
}
