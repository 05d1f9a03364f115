//! XYZ parser (count line, comment line, `element x y z` lines).
//!
//! XYZ carries no residue/chain/bond information; every atom lands in a
//! single `UNL` residue on chain `A`, and connectivity comes entirely from
//! bond inference. Multiple concatenated frames become multiple models.

use glam::Vec3;

use super::record::{AtomRecord, RawRecord, RecordStream};
use crate::chem::Element;
use crate::error::Error;
use crate::events::{Warning, WarningKind};

/// True when the content looks like an XYZ file: an integer count line
/// followed (after the comment) by element-coordinate lines.
#[must_use]
pub fn sniff(content: &str) -> bool {
    let mut lines = content.lines();
    let Some(first) = lines.next() else {
        return false;
    };
    let Ok(count) = first.trim().parse::<usize>() else {
        return false;
    };
    count > 0 && lines.nth(1).is_some_and(|l| parse_atom_line(l).is_some())
}

/// Parse XYZ content into a raw record stream.
pub fn parse(content: &str) -> Result<RecordStream, Error> {
    let mut stream = RecordStream::default();
    let mut lines = content.lines().enumerate().peekable();
    let mut frame = 0usize;

    while let Some(&(line_no, first)) = lines.peek() {
        if first.trim().is_empty() {
            let _ = lines.next();
            continue;
        }
        let declared = first.trim().parse::<usize>().map_err(|_| {
            Error::Parse(format!(
                "line {}: expected atom count, found {first:?}",
                line_no + 1
            ))
        })?;
        let _ = lines.next();
        let _comment = lines.next();

        if frame > 0 || stream.records.is_empty() {
            stream.records.push(RawRecord::ModelStart);
        }

        for i in 0..declared {
            let Some((atom_line_no, line)) = lines.next() else {
                return Err(Error::Parse(format!(
                    "frame {}: expected {declared} atoms, stream ended after {i}",
                    frame + 1
                )));
            };
            let Some((element, position)) = parse_atom_line(line) else {
                return Err(Error::Parse(format!(
                    "line {}: unreadable XYZ atom line {line:?}",
                    atom_line_no + 1
                )));
            };
            if element == Element::Unknown {
                stream.warnings.push(Warning::new(
                    WarningKind::Parse,
                    format!(
                        "line {}: unknown element symbol, kept as Unknown",
                        atom_line_no + 1
                    ),
                ));
            }
            stream.records.push(RawRecord::Atom(AtomRecord {
                serial: i as i64 + 1,
                name: element.symbol().to_owned(),
                alt_loc: None,
                res_name: "UNL".to_owned(),
                chain_id: "A".to_owned(),
                res_seq: 1,
                insertion: None,
                position,
                occupancy: 1.0,
                b_factor: 0.0,
                element,
                het: true,
            }));
        }

        stream.records.push(RawRecord::ModelEnd);
        frame += 1;
    }

    Ok(stream)
}

fn parse_atom_line(line: &str) -> Option<(Element, Vec3)> {
    let mut parts = line.split_whitespace();
    let symbol = parts.next()?;
    if symbol.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let x = parts.next()?.parse::<f32>().ok()?;
    let y = parts.next()?.parse::<f32>().ok()?;
    let z = parts.next()?.parse::<f32>().ok()?;
    Some((Element::from_symbol(symbol), Vec3::new(x, y, z)))
}
