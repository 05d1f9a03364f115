//! Colorer resolution: entity attributes → linear RGB.

use crate::chem::ResidueFlags;
use crate::model::{SsKind, Structure};

use super::Colorer;

/// Cycled per chain index.
const CHAIN_PALETTE: [[f32; 3]; 8] = [
    [0.35, 0.55, 0.95],
    [0.95, 0.55, 0.25],
    [0.35, 0.80, 0.45],
    [0.85, 0.35, 0.55],
    [0.60, 0.45, 0.90],
    [0.95, 0.80, 0.30],
    [0.30, 0.75, 0.80],
    [0.70, 0.70, 0.70],
];

const HELIX_COLOR: [f32; 3] = [0.94, 0.28, 0.28];
const SHEET_COLOR: [f32; 3] = [0.98, 0.83, 0.25];
const TURN_COLOR: [f32; 3] = [0.27, 0.78, 0.78];
const COIL_COLOR: [f32; 3] = [0.78, 0.78, 0.78];

/// Resolve the color of one atom under a colorer.
pub(super) fn atom_color(
    structure: &Structure,
    atom: usize,
    colorer: Colorer,
) -> [f32; 3] {
    match colorer {
        Colorer::ByElement => structure.atoms[atom].element.cpk_color(),
        Colorer::Uniform(color) => color,
        _ => residue_color(structure, structure.atoms[atom].residue, colorer),
    }
}

/// Resolve the color of one residue under a colorer. For `ByElement` the
/// residue has no single element; carbon gray is used (cartoon spans
/// whole residues).
pub(super) fn residue_color(
    structure: &Structure,
    residue: usize,
    colorer: Colorer,
) -> [f32; 3] {
    match colorer {
        Colorer::ByElement => [0.5, 0.5, 0.5],
        Colorer::ByChain => {
            let chain = structure.residues[residue].chain;
            CHAIN_PALETTE[chain % CHAIN_PALETTE.len()]
        }
        Colorer::ByResidueType => {
            category_color(structure.residues[residue].kind.flags)
        }
        Colorer::BySecondaryStructure => {
            match structure.ss_kind_of(residue) {
                SsKind::Helix => HELIX_COLOR,
                SsKind::Sheet => SHEET_COLOR,
                SsKind::Turn => TURN_COLOR,
                SsKind::Coil => COIL_COLOR,
            }
        }
        Colorer::Uniform(color) => color,
    }
}

// One color per chemical category; checked most-specific first.
fn category_color(flags: ResidueFlags) -> [f32; 3] {
    if flags.intersects(ResidueFlags::WATER) {
        [0.35, 0.55, 0.95]
    } else if flags.intersects(ResidueFlags::AROMATIC) {
        [0.70, 0.40, 0.85]
    } else if flags.intersects(ResidueFlags::BASIC) {
        [0.25, 0.45, 0.95]
    } else if flags.intersects(ResidueFlags::ACIDIC) {
        [0.95, 0.30, 0.30]
    } else if flags.intersects(ResidueFlags::POLAR) {
        [0.30, 0.80, 0.55]
    } else if flags.intersects(ResidueFlags::NONPOLAR) {
        [0.90, 0.75, 0.40]
    } else if flags.intersects(ResidueFlags::NUCLEIC) {
        [0.45, 0.55, 0.85]
    } else {
        [0.60, 0.60, 0.60]
    }
}
