//! Distance-based bond inference over the spatial index.
//!
//! For every atom pair within `cov(a) + cov(b) + tolerance`, found via
//! grid queries (never a full O(n²) scan), add an inferred bond unless an
//! explicit bond for the pair exists, the atoms belong to incompatible
//! alternate-location groups, or the pair is closer than the
//! minimum-bond-length guard (coincident/duplicate atoms).

use rustc_hash::FxHashSet;

use super::MIN_BOND_LENGTH;
use crate::model::{Atom, Bond, BondOrder, BondSource, Structure};
use crate::spatial::SpatialGrid;

/// Largest covalent radius in the element table (K, 2.03 Å); bounds the
/// grid query radius.
const MAX_COVALENT_RADIUS: f32 = 2.03;

/// Infer bonds and append them to `structure.bonds`.
///
/// `seen` carries the canonical keys of already-collected explicit bonds
/// and is extended with every inferred pair, so the result is
/// duplicate-free regardless of insertion order.
pub(super) fn infer(
    structure: &mut Structure,
    grid: &SpatialGrid,
    tolerance: f32,
    seen: &mut FxHashSet<(usize, usize)>,
) {
    let mut inferred = Vec::new();

    for (i, atom) in structure.atoms.iter().enumerate() {
        let reach = atom.element.covalent_radius()
            + MAX_COVALENT_RADIUS
            + tolerance;
        for j in grid.query(atom.position, reach) {
            // Each unordered pair is considered once, from its lower index.
            if j <= i {
                continue;
            }
            let other = &structure.atoms[j];
            if !compatible_alt_loc(atom, other) {
                continue;
            }

            let dist = atom.position.distance(other.position);
            let cov_sum = atom.element.covalent_radius()
                + other.element.covalent_radius();
            if dist < MIN_BOND_LENGTH || dist > cov_sum + tolerance {
                continue;
            }
            if !seen.insert((i, j)) {
                continue; // explicit bond already present
            }

            // Distinctly short contacts indicate a higher bond order.
            let order = if dist < cov_sum * 0.9 {
                BondOrder::Double
            } else {
                BondOrder::Single
            };
            inferred.push(Bond {
                atoms: (i, j),
                order,
                source: BondSource::Inferred,
            });
        }
    }

    structure.bonds.extend(inferred);
}

/// Atoms in different named alternate-location groups never bond.
fn compatible_alt_loc(a: &Atom, b: &Atom) -> bool {
    match (a.alt_loc, b.alt_loc) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    }
}
