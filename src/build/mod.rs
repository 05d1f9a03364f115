//! Structure builder: raw records → finalized [`Structure`].
//!
//! Materializes atoms/residues/chains, collects explicit bonds, builds the
//! spatial index, infers missing bonds, and assigns secondary structure.
//! Structurally inconsistent records (a bond referencing a non-existent
//! serial) are dropped with a warning, never fatal; an empty record stream
//! yields an empty-but-valid structure.

mod bonds;
mod secondary;

pub use secondary::SsFallback;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::chem::residue_type;
use crate::error::Error;
use crate::events::{Warning, WarningKind};
use crate::format::{self, AtomRecord, RawRecord, SsHint};
use crate::model::{Atom, Bond, BondOrder, BondSource, Chain, Residue, Structure};
use crate::spatial::{SpatialGrid, DEFAULT_CELL_SIZE};

/// Bond-inference tolerance added to the covalent radius sum, in angstroms.
pub const BOND_TOLERANCE: f32 = 0.45;

/// Pairs closer than this are coincident/duplicate atoms, not bonds.
pub const MIN_BOND_LENGTH: f32 = 0.4;

/// Builder configuration. All fields default so partial configs work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BuilderOptions {
    /// Infer bonds from interatomic distances (explicit bonds are always
    /// collected regardless).
    pub infer_bonds: bool,
    /// Tolerance added to the covalent radius sum.
    pub bond_tolerance: f32,
    /// Policy for residues not covered by explicit HELIX/SHEET records.
    pub ss_fallback: SsFallback,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            infer_bonds: true,
            bond_tolerance: BOND_TOLERANCE,
            ss_fallback: SsFallback::Compute,
        }
    }
}

/// A successful load: one structure per model plus accumulated warnings.
#[derive(Debug, Default)]
pub struct LoadResult {
    /// One finalized structure per structural model, file order. Never
    /// empty: a load without MODEL records produces exactly one.
    pub structures: Vec<Structure>,
    /// Non-fatal events accumulated across parsing and building.
    pub warnings: Vec<Warning>,
}

impl LoadResult {
    /// The active structure (the first model).
    #[must_use]
    pub fn structure(&self) -> &Structure {
        &self.structures[0]
    }
}

/// Load a structure from a byte buffer with default builder options.
///
/// `hint` is an optional format name or file extension; when absent the
/// format is sniffed from the content signature.
pub fn load_structure(
    bytes: &[u8],
    hint: Option<&str>,
) -> Result<LoadResult, Error> {
    load_structure_with(bytes, hint, &BuilderOptions::default())
}

/// Load a structure with explicit builder options.
pub fn load_structure_with(
    bytes: &[u8],
    hint: Option<&str>,
    options: &BuilderOptions,
) -> Result<LoadResult, Error> {
    let (_, stream) = format::parse(bytes, hint)?;
    let mut warnings = stream.warnings;

    // Split into models. Records outside MODEL/ENDMDL that carry
    // structure-wide facts (CONECT, HELIX/SHEET) apply to every model.
    let mut model_records: Vec<Vec<&AtomRecord>> = Vec::new();
    let mut current: Vec<&AtomRecord> = Vec::new();
    let mut in_model = false;
    let mut bond_records: Vec<(i64, &[i64])> = Vec::new();
    let mut ss_hints: Vec<&SsHint> = Vec::new();

    for record in &stream.records {
        match record {
            RawRecord::Atom(atom) => current.push(atom),
            RawRecord::Bond { from, to } => {
                bond_records.push((*from, to.as_slice()));
            }
            RawRecord::Ss(hint) => ss_hints.push(hint),
            RawRecord::ModelStart => {
                if in_model || !current.is_empty() {
                    model_records.push(std::mem::take(&mut current));
                }
                in_model = true;
            }
            RawRecord::ModelEnd => {
                model_records.push(std::mem::take(&mut current));
                in_model = false;
            }
            RawRecord::ChainBreak => {}
        }
    }
    if !current.is_empty() || model_records.is_empty() {
        model_records.push(current);
    }

    let structures = model_records
        .iter()
        .map(|records| {
            build_model(records, &bond_records, &ss_hints, options, &mut warnings)
        })
        .collect();

    Ok(LoadResult {
        structures,
        warnings,
    })
}

/// Build one finalized structure from the atom records of a single model.
fn build_model(
    records: &[&AtomRecord],
    bond_records: &[(i64, &[i64])],
    ss_hints: &[&SsHint],
    options: &BuilderOptions,
    warnings: &mut Vec<Warning>,
) -> Structure {
    let mut structure = Structure::default();
    let mut serial_to_atom: FxHashMap<i64, usize> = FxHashMap::default();
    let mut chain_by_id: FxHashMap<String, usize> = FxHashMap::default();
    let mut unknown_codes: FxHashSet<String> = FxHashSet::default();

    // 1. Materialize atoms, residues, chains. Residues of one chain stay
    //    contiguous in the arena even when chains interleave in the file.
    for record in records {
        let chain = *chain_by_id.entry(record.chain_id.clone()).or_insert_with(
            || {
                structure.chains.push(Chain {
                    id: record.chain_id.clone(),
                    residues: Vec::new(),
                    trace: Vec::new(),
                });
                structure.chains.len() - 1
            },
        );

        let kind = residue_type(&record.res_name);
        if kind.code == "UNK"
            && !record.res_name.eq_ignore_ascii_case("UNK")
            && unknown_codes.insert(record.res_name.clone())
        {
            warnings.push(Warning::new(
                WarningKind::UnknownResidue,
                format!(
                    "unknown residue code {:?}, treating as UNK",
                    record.res_name
                ),
            ));
        }

        let residue = matching_open_residue(&structure, chain, record)
            .unwrap_or_else(|| {
                structure.residues.push(Residue {
                    kind,
                    seq: record.res_seq,
                    insertion: record.insertion,
                    atoms: Vec::new(),
                    chain,
                    ss_run: None,
                });
                let idx = structure.residues.len() - 1;
                structure.chains[chain].residues.push(idx);
                idx
            });

        let atom_idx = structure.atoms.len();
        structure.atoms.push(Atom {
            element: record.element,
            position: record.position,
            serial: record.serial,
            name: record.name.clone(),
            residue,
            occupancy: record.occupancy,
            b_factor: record.b_factor,
            alt_loc: record.alt_loc,
            het: record.het,
        });
        structure.residues[residue].atoms.push(atom_idx);
        let _ = serial_to_atom.entry(record.serial).or_insert(atom_idx);
    }

    // Chains materialized per model interleave residues in the arena only
    // across chains; reorder residue arena references so each chain's
    // residues form a contiguous global range (required by SS runs).
    normalize_residue_order(&mut structure);

    // 2. Explicit bonds.
    let mut seen: FxHashSet<(usize, usize)> = FxHashSet::default();
    for &(from, to) in bond_records {
        let Some(&a) = serial_to_atom.get(&from) else {
            warnings.push(Warning::new(
                WarningKind::DroppedBond,
                format!("bond record references unknown atom serial {from}"),
            ));
            continue;
        };
        for &serial in to {
            let Some(&b) = serial_to_atom.get(&serial) else {
                warnings.push(Warning::new(
                    WarningKind::DroppedBond,
                    format!(
                        "bond record references unknown atom serial {serial}"
                    ),
                ));
                continue;
            };
            if a == b {
                continue;
            }
            let key = Bond::key(a, b);
            if seen.insert(key) {
                structure.bonds.push(Bond {
                    atoms: key,
                    order: BondOrder::Unknown,
                    source: BondSource::Explicit,
                });
            }
        }
    }

    // 3. Spatial index over final positions; 4. bond inference.
    if options.infer_bonds {
        let grid =
            SpatialGrid::build(&structure.positions(), DEFAULT_CELL_SIZE);
        bonds::infer(&mut structure, &grid, options.bond_tolerance, &mut seen);
    }

    // 5. Backbone traces and secondary structure.
    derive_traces(&mut structure);
    secondary::assign(&mut structure, ss_hints, options.ss_fallback, warnings);

    structure
}

/// Find the residue currently accepting atoms for this record, if the
/// record continues the chain's last residue (same seq + insertion code).
fn matching_open_residue(
    structure: &Structure,
    chain: usize,
    record: &AtomRecord,
) -> Option<usize> {
    let &last = structure.chains[chain].residues.last()?;
    let residue = &structure.residues[last];
    (residue.seq == record.res_seq && residue.insertion == record.insertion)
        .then_some(last)
}

/// Reorder the residue arena so each chain's residues occupy a contiguous
/// ascending range, preserving per-chain file order. Atom back-references
/// and chain residue lists are remapped.
fn normalize_residue_order(structure: &mut Structure) {
    let total = structure.residues.len();
    let mut order: Vec<usize> = Vec::with_capacity(total);
    for chain in &structure.chains {
        order.extend_from_slice(&chain.residues);
    }
    if order.windows(2).all(|w| w[0] < w[1]) {
        return; // already contiguous
    }

    let mut remap = vec![0usize; total];
    for (new_idx, &old_idx) in order.iter().enumerate() {
        remap[old_idx] = new_idx;
    }

    let mut reordered: Vec<Residue> = Vec::with_capacity(total);
    for &old_idx in &order {
        reordered.push(structure.residues[old_idx].clone());
    }
    structure.residues = reordered;

    for atom in &mut structure.atoms {
        atom.residue = remap[atom.residue];
    }
    for chain in &mut structure.chains {
        for r in &mut chain.residues {
            *r = remap[*r];
        }
    }
}

/// Derive each chain's backbone trace: Cα for protein residues, P for
/// nucleotides. One atom per traced residue, chain order.
fn derive_traces(structure: &mut Structure) {
    for chain_idx in 0..structure.chains.len() {
        let mut trace = Vec::new();
        for &res_idx in &structure.chains[chain_idx].residues {
            let residue = &structure.residues[res_idx];
            let wanted = if residue.kind.is_nucleic() { "P" } else { "CA" };
            let found = residue
                .atoms
                .iter()
                .copied()
                .find(|&a| structure.atoms[a].name == wanted);
            if let Some(atom_idx) = found {
                // Cα of a calcium ion is not a backbone atom.
                if wanted == "CA"
                    && !residue.kind.is_protein()
                    && structure.atoms[atom_idx].element
                        != crate::chem::Element::C
                {
                    continue;
                }
                trace.push(atom_idx);
            }
        }
        structure.chains[chain_idx].trace = trace;
    }
}
