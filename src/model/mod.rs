//! The typed chemical graph: atoms, bonds, residues, chains, and
//! secondary-structure runs, arena-owned by [`Structure`].
//!
//! Every cross-reference (atom → residue, residue → chain, bond → atoms)
//! is a plain index into the owning structure's arenas, never a direct
//! reference. Indices are stable for the structure's lifetime; nothing is
//! deleted individually — a reload replaces the whole structure. A
//! finalized structure is immutable and safely shared read-only across
//! concurrent geometry builds.

use glam::Vec3;

use crate::chem::{Element, ResidueType};

/// A single atom record.
#[derive(Debug, Clone)]
pub struct Atom {
    /// Chemical element.
    pub element: Element,
    /// Position in angstroms.
    pub position: Vec3,
    /// Serial id from the source file (unique within a model).
    pub serial: i64,
    /// Atom name (`"CA"`, `"OG1"`, ...), trimmed.
    pub name: String,
    /// Index of the owning residue.
    pub residue: usize,
    /// Occupancy, defaulted to 1.0 when absent.
    pub occupancy: f32,
    /// Temperature factor, defaulted to 0.0 when absent.
    pub b_factor: f32,
    /// Alternate-location tag, if any.
    pub alt_loc: Option<char>,
    /// True for HETATM-style records.
    pub het: bool,
}

/// Bond order classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondOrder {
    /// Single covalent bond.
    Single,
    /// Double bond.
    Double,
    /// Triple bond.
    Triple,
    /// Delocalized aromatic bond.
    Aromatic,
    /// Order not determined.
    Unknown,
}

/// Where a bond came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondSource {
    /// Declared explicitly in the source file (CONECT-style record).
    Explicit,
    /// Inferred from interatomic distance and covalent radii.
    Inferred,
}

/// A covalent bond between two atoms.
///
/// The atom pair is stored with `atoms.0 < atoms.1` so each unordered pair
/// has one canonical representation; the structure builder guarantees no
/// duplicates and never lets an inferred bond override an explicit one.
#[derive(Debug, Clone, Copy)]
pub struct Bond {
    /// Atom indices, lower first.
    pub atoms: (usize, usize),
    /// Bond order.
    pub order: BondOrder,
    /// Explicit or inferred.
    pub source: BondSource,
}

impl Bond {
    /// Canonicalize an unordered atom pair.
    #[must_use]
    pub fn key(a: usize, b: usize) -> (usize, usize) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }
}

/// A residue: one monomer unit owning an ordered run of atoms.
#[derive(Debug, Clone)]
pub struct Residue {
    /// Shared registry entry for this residue's kind.
    pub kind: &'static ResidueType,
    /// Sequence number from the source file.
    pub seq: i64,
    /// Insertion code, if any.
    pub insertion: Option<char>,
    /// Indices of owned atoms, in file order.
    pub atoms: Vec<usize>,
    /// Index of the owning chain.
    pub chain: usize,
    /// Index into [`Structure::ss_runs`] once secondary structure is
    /// assigned.
    pub ss_run: Option<usize>,
}

impl Residue {
    /// Find an owned atom by trimmed name.
    #[must_use]
    pub fn atom_by_name<'a>(
        &self,
        structure: &'a Structure,
        name: &str,
    ) -> Option<&'a Atom> {
        self.atoms
            .iter()
            .map(|&i| &structure.atoms[i])
            .find(|a| a.name == name)
    }
}

/// An ordered sequence of residues forming one molecular strand.
#[derive(Debug, Clone)]
pub struct Chain {
    /// Chain identifier from the source file.
    pub id: String,
    /// Indices of owned residues, in file order. Residues of one chain
    /// occupy a contiguous index range in [`Structure::residues`].
    pub residues: Vec<usize>,
    /// Backbone trace: atom indices (Cα for protein, P for nucleic) used
    /// by curve-based representations. One entry per traced residue.
    pub trace: Vec<usize>,
}

/// Secondary-structure classification of a backbone segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SsKind {
    /// Alpha helix.
    Helix,
    /// Beta strand/sheet.
    Sheet,
    /// Unclassified backbone.
    Coil,
    /// Tight turn (from explicit records only).
    Turn,
}

/// A contiguous residue range within one chain sharing an [`SsKind`].
///
/// Runs partition each chain: non-overlapping, gap-free, covering every
/// residue exactly once. Computed once after parsing and consumed
/// read-only by ribbon/cartoon builders.
#[derive(Debug, Clone)]
pub struct SecondaryStructureRun {
    /// Owning chain index.
    pub chain: usize,
    /// Global residue index range (`start..end`, half-open).
    pub residues: std::ops::Range<usize>,
    /// Classification of the whole run.
    pub kind: SsKind,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// An empty box that absorbs any point on [`Aabb::grow`].
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Expand to include a point.
    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Box center, or the origin for an empty box.
    #[must_use]
    pub fn center(&self) -> Vec3 {
        if self.min.x > self.max.x {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    /// Enclosing bounding sphere `(center, radius)`.
    #[must_use]
    pub fn bounding_sphere(&self) -> (Vec3, f32) {
        if self.min.x > self.max.x {
            return (Vec3::ZERO, 0.0);
        }
        let center = self.center();
        (center, (self.max - center).length())
    }
}

/// Top-level owner of all atoms, bonds, residues, chains, and
/// secondary-structure runs for one structural model.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// All atoms, in file order.
    pub atoms: Vec<Atom>,
    /// All bonds, explicit first, then inferred.
    pub bonds: Vec<Bond>,
    /// All residues, grouped contiguously by chain.
    pub residues: Vec<Residue>,
    /// All chains, in file order.
    pub chains: Vec<Chain>,
    /// Secondary-structure runs partitioning every chain.
    pub ss_runs: Vec<SecondaryStructureRun>,
}

impl Structure {
    /// Positions of all atoms, in atom-index order.
    #[must_use]
    pub fn positions(&self) -> Vec<Vec3> {
        self.atoms.iter().map(|a| a.position).collect()
    }

    /// Axis-aligned bounding box over all atoms.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::EMPTY;
        for atom in &self.atoms {
            aabb.grow(atom.position);
        }
        aabb
    }

    /// The secondary-structure kind assigned to a residue, coil when
    /// assignment has not run.
    #[must_use]
    pub fn ss_kind_of(&self, residue: usize) -> SsKind {
        self.residues[residue]
            .ss_run
            .map_or(SsKind::Coil, |run| self.ss_runs[run].kind)
    }

    /// Chain index owning an atom.
    #[must_use]
    pub fn chain_of_atom(&self, atom: usize) -> usize {
        self.residues[self.atoms[atom].residue].chain
    }
}
