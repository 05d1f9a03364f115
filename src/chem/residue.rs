//! Residue-type registry.
//!
//! A fixed, process-wide table of canonical residue descriptors (amino
//! acids, nucleotides, waters) keyed by short code. The table is built once
//! behind a `OnceLock`, the flag/parameter population pass completes before
//! the registry is published, and entries are referenced by `&'static`
//! identity thereafter — never copied.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

/// Bitset of residue chemistry flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResidueFlags(u32);

impl ResidueFlags {
    /// Amino acid residue.
    pub const PROTEIN: Self = Self(0x0001);
    /// Basic amino acid residue.
    pub const BASIC: Self = Self(0x0002);
    /// Acidic amino acid residue.
    pub const ACIDIC: Self = Self(0x0004);
    /// Polar uncharged side chain.
    pub const POLAR: Self = Self(0x0008);
    /// Non-polar hydrophobic side chain.
    pub const NONPOLAR: Self = Self(0x0010);
    /// Aromatic side chain.
    pub const AROMATIC: Self = Self(0x0020);
    /// Nucleic residue.
    pub const NUCLEIC: Self = Self(0x0100);
    /// Purine nucleic residue.
    pub const PURINE: Self = Self(0x0200);
    /// Pyrimidine nucleic residue.
    pub const PYRIMIDINE: Self = Self(0x0400);
    /// DNA nucleotide.
    pub const DNA: Self = Self(0x0800);
    /// RNA nucleotide.
    pub const RNA: Self = Self(0x1000);
    /// Water.
    pub const WATER: Self = Self(0x1_0000);

    /// Empty flag set.
    pub const NONE: Self = Self(0);

    /// True when every bit of `other` is set in `self`.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when any bit of `other` is set in `self`.
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Union of two flag sets.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

/// Canonical descriptor for a residue/nucleotide kind.
///
/// Instances live in the shared registry; atoms and residues hold
/// `&'static` references to them.
#[derive(Debug)]
pub struct ResidueType {
    /// Short code (`"ALA"`, `"DG"`, `"HOH"`, ...).
    pub code: &'static str,
    /// Full residue name.
    pub full_name: &'static str,
    /// One-letter code, empty for residues without one.
    pub letter: &'static str,
    /// Chemistry classification flags.
    pub flags: ResidueFlags,
    /// Kyte-Doolittle hydrophobicity, where defined.
    pub hydrophobicity: Option<f32>,
}

impl ResidueType {
    /// True for standard amino acids.
    #[must_use]
    pub fn is_protein(&self) -> bool {
        self.flags.contains(ResidueFlags::PROTEIN)
    }

    /// True for nucleotides (DNA or RNA).
    #[must_use]
    pub fn is_nucleic(&self) -> bool {
        self.flags.contains(ResidueFlags::NUCLEIC)
    }

    /// True for water entries.
    #[must_use]
    pub fn is_water(&self) -> bool {
        self.flags.contains(ResidueFlags::WATER)
    }
}

/// Seed table: short code, full name, one-letter code.
const SEED: &[(&str, &str, &str)] = &[
    ("ALA", "Alanine", "A"),
    ("ARG", "Arginine", "R"),
    ("ASN", "Asparagine", "N"),
    ("ASP", "Aspartic Acid", "D"),
    ("CYS", "Cysteine", "C"),
    ("GLN", "Glutamine", "Q"),
    ("GLU", "Glutamic Acid", "E"),
    ("GLY", "Glycine", "G"),
    ("HIS", "Histidine", "H"),
    ("ILE", "Isoleucine", "I"),
    ("LEU", "Leucine", "L"),
    ("LYS", "Lysine", "K"),
    ("MET", "Methionine", "M"),
    ("PHE", "Phenylalanine", "F"),
    ("PRO", "Proline", "P"),
    ("PYL", "Pyrrolysine", "O"),
    ("SEC", "Selenocysteine", "U"),
    ("SER", "Serine", "S"),
    ("THR", "Threonine", "T"),
    ("TRP", "Tryptophan", "W"),
    ("TYR", "Tyrosine", "Y"),
    ("VAL", "Valine", "V"),
    ("A", "Adenine", "A"),
    ("C", "Cytosine", "C"),
    ("G", "Guanine", "G"),
    ("I", "Inosine", "I"),
    ("T", "Thymine", "T"),
    ("U", "Uracil", "U"),
    ("DA", "Adenine", "A"),
    ("DC", "Cytosine", "C"),
    ("DG", "Guanine", "G"),
    ("DI", "Inosine", "I"),
    ("DT", "Thymine", "T"),
    ("DU", "Uracil", "U"),
    ("+A", "Adenine", "A"),
    ("+C", "Cytosine", "C"),
    ("+G", "Guanine", "G"),
    ("+I", "Inosine", "I"),
    ("+T", "Thymine", "T"),
    ("+U", "Uracil", "U"),
    ("WAT", "Water", ""),
    ("H2O", "Water", ""),
    ("HOH", "Water", ""),
    ("DOD", "Water", ""),
    ("UNK", "Unknown", ""),
    ("UNL", "Unknown Ligand", ""),
];

const PROTEIN_CODES: &[&str] = &[
    "ALA", "ARG", "ASN", "ASP", "CYS", "GLY", "GLU", "GLN", "HIS", "ILE",
    "LEU", "LYS", "MET", "PHE", "PRO", "PYL", "SEC", "SER", "THR", "TRP",
    "TYR", "VAL",
];
const BASIC_CODES: &[&str] = &["ARG", "HIS", "LYS"];
const ACIDIC_CODES: &[&str] = &["ASP", "GLU"];
const POLAR_CODES: &[&str] = &["ASN", "CYS", "GLN", "SER", "THR", "TYR"];
const NONPOLAR_CODES: &[&str] =
    &["ALA", "ILE", "LEU", "MET", "PHE", "PRO", "TRP", "VAL", "GLY"];
const AROMATIC_CODES: &[&str] = &["PHE", "TRP", "TYR"];
const PURINE_CODES: &[&str] =
    &["A", "G", "I", "DA", "DG", "DI", "+A", "+G", "+I"];
const PYRIMIDINE_CODES: &[&str] =
    &["C", "T", "U", "DC", "DT", "DU", "+C", "+T", "+U"];
const DNA_CODES: &[&str] = &["DA", "DG", "DI", "DC", "DT", "DU"];
const RNA_CODES: &[&str] = &["A", "G", "I", "C", "T", "U"];
const WATER_CODES: &[&str] = &["WAT", "H2O", "HOH", "DOD"];

/// Kyte-Doolittle hydrophobicity scale.
const HYDROPHOBICITY: &[(&str, f32)] = &[
    ("ILE", 4.5),
    ("VAL", 4.2),
    ("LEU", 3.8),
    ("PHE", 2.8),
    ("CYS", 2.5),
    ("MET", 1.9),
    ("ALA", 1.8),
    ("GLY", -0.4),
    ("THR", -0.7),
    ("SER", -0.8),
    ("TRP", -0.9),
    ("TYR", -1.3),
    ("PRO", -1.6),
    ("HIS", -3.2),
    ("GLU", -3.5),
    ("GLN", -3.5),
    ("ASP", -3.5),
    ("ASN", -3.5),
    ("LYS", -3.9),
    ("ARG", -4.5),
];

struct Registry {
    types: Vec<ResidueType>,
    by_code: FxHashMap<&'static str, usize>,
    unknown: usize,
}

impl Registry {
    fn build() -> Self {
        let mut types: Vec<ResidueType> = SEED
            .iter()
            .map(|&(code, full_name, letter)| ResidueType {
                code,
                full_name,
                letter,
                flags: ResidueFlags::NONE,
                hydrophobicity: None,
            })
            .collect();

        let mut by_code = FxHashMap::default();
        for (i, t) in types.iter().enumerate() {
            let _ = by_code.insert(t.code, i);
        }

        let mut add_flag = |flag: ResidueFlags, codes: &[&str]| {
            for code in codes {
                if let Some(&i) = by_code.get(code) {
                    types[i].flags = types[i].flags.union(flag);
                }
            }
        };

        add_flag(ResidueFlags::PROTEIN, PROTEIN_CODES);
        add_flag(ResidueFlags::BASIC, BASIC_CODES);
        add_flag(ResidueFlags::ACIDIC, ACIDIC_CODES);
        add_flag(ResidueFlags::POLAR, POLAR_CODES);
        add_flag(ResidueFlags::NONPOLAR, NONPOLAR_CODES);
        add_flag(ResidueFlags::AROMATIC, AROMATIC_CODES);
        add_flag(
            ResidueFlags::NUCLEIC,
            &[PURINE_CODES, PYRIMIDINE_CODES].concat(),
        );
        add_flag(ResidueFlags::PURINE, PURINE_CODES);
        add_flag(ResidueFlags::PYRIMIDINE, PYRIMIDINE_CODES);
        add_flag(ResidueFlags::DNA, DNA_CODES);
        add_flag(ResidueFlags::RNA, RNA_CODES);
        add_flag(ResidueFlags::WATER, WATER_CODES);

        for &(code, value) in HYDROPHOBICITY {
            if let Some(&i) = by_code.get(code) {
                types[i].hydrophobicity = Some(value);
            }
        }

        let unknown = by_code.get("UNK").copied().unwrap_or(0);

        Self {
            types,
            by_code,
            unknown,
        }
    }
}

fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::build)
}

/// Look up a residue type by short code (case-insensitive).
///
/// Unknown codes resolve to the shared `UNK` entry so callers always get a
/// valid type; check `result.code == "UNK"` to detect the fallback.
#[must_use]
pub fn residue_type(code: &str) -> &'static ResidueType {
    let reg = registry();
    let trimmed = code.trim();
    let idx = reg
        .by_code
        .get(trimmed)
        .or_else(|| reg.by_code.get(trimmed.to_ascii_uppercase().as_str()))
        .copied()
        .unwrap_or(reg.unknown);
    &reg.types[idx]
}
