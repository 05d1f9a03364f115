//! Chemical elements and their per-element constants.

/// Chemical element for atoms in a molecular structure.
///
/// Covers the biologically relevant elements found in proteins, nucleic
/// acids, ligands, ions, and waters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Element {
    H,
    C,
    N,
    O,
    S,
    P,
    Se,
    Fe,
    Zn,
    Mg,
    Ca,
    Na,
    Cl,
    K,
    Mn,
    Co,
    Ni,
    Cu,
    Br,
    I,
    F,
    /// Anything not in the table. Carbon-like radii, gray color.
    Unknown,
}

impl Element {
    /// Parse an element from a 1-2 character symbol (case-insensitive).
    #[must_use]
    pub fn from_symbol(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "H" | "D" => Self::H,
            "C" => Self::C,
            "N" => Self::N,
            "O" => Self::O,
            "S" => Self::S,
            "P" => Self::P,
            "SE" => Self::Se,
            "FE" => Self::Fe,
            "ZN" => Self::Zn,
            "MG" => Self::Mg,
            "CA" => Self::Ca,
            "NA" => Self::Na,
            "CL" => Self::Cl,
            "K" => Self::K,
            "MN" => Self::Mn,
            "CO" => Self::Co,
            "NI" => Self::Ni,
            "CU" => Self::Cu,
            "BR" => Self::Br,
            "I" => Self::I,
            "F" => Self::F,
            _ => Self::Unknown,
        }
    }

    /// Infer the element from a PDB atom name when the element column is
    /// blank (e.g. `"CA"` → C, `"OG1"` → O, `"SD"` → S).
    ///
    /// For standard protein/nucleic atom names the first alphabetic
    /// character identifies the element.
    #[must_use]
    pub fn from_atom_name(name: &str) -> Self {
        name.trim()
            .chars()
            .find(char::is_ascii_alphabetic)
            .map_or(Self::Unknown, |ch| match ch.to_ascii_uppercase() {
                'C' => Self::C,
                'N' => Self::N,
                'O' => Self::O,
                'S' => Self::S,
                'H' => Self::H,
                'P' => Self::P,
                _ => Self::Unknown,
            })
    }

    /// Atomic number (0 for [`Element::Unknown`]).
    #[must_use]
    pub fn atomic_number(self) -> u8 {
        match self {
            Self::H => 1,
            Self::C => 6,
            Self::N => 7,
            Self::O => 8,
            Self::F => 9,
            Self::Na => 11,
            Self::Mg => 12,
            Self::P => 15,
            Self::S => 16,
            Self::Cl => 17,
            Self::K => 19,
            Self::Ca => 20,
            Self::Mn => 25,
            Self::Fe => 26,
            Self::Co => 27,
            Self::Ni => 28,
            Self::Cu => 29,
            Self::Zn => 30,
            Self::Se => 34,
            Self::Br => 35,
            Self::I => 53,
            Self::Unknown => 0,
        }
    }

    /// Covalent radius in angstroms (Cambridge CSD values).
    #[must_use]
    pub fn covalent_radius(self) -> f32 {
        match self {
            Self::H => 0.31,
            Self::C => 0.76,
            Self::N => 0.71,
            Self::O => 0.66,
            Self::S => 1.05,
            Self::P => 1.07,
            Self::Se | Self::Br => 1.20,
            Self::Fe | Self::Cu => 1.32,
            Self::Zn => 1.22,
            Self::Mg => 1.41,
            Self::Ca => 1.76,
            Self::Na => 1.66,
            Self::Cl => 1.02,
            Self::K => 2.03,
            Self::Mn | Self::I => 1.39,
            Self::Co => 1.26,
            Self::Ni => 1.24,
            Self::F => 0.57,
            Self::Unknown => 0.77,
        }
    }

    /// Van der Waals radius in angstroms.
    #[must_use]
    pub fn vdw_radius(self) -> f32 {
        match self {
            Self::H => 1.20,
            Self::C => 1.70,
            Self::N => 1.55,
            Self::O => 1.52,
            Self::S | Self::P => 1.80,
            Self::Se => 1.90,
            Self::Fe | Self::Mn | Self::Co => 2.00,
            Self::Zn => 1.39,
            Self::Mg => 1.73,
            Self::Ca => 2.31,
            Self::Na => 2.27,
            Self::Cl => 1.75,
            Self::K => 2.75,
            Self::Ni => 1.63,
            Self::Cu => 1.40,
            Self::Br => 1.85,
            Self::I => 1.98,
            Self::F => 1.47,
            Self::Unknown => 1.70,
        }
    }

    /// Default per-element color (Corey-Pauling-Koltun scheme, 0-1 RGB).
    #[must_use]
    pub fn cpk_color(self) -> [f32; 3] {
        match self {
            Self::H => [1.0, 1.0, 1.0],
            Self::C => [0.4, 0.4, 0.4],
            Self::N => [0.2, 0.2, 1.0],
            Self::O => [1.0, 0.2, 0.2],
            Self::S => [1.0, 0.85, 0.2],
            Self::P => [1.0, 0.5, 0.0],
            Self::Se => [1.0, 0.63, 0.0],
            Self::Fe => [0.56, 0.25, 0.08],
            Self::Zn => [0.49, 0.50, 0.69],
            Self::Mg | Self::Ca => [0.0, 0.55, 0.0],
            Self::Na => [0.67, 0.36, 0.95],
            Self::Cl => [0.12, 0.94, 0.12],
            Self::K => [0.56, 0.25, 0.83],
            Self::Mn => [0.61, 0.48, 0.78],
            Self::Co => [0.94, 0.56, 0.63],
            Self::Ni => [0.31, 0.82, 0.31],
            Self::Cu => [0.78, 0.50, 0.20],
            Self::Br => [0.65, 0.16, 0.16],
            Self::I => [0.58, 0.0, 0.58],
            Self::F => [0.56, 0.88, 0.31],
            Self::Unknown => [0.7, 0.7, 0.7],
        }
    }

    /// Canonical symbol string.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::H => "H",
            Self::C => "C",
            Self::N => "N",
            Self::O => "O",
            Self::S => "S",
            Self::P => "P",
            Self::Se => "Se",
            Self::Fe => "Fe",
            Self::Zn => "Zn",
            Self::Mg => "Mg",
            Self::Ca => "Ca",
            Self::Na => "Na",
            Self::Cl => "Cl",
            Self::K => "K",
            Self::Mn => "Mn",
            Self::Co => "Co",
            Self::Ni => "Ni",
            Self::Cu => "Cu",
            Self::Br => "Br",
            Self::I => "I",
            Self::F => "F",
            Self::Unknown => "X",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_round_trip() {
        for elem in [Element::H, Element::C, Element::Fe, Element::Se] {
            assert_eq!(Element::from_symbol(elem.symbol()), elem);
        }
    }

    #[test]
    fn symbol_is_case_insensitive() {
        assert_eq!(Element::from_symbol("fe"), Element::Fe);
        assert_eq!(Element::from_symbol(" ZN "), Element::Zn);
        assert_eq!(Element::from_symbol("Xx"), Element::Unknown);
    }

    #[test]
    fn atom_name_heuristic() {
        assert_eq!(Element::from_atom_name("CA"), Element::C);
        assert_eq!(Element::from_atom_name("OG1"), Element::O);
        assert_eq!(Element::from_atom_name("SD"), Element::S);
        assert_eq!(Element::from_atom_name("1HB"), Element::H);
        assert_eq!(Element::from_atom_name(""), Element::Unknown);
    }

    #[test]
    fn radii_are_positive() {
        for elem in [Element::H, Element::C, Element::K, Element::Unknown] {
            assert!(elem.covalent_radius() > 0.0);
            assert!(elem.vdw_radius() > elem.covalent_radius());
        }
    }
}
