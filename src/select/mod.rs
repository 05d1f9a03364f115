//! Selection expression evaluation.
//!
//! A [`Selection`] is parsed once and evaluated against any [`Structure`]
//! as a pure function: no mutation, deterministic sorted output. Malformed
//! expressions fail at parse time with [`Error::SelectionSyntax`]; unknown
//! identifiers at evaluation time resolve to the empty set with a warning,
//! since partial matches across heterogeneous structures are expected.

mod parser;

use parser::Expr;

use crate::chem::Element;
use crate::error::Error;
use crate::events::{Warning, WarningKind};
use crate::model::Structure;
use crate::spatial::{SpatialGrid, DEFAULT_CELL_SIZE};

/// A parsed, reusable selection expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    root: Expr,
}

/// Atoms denoted by a selection, plus non-fatal resolution warnings.
#[derive(Debug, Clone, Default)]
pub struct SelectionResult {
    /// Matching atom indices, ascending.
    pub atoms: Vec<usize>,
    /// Unresolved-identifier warnings.
    pub warnings: Vec<Warning>,
}

impl Selection {
    /// Parse a selection expression.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SelectionSyntax`] when the expression is malformed.
    pub fn parse(expr: &str) -> Result<Self, Error> {
        Ok(Self {
            root: parser::parse(expr)?,
        })
    }

    /// Evaluate against a structure, producing the sorted atom-index set.
    #[must_use]
    pub fn evaluate(&self, structure: &Structure) -> SelectionResult {
        let mut ctx = EvalContext {
            structure,
            grid: None,
            warnings: Vec::new(),
        };
        let mask = ctx.eval(&self.root);
        SelectionResult {
            atoms: mask
                .iter()
                .enumerate()
                .filter_map(|(i, &hit)| hit.then_some(i))
                .collect(),
            warnings: ctx.warnings,
        }
    }
}

/// Parse and evaluate in one call.
///
/// # Errors
///
/// Returns [`Error::SelectionSyntax`] when the expression is malformed.
pub fn select(
    structure: &Structure,
    expr: &str,
) -> Result<SelectionResult, Error> {
    Ok(Selection::parse(expr)?.evaluate(structure))
}

struct EvalContext<'a> {
    structure: &'a Structure,
    // Built lazily, only expressions using `within` pay for it.
    grid: Option<SpatialGrid>,
    warnings: Vec<Warning>,
}

impl EvalContext<'_> {
    fn eval(&mut self, expr: &Expr) -> Vec<bool> {
        let n = self.structure.atoms.len();
        match expr {
            Expr::All => vec![true; n],
            Expr::None => vec![false; n],
            Expr::Chain(ids) => self.eval_chain(ids),
            Expr::ResName(codes) => self.eval_resname(codes),
            Expr::Element(symbols) => self.eval_element(symbols),
            Expr::Name(names) => self.eval_name(names),
            Expr::Resi(ranges) => self.by_atom(|s, i| {
                let seq = s.residues[s.atoms[i].residue].seq;
                ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&seq))
            }),
            Expr::Flags(flags) => self.by_atom(|s, i| {
                s.residues[s.atoms[i].residue].kind.flags.intersects(*flags)
            }),
            Expr::Hetero => self.by_atom(|s, i| s.atoms[i].het),
            Expr::And(a, b) => {
                let mut mask = self.eval(a);
                let other = self.eval(b);
                for (m, o) in mask.iter_mut().zip(other) {
                    *m = *m && o;
                }
                mask
            }
            Expr::Or(a, b) => {
                let mut mask = self.eval(a);
                let other = self.eval(b);
                for (m, o) in mask.iter_mut().zip(other) {
                    *m = *m || o;
                }
                mask
            }
            Expr::Not(inner) => {
                let mut mask = self.eval(inner);
                for m in &mut mask {
                    *m = !*m;
                }
                mask
            }
            Expr::Within(radius, inner) => self.eval_within(*radius, inner),
        }
    }

    fn by_atom(
        &self,
        predicate: impl Fn(&Structure, usize) -> bool,
    ) -> Vec<bool> {
        (0..self.structure.atoms.len())
            .map(|i| predicate(self.structure, i))
            .collect()
    }

    fn eval_chain(&mut self, ids: &[String]) -> Vec<bool> {
        for id in ids {
            if !self.structure.chains.iter().any(|c| &c.id == id) {
                self.unresolved(format!("chain {id} matches nothing"));
            }
        }
        self.by_atom(|s, i| {
            let chain = s.residues[s.atoms[i].residue].chain;
            ids.iter().any(|id| &s.chains[chain].id == id)
        })
    }

    fn eval_resname(&mut self, codes: &[String]) -> Vec<bool> {
        for code in codes {
            let known = self
                .structure
                .residues
                .iter()
                .any(|r| r.kind.code.eq_ignore_ascii_case(code));
            if !known {
                self.unresolved(format!("resname {code} matches nothing"));
            }
        }
        self.by_atom(|s, i| {
            let kind = s.residues[s.atoms[i].residue].kind;
            codes.iter().any(|c| kind.code.eq_ignore_ascii_case(c))
        })
    }

    fn eval_element(&mut self, symbols: &[String]) -> Vec<bool> {
        let elements: Vec<Element> = symbols
            .iter()
            .map(|sym| {
                let element = Element::from_symbol(sym);
                if element == Element::Unknown
                    && !sym.eq_ignore_ascii_case("unknown")
                {
                    self.unresolved(format!(
                        "element {sym} is not in the element table"
                    ));
                }
                element
            })
            .collect();
        self.by_atom(|s, i| elements.contains(&s.atoms[i].element))
    }

    fn eval_name(&mut self, names: &[String]) -> Vec<bool> {
        for name in names {
            let known = self
                .structure
                .atoms
                .iter()
                .any(|a| a.name.eq_ignore_ascii_case(name));
            if !known {
                self.unresolved(format!("name {name} matches nothing"));
            }
        }
        self.by_atom(|s, i| {
            names.iter().any(|n| s.atoms[i].name.eq_ignore_ascii_case(n))
        })
    }

    fn eval_within(&mut self, radius: f32, inner: &Expr) -> Vec<bool> {
        let seed = self.eval(inner);
        let grid = self.grid.get_or_insert_with(|| {
            SpatialGrid::build(&self.structure.positions(), DEFAULT_CELL_SIZE)
        });

        let mut mask = vec![false; seed.len()];
        for (i, &hit) in seed.iter().enumerate() {
            if !hit {
                continue;
            }
            mask[i] = true;
            for j in grid.query(self.structure.atoms[i].position, radius) {
                mask[j] = true;
            }
        }
        mask
    }

    fn unresolved(&mut self, message: String) {
        self.warnings
            .push(Warning::new(WarningKind::UnresolvedIdentifier, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::load_structure;

    // 2 ALA + 1 GLY + 1 TRP backbone-only residues on chain A, plus a
    // water on chain W.
    const MIXED: &str = "\
ATOM      1  N   ALA A   1       0.000   0.000   0.000  1.00  0.00           N
ATOM      2  CA  ALA A   1       1.458   0.000   0.000  1.00  0.00           C
ATOM      3  C   ALA A   1       2.980   0.000   0.000  1.00  0.00           C
ATOM      4  N   GLY A   2       4.310   0.000   0.000  1.00  0.00           N
ATOM      5  CA  GLY A   2       5.768   0.000   0.000  1.00  0.00           C
ATOM      6  C   GLY A   2       7.290   0.000   0.000  1.00  0.00           C
ATOM      7  N   TRP A   3       8.620   0.000   0.000  1.00  0.00           N
ATOM      8  CA  TRP A   3      10.078   0.000   0.000  1.00  0.00           C
ATOM      9  C   TRP A   3      11.600   0.000   0.000  1.00  0.00           C
ATOM     10  N   ALA A   4      12.930   0.000   0.000  1.00  0.00           N
ATOM     11  CA  ALA A   4      14.388   0.000   0.000  1.00  0.00           C
ATOM     12  C   ALA A   4      15.910   0.000   0.000  1.00  0.00           C
HETATM   13  O   HOH W 101      30.000  30.000  30.000  1.00  0.00           O
END
";

    fn mixed_structure() -> Structure {
        let result = load_structure(MIXED.as_bytes(), None).unwrap();
        result.structures.into_iter().next().unwrap_or_default()
    }

    #[test]
    fn resname_union_matches_residue_atoms() {
        let s = mixed_structure();
        let result = select(&s, "resname ALA or resname GLY").unwrap();
        // Residues 1, 2, 4: atoms 0-5 and 9-11.
        assert_eq!(result.atoms, vec![0, 1, 2, 3, 4, 5, 9, 10, 11]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn chain_and_flag_predicates() {
        let s = mixed_structure();
        assert_eq!(select(&s, "chain W").unwrap().atoms, vec![12]);
        assert_eq!(select(&s, "water").unwrap().atoms, vec![12]);
        assert_eq!(
            select(&s, "protein").unwrap().atoms,
            (0..12).collect::<Vec<_>>()
        );
        assert_eq!(select(&s, "name CA").unwrap().atoms, vec![1, 4, 7, 10]);
        assert_eq!(
            select(&s, "resi 2-3").unwrap().atoms,
            vec![3, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn unknown_chain_is_empty_with_warning() {
        let s = mixed_structure();
        let result = select(&s, "chain Z").unwrap();
        assert!(result.atoms.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(
            result.warnings[0].kind,
            WarningKind::UnresolvedIdentifier
        );
    }

    #[test]
    fn double_negation_is_identity() {
        let s = mixed_structure();
        for expr in ["chain A", "resname TRP", "water", "resi 1-2"] {
            let direct = select(&s, expr).unwrap().atoms;
            let doubled =
                select(&s, &format!("not (not ({expr}))")).unwrap().atoms;
            assert_eq!(direct, doubled, "{expr}");
        }
    }

    #[test]
    fn conjunction_is_idempotent() {
        let s = mixed_structure();
        for expr in ["chain A", "name CA", "protein"] {
            let direct = select(&s, expr).unwrap().atoms;
            let squared =
                select(&s, &format!("({expr}) and ({expr})")).unwrap().atoms;
            assert_eq!(direct, squared, "{expr}");
        }
    }

    #[test]
    fn within_includes_the_seed_selection() {
        let s = mixed_structure();
        let result = select(&s, "within 2.0 of name CA").unwrap();
        // Every backbone atom sits within 2 Å of a CA; the water does not.
        assert_eq!(result.atoms, (0..12).collect::<Vec<_>>());

        let tight = select(&s, "within 0.1 of name CA").unwrap();
        assert_eq!(tight.atoms, vec![1, 4, 7, 10]);
    }

    #[test]
    fn evaluation_does_not_mutate_the_structure() {
        let s = mixed_structure();
        let before = s.atoms.len();
        let _ = select(&s, "within 5.0 of water").unwrap();
        assert_eq!(s.atoms.len(), before);
    }

    #[test]
    fn empty_structure_evaluates_to_empty() {
        let s = Structure::default();
        let result = select(&s, "all").unwrap();
        assert!(result.atoms.is_empty());
    }
}
