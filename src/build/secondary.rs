//! Secondary-structure assignment.
//!
//! Explicit HELIX/SHEET/TURN records take precedence over the computed
//! Cα-distance heuristic on the ranges they cover. Residues without valid
//! backbone geometry break the current run and fall to coil — they are
//! never silently merged into a helix or sheet. Runs partition every
//! chain: contiguous, non-overlapping, covering each residue exactly once.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::events::{Warning, WarningKind};
use crate::format::SsHint;
use crate::model::{SecondaryStructureRun, SsKind, Structure};

/// Policy for residues not covered by explicit HELIX/SHEET/TURN records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum SsFallback {
    /// Back-fill uncovered residues with the Cα-distance heuristic.
    #[default]
    Compute,
    /// Leave uncovered residues as coil.
    Coil,
}

/// Assign secondary structure to every residue and build the run table.
pub(super) fn assign(
    structure: &mut Structure,
    hints: &[&SsHint],
    fallback: SsFallback,
    warnings: &mut Vec<Warning>,
) {
    let mut kinds = vec![SsKind::Coil; structure.residues.len()];

    for (chain_idx, chain) in structure.chains.iter().enumerate() {
        let traced = traced_residues(structure, chain_idx);
        let chain_hints: Vec<&&SsHint> = hints
            .iter()
            .filter(|h| h.chain_id == chain.id)
            .collect();

        // Heuristic pass over contiguous traced segments. Skipped when the
        // caller wants explicit-only assignment and hints exist.
        let compute = fallback == SsFallback::Compute || chain_hints.is_empty();
        if compute {
            for segment in contiguous_segments(structure, &traced) {
                let ca: Vec<Vec3> = segment
                    .iter()
                    .map(|&(_, atom)| structure.atoms[atom].position)
                    .collect();
                for (kind, &(res, _)) in
                    ca_distance_kinds(&ca).iter().zip(&segment)
                {
                    kinds[res] = *kind;
                }
            }
        }

        // Explicit records win wholesale on the ranges they cover.
        for hint in &chain_hints {
            for &res_idx in &chain.residues {
                let residue = &structure.residues[res_idx];
                if residue.seq < hint.start_seq || residue.seq > hint.end_seq {
                    continue;
                }
                if traced.iter().any(|&(r, _)| r == res_idx) {
                    kinds[res_idx] = hint.kind;
                } else {
                    warnings.push(Warning::new(
                        WarningKind::IncompleteBackbone,
                        format!(
                            "chain {} residue {} in a {:?} record lacks \
                             backbone atoms, kept as coil",
                            chain.id, residue.seq, hint.kind
                        ),
                    ));
                }
            }
        }
    }

    build_runs(structure, &kinds);
}

/// Chain residues that carry a backbone trace atom, as
/// `(residue index, trace atom index)` pairs in chain order.
fn traced_residues(
    structure: &Structure,
    chain_idx: usize,
) -> Vec<(usize, usize)> {
    structure.chains[chain_idx]
        .trace
        .iter()
        .map(|&atom| (structure.atoms[atom].residue, atom))
        .collect()
}

/// Split traced residues into segments of consecutive chain positions
/// with consecutive sequence numbers. A skipped (untraced) residue or a
/// numbering gap starts a new segment.
fn contiguous_segments(
    structure: &Structure,
    traced: &[(usize, usize)],
) -> Vec<Vec<(usize, usize)>> {
    let mut segments: Vec<Vec<(usize, usize)>> = Vec::new();
    for &(res, atom) in traced {
        let continues = segments.last().and_then(|s| s.last()).is_some_and(
            |&(prev_res, _)| {
                res == prev_res + 1
                    && (structure.residues[res].seq
                        - structure.residues[prev_res].seq)
                        .abs()
                        <= 1
            },
        );
        if continues {
            if let Some(last) = segments.last_mut() {
                last.push((res, atom));
            }
        } else {
            segments.push(vec![(res, atom)]);
        }
    }
    segments
}

/// Classify a contiguous Cα trace by local distance patterns.
///
/// Helix: Cα(i)-Cα(i+3) ≈ 4.5-6.0 Å and Cα(i)-Cα(i+4) ≈ 5.0-7.0 Å.
/// Sheet: extended conformation, Cα(i)-Cα(i+1) ≈ 3.5-4.1 Å and
/// Cα(i)-Cα(i+2) ≈ 6.0-8.0 Å. Raw marks are then smoothed: helices keep
/// runs of ≥ 4 (extended to cover the final turn), sheets keep runs of
/// ≥ 3, everything else is coil.
fn ca_distance_kinds(ca: &[Vec3]) -> Vec<SsKind> {
    let n = ca.len();
    if n < 4 {
        return vec![SsKind::Coil; n];
    }

    let mut raw = vec![SsKind::Coil; n];
    for i in 0..n {
        if i + 4 < n {
            let d3 = ca[i].distance(ca[i + 3]);
            let d4 = ca[i].distance(ca[i + 4]);
            if (4.5..=6.0).contains(&d3) && (5.0..=7.0).contains(&d4) {
                raw[i] = SsKind::Helix;
            }
        }
        if i + 2 < n && raw[i] != SsKind::Helix {
            let d1 = ca[i].distance(ca[i + 1]);
            let d2 = ca[i].distance(ca[i + 2]);
            if (3.5..=4.1).contains(&d1) && (6.0..=8.0).contains(&d2) {
                raw[i] = SsKind::Sheet;
            }
        }
    }

    const MIN_HELIX: usize = 4;
    const MIN_SHEET: usize = 3;

    let mut smoothed = vec![SsKind::Coil; n];
    let mut i = 0;
    while i < n {
        let kind = raw[i];
        if kind == SsKind::Coil {
            i += 1;
            continue;
        }
        let start = i;
        while i < n && raw[i] == kind {
            i += 1;
        }
        let len = i - start;
        match kind {
            SsKind::Helix if len >= MIN_HELIX => {
                // The i → i+3/i+4 tests mark turn starts; extend to cover
                // the residues of the final turn.
                let end = (i + 3).min(n);
                for k in &mut smoothed[start..end] {
                    *k = SsKind::Helix;
                }
            }
            SsKind::Sheet if len >= MIN_SHEET => {
                for k in &mut smoothed[start..i] {
                    if *k == SsKind::Coil {
                        *k = SsKind::Sheet;
                    }
                }
            }
            _ => {}
        }
    }

    smoothed
}

/// Group consecutive residues of equal kind into runs and back-fill each
/// residue's run index.
fn build_runs(structure: &mut Structure, kinds: &[SsKind]) {
    structure.ss_runs.clear();
    for chain_idx in 0..structure.chains.len() {
        let residues = structure.chains[chain_idx].residues.clone();
        let mut i = 0;
        while i < residues.len() {
            let start = residues[i];
            let kind = kinds[start];
            let mut end = start + 1;
            i += 1;
            while i < residues.len()
                && residues[i] == end
                && kinds[residues[i]] == kind
            {
                end += 1;
                i += 1;
            }
            let run_idx = structure.ss_runs.len();
            structure.ss_runs.push(SecondaryStructureRun {
                chain: chain_idx,
                residues: start..end,
                kind,
            });
            for res in start..end {
                structure.residues[res].ss_run = Some(run_idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::load_structure;

    /// Ideal alpha-helix Cα coordinates: rise 1.5 Å, 100° per residue,
    /// radius 2.3 Å.
    fn helix_ca(n: usize) -> Vec<Vec3> {
        (0..n)
            .map(|i| {
                let t = i as f32 * 100.0f32.to_radians();
                Vec3::new(2.3 * t.cos(), 2.3 * t.sin(), 1.5 * i as f32)
            })
            .collect()
    }

    /// Extended strand: 3.8 Å per residue along x with a slight zigzag.
    fn strand_ca(n: usize) -> Vec<Vec3> {
        (0..n)
            .map(|i| {
                let y = if i % 2 == 0 { 0.0 } else { 0.5 };
                Vec3::new(3.8 * i as f32, y, 0.0)
            })
            .collect()
    }

    #[test]
    fn helix_trace_is_detected() {
        let kinds = ca_distance_kinds(&helix_ca(12));
        let helix_count =
            kinds.iter().filter(|&&k| k == SsKind::Helix).count();
        assert!(helix_count >= 8, "got {kinds:?}");
    }

    #[test]
    fn strand_trace_is_detected() {
        let kinds = ca_distance_kinds(&strand_ca(8));
        let sheet_count =
            kinds.iter().filter(|&&k| k == SsKind::Sheet).count();
        assert!(sheet_count >= 5, "got {kinds:?}");
    }

    #[test]
    fn short_trace_is_coil() {
        assert_eq!(ca_distance_kinds(&helix_ca(3)), vec![SsKind::Coil; 3]);
        assert!(ca_distance_kinds(&[]).is_empty());
    }

    fn ca_chain_pdb(positions: &[Vec3], header: &str) -> String {
        let mut out = String::from(header);
        for (i, p) in positions.iter().enumerate() {
            out.push_str(&format!(
                "ATOM  {:>5}  CA  ALA A{:>4}    {:8.3}{:8.3}{:8.3}  1.00  0.00           C\n",
                i + 1,
                i + 1,
                p.x,
                p.y,
                p.z
            ));
        }
        out.push_str("END\n");
        out
    }

    #[test]
    fn runs_partition_each_chain() {
        let mut positions = helix_ca(10);
        positions.extend(strand_ca(6).iter().map(|p| *p + Vec3::new(0.0, 20.0, 0.0)));
        let pdb = ca_chain_pdb(&positions, "");
        let result = load_structure(pdb.as_bytes(), None).unwrap();
        let s = result.structure();

        // Gap-free, non-overlapping cover of every residue.
        let mut covered = vec![0usize; s.residues.len()];
        for run in &s.ss_runs {
            for r in run.residues.clone() {
                covered[r] += 1;
            }
        }
        assert!(covered.iter().all(|&c| c == 1), "cover counts {covered:?}");

        // Residue back-references agree with the run table.
        for (i, residue) in s.residues.iter().enumerate() {
            let run = residue.ss_run.unwrap();
            assert!(s.ss_runs[run].residues.contains(&i));
        }
    }

    #[test]
    fn explicit_records_override_heuristic() {
        // A straight trace the heuristic calls coil, with a HELIX record
        // covering residues 2-5.
        let positions: Vec<Vec3> = (0..8)
            .map(|i| Vec3::new(3.8 * i as f32, 0.0, 50.0 * (i as f32).sin()))
            .collect();
        let header = "HELIX    1   1 ALA A    2  ALA A    5  1\n";
        let pdb = ca_chain_pdb(&positions, header);
        let result = load_structure(pdb.as_bytes(), None).unwrap();
        let s = result.structure();

        for (i, residue) in s.residues.iter().enumerate() {
            let kind = s.ss_kind_of(i);
            if (2..=5).contains(&residue.seq) {
                assert_eq!(kind, SsKind::Helix, "residue {}", residue.seq);
            }
        }
    }

    #[test]
    fn coil_fallback_leaves_uncovered_residues_coil() {
        use crate::build::{load_structure_with, BuilderOptions};

        let positions = helix_ca(12);
        let header = "HELIX    1   1 ALA A    1  ALA A    4  1\n";
        let pdb = ca_chain_pdb(&positions, header);

        let options = BuilderOptions {
            ss_fallback: SsFallback::Coil,
            ..BuilderOptions::default()
        };
        let result =
            load_structure_with(pdb.as_bytes(), None, &options).unwrap();
        let s = result.structure();

        for (i, residue) in s.residues.iter().enumerate() {
            let expected = if (1..=4).contains(&residue.seq) {
                SsKind::Helix
            } else {
                SsKind::Coil
            };
            assert_eq!(s.ss_kind_of(i), expected, "residue {}", residue.seq);
        }
    }

    #[test]
    fn hinted_residue_without_backbone_stays_coil() {
        // Residue 2 has no CA atom; the HELIX record covers 1-3.
        let pdb = "\
HELIX    1   1 ALA A    1  ALA A    3  1
ATOM      1  CA  ALA A   1       0.000   0.000   0.000  1.00  0.00           C
ATOM      2  N   ALA A   2       3.800   0.000   0.000  1.00  0.00           N
ATOM      3  CA  ALA A   3       7.600   0.000   0.000  1.00  0.00           C
END
";
        let result = load_structure(pdb.as_bytes(), None).unwrap();
        let s = result.structure();
        assert_eq!(s.ss_kind_of(1), SsKind::Coil);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::IncompleteBackbone));
        // The coil residue breaks the helix into separate runs.
        assert!(s.ss_runs.len() >= 3);
    }
}
