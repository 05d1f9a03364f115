//! Scene assembly: evaluating and building representations in parallel.
//!
//! A scene is an ordered list of representations over one immutable
//! [`Structure`]. Builds run on the rayon pool, each reading the shared
//! structure and writing only its own buffer, so independent
//! representations parallelize without any shared mutable state. One
//! representation failing (bad selection syntax, cancellation) never
//! poisons the others; each carries its own outcome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use crate::error::Error;
use crate::events::Warning;
use crate::geometry::{build_geometry, GeometryBuffer, RepresentationOptions};
use crate::model::Structure;
use crate::select::Selection;

/// Cooperative cancellation flag, cheap to clone across workers.
///
/// Long-running builders poll it at fixed work-unit boundaries and bail
/// out with [`Error::Cancelled`], releasing partial buffers cleanly.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// A fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of every build holding a clone.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// True once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// One styled view over the structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Representation {
    /// Caller-assigned identifier, carried through to the output.
    pub id: String,
    /// Style configuration.
    pub options: RepresentationOptions,
}

impl Representation {
    /// Convenience constructor.
    #[must_use]
    pub fn new(id: impl Into<String>, options: RepresentationOptions) -> Self {
        Self {
            id: id.into(),
            options,
        }
    }
}

/// Outcome of building one representation.
#[derive(Debug)]
pub struct BuiltRepresentation {
    /// The representation's id, in input order.
    pub id: String,
    /// The built buffer, or why the build did not finish. Degraded
    /// styles succeed with an empty buffer plus warnings; only syntax
    /// errors, invalid options, and cancellation land here as `Err`.
    pub result: Result<GeometryBuffer, Error>,
    /// Selection and build warnings for this representation.
    pub warnings: Vec<Warning>,
}

/// Build every representation of a scene against one structure.
///
/// Output order matches input order regardless of worker scheduling.
#[must_use]
pub fn build_scene(
    structure: &Structure,
    representations: &[Representation],
    cancel: &CancelToken,
) -> Vec<BuiltRepresentation> {
    representations
        .par_iter()
        .map(|representation| {
            build_one(structure, representation, cancel)
        })
        .collect()
}

fn build_one(
    structure: &Structure,
    representation: &Representation,
    cancel: &CancelToken,
) -> BuiltRepresentation {
    let mut warnings = Vec::new();
    let result = Selection::parse(&representation.options.selection)
        .map(|selection| {
            let evaluated = selection.evaluate(structure);
            warnings.extend(evaluated.warnings);
            evaluated.atoms
        })
        .and_then(|atoms| {
            let (buffer, build_warnings) = build_geometry(
                structure,
                &atoms,
                &representation.options,
                cancel,
            )?;
            warnings.extend(build_warnings);
            Ok(buffer)
        });

    if matches!(result, Err(Error::Cancelled)) {
        warnings.push(Warning::info(
            crate::events::WarningKind::BuildCancelled,
            format!("representation {} build cancelled", representation.id),
        ));
    }

    BuiltRepresentation {
        id: representation.id.clone(),
        result,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::load_structure;
    use crate::events::WarningKind;
    use crate::geometry::Mode;

    const TRIPEPTIDE: &str = "\
ATOM      1  N   ALA A   1       0.000   0.000   0.000  1.00  0.00           N
ATOM      2  CA  ALA A   1       1.458   0.000   0.000  1.00  0.00           C
ATOM      3  C   ALA A   1       2.980   0.000   0.000  1.00  0.00           C
ATOM      4  N   GLY A   2       4.310   0.000   0.000  1.00  0.00           N
ATOM      5  CA  GLY A   2       5.768   0.000   0.000  1.00  0.00           C
ATOM      6  C   GLY A   2       7.290   0.000   0.000  1.00  0.00           C
ATOM      7  N   SER A   3       8.620   0.000   0.000  1.00  0.00           N
ATOM      8  CA  SER A   3      10.078   0.000   0.000  1.00  0.00           C
ATOM      9  C   SER A   3      11.600   0.000   0.000  1.00  0.00           C
END
";

    fn fixture() -> Structure {
        let result = load_structure(TRIPEPTIDE.as_bytes(), None).unwrap();
        result.structures.into_iter().next().unwrap_or_default()
    }

    fn rep(id: &str, mode: Mode, selection: &str) -> Representation {
        Representation::new(
            id,
            RepresentationOptions {
                mode,
                selection: selection.to_owned(),
                ..RepresentationOptions::default()
            },
        )
    }

    #[test]
    fn output_preserves_input_order() {
        let s = fixture();
        let reps = vec![
            rep("sticks", Mode::BallsAndSticks, "all"),
            rep("fill", Mode::Spheres, "resname ALA"),
            rep("ribbon", Mode::Cartoon, "protein"),
        ];
        let built = build_scene(&s, &reps, &CancelToken::new());
        let ids: Vec<&str> =
            built.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["sticks", "fill", "ribbon"]);
        for b in &built {
            assert!(b.result.as_ref().is_ok_and(|buf| !buf.is_empty()));
        }
    }

    #[test]
    fn bad_selection_fails_only_its_representation() {
        let s = fixture();
        let reps = vec![
            rep("good", Mode::BallsAndSticks, "all"),
            rep("bad", Mode::BallsAndSticks, "resname"),
        ];
        let built = build_scene(&s, &reps, &CancelToken::new());
        assert!(built[0].result.is_ok());
        assert!(matches!(
            built[1].result,
            Err(Error::SelectionSyntax(_))
        ));
    }

    #[test]
    fn degraded_style_succeeds_with_warning() {
        let s = fixture();
        let reps = vec![rep("ribbon", Mode::Cartoon, "name N")];
        let built = build_scene(&s, &reps, &CancelToken::new());
        let buffer = built[0].result.as_ref().unwrap();
        assert!(buffer.is_empty());
        assert!(built[0]
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::DegradedRepresentation));
    }

    #[test]
    fn selection_warnings_are_carried_through() {
        let s = fixture();
        let reps = vec![rep("ghost", Mode::Spheres, "chain Q")];
        let built = build_scene(&s, &reps, &CancelToken::new());
        assert!(built[0].result.as_ref().is_ok_and(GeometryBuffer::is_empty));
        assert!(built[0]
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::UnresolvedIdentifier));
    }

    #[test]
    fn cancelled_scene_reports_cancelled_per_representation() {
        let s = fixture();
        let token = CancelToken::new();
        token.cancel();
        let reps = vec![rep("surf", Mode::Surface, "all")];
        let built = build_scene(&s, &reps, &token);
        assert!(matches!(built[0].result, Err(Error::Cancelled)));
        assert!(built[0]
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::BuildCancelled));
    }

    #[test]
    fn parallel_builds_match_serial_builds() {
        let s = fixture();
        let reps: Vec<Representation> = (0..4)
            .map(|i| rep(&format!("r{i}"), Mode::BallsAndSticks, "all"))
            .collect();
        let token = CancelToken::new();
        let parallel = build_scene(&s, &reps, &token);
        for built in &parallel {
            let lone = build_one(&s, &reps[0], &token);
            let a = built.result.as_ref().unwrap();
            let b = lone.result.as_ref().unwrap();
            assert_eq!(a.position_bytes(), b.position_bytes());
            assert_eq!(a.index_bytes(), b.index_bytes());
        }
    }
}
