//! Cartoon/ribbon builder.
//!
//! Runs a Catmull-Rom curve through each chain's selected backbone trace,
//! carries a rotation-minimizing frame along it, and extrudes a
//! cross-section whose shape follows the residue's secondary structure:
//! flat ribbon for sheet (with an arrow head at the strand's last
//! residue), wide oval for helix, thin tube for coil and turn. Profiles
//! interpolate between residues so the surface never jumps at a
//! secondary-structure boundary.

use glam::Vec3;
use rustc_hash::FxHashSet;

use super::spline::{catmull_rom, frames_along, CurveFrame};
use super::{color, lod_params, GeometryBuffer, RepresentationOptions};
use crate::events::{Warning, WarningKind};
use crate::model::{SsKind, Structure};

const HELIX_PROFILE: (f32, f32, f32) = (1.5, 0.5, 1.0);
const SHEET_PROFILE: (f32, f32, f32) = (1.6, 0.35, 0.0);
const COIL_PROFILE: (f32, f32, f32) = (0.35, 0.35, 1.0);

/// Arrow-head width multiplier at the strand's terminal residue start.
const ARROW_FLARE: f32 = 1.6;
/// Arrow tip width as a fraction of the sheet width.
const ARROW_TIP: f32 = 0.1;

/// Cross-section parameters at one curve sample.
#[derive(Debug, Clone, Copy)]
struct Profile {
    width: f32,
    thickness: f32,
    /// 0 = rectangular, 1 = elliptical.
    roundness: f32,
    color: [f32; 3],
}

impl Profile {
    fn lerp(self, other: Self, t: f32) -> Self {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Self {
            width: mix(self.width, other.width),
            thickness: mix(self.thickness, other.thickness),
            roundness: mix(self.roundness, other.roundness),
            color: [
                mix(self.color[0], other.color[0]),
                mix(self.color[1], other.color[1]),
                mix(self.color[2], other.color[2]),
            ],
        }
    }
}

pub(super) fn build(
    structure: &Structure,
    atoms: &[usize],
    options: &RepresentationOptions,
    warnings: &mut Vec<Warning>,
) -> GeometryBuffer {
    let selected: FxHashSet<usize> = atoms.iter().copied().collect();
    let lod = lod_params(options.lod_level);
    let mut buffer = GeometryBuffer::with_lod(options.lod_level);

    for chain in &structure.chains {
        let traced: Vec<(usize, Vec3)> = chain
            .trace
            .iter()
            .filter(|&&atom| selected.contains(&atom))
            .map(|&atom| {
                (structure.atoms[atom].residue, structure.atoms[atom].position)
            })
            .collect();

        for segment in split_consecutive(&traced) {
            if segment.len() < 2 {
                continue;
            }
            extrude_segment(
                structure,
                segment,
                options,
                lod.spline_segments,
                lod.cross_section_verts,
                &mut buffer,
            );
        }
    }

    if buffer.is_empty() {
        warnings.push(Warning::new(
            WarningKind::DegradedRepresentation,
            "cartoon requested over a selection with no usable backbone \
             trace, emitting empty geometry"
                .to_owned(),
        ));
    }
    buffer
}

/// Split traced residues into runs of consecutive residue indices; a
/// missing residue breaks the curve rather than bridging the gap.
fn split_consecutive(traced: &[(usize, Vec3)]) -> Vec<&[(usize, Vec3)]> {
    let mut segments = Vec::new();
    let mut start = 0;
    for i in 1..=traced.len() {
        let breaks = i == traced.len() || traced[i].0 != traced[i - 1].0 + 1;
        if breaks {
            segments.push(&traced[start..i]);
            start = i;
        }
    }
    segments
}

fn extrude_segment(
    structure: &Structure,
    segment: &[(usize, Vec3)],
    options: &RepresentationOptions,
    spline_segments: usize,
    csv: usize,
    buffer: &mut GeometryBuffer,
) {
    let controls: Vec<Vec3> = segment.iter().map(|&(_, p)| p).collect();
    let samples = catmull_rom(&controls, spline_segments);
    let frames = frames_along(&samples);
    if frames.len() < 2 {
        return;
    }

    let profiles = residue_profiles(structure, segment, options);
    let arrows: Vec<bool> = segment
        .iter()
        .enumerate()
        .map(|(i, &(res, _))| {
            structure.ss_kind_of(res) == SsKind::Sheet
                && segment
                    .get(i + 1)
                    .is_none_or(|&(next, _)| {
                        structure.ss_kind_of(next) != SsKind::Sheet
                    })
        })
        .collect();

    let n_res = segment.len();
    let total = frames.len();
    let sample_profiles: Vec<Profile> = (0..total)
        .map(|i| {
            let frac = i as f32 / (total - 1) as f32;
            let rf = frac * (n_res - 1) as f32;
            let r0 = (rf.floor() as usize).min(n_res - 1);
            let r1 = (r0 + 1).min(n_res - 1);
            let t = rf - r0 as f32;
            let mut profile = profiles[r0].lerp(profiles[r1], t);
            if arrows[r0] {
                // Flare then taper across the terminal strand residue.
                profile.width = profiles[r0].width
                    * (ARROW_FLARE + (ARROW_TIP - ARROW_FLARE) * t);
                profile.thickness = profiles[r0].thickness;
                profile.roundness = 0.0;
            }
            profile
        })
        .collect();

    let base = buffer.positions.len() as u32;
    for (frame, profile) in frames.iter().zip(&sample_profiles) {
        extrude_ring(frame, profile, csv, buffer);
    }

    for i in 0..total - 1 {
        let ring_a = base + (i * csv) as u32;
        let ring_b = base + ((i + 1) * csv) as u32;
        for k in 0..csv {
            let next = ((k + 1) % csv) as u32;
            let v0 = ring_a + k as u32;
            let v1 = ring_a + next;
            let v2 = ring_b + k as u32;
            let v3 = ring_b + next;
            buffer.push_triangle(v0, v2, v1);
            buffer.push_triangle(v1, v2, v3);
        }
    }

    let last = total - 1;
    emit_cap(&frames[0], &sample_profiles[0], csv, false, buffer);
    emit_cap(&frames[last], &sample_profiles[last], csv, true, buffer);
}

fn residue_profiles(
    structure: &Structure,
    segment: &[(usize, Vec3)],
    options: &RepresentationOptions,
) -> Vec<Profile> {
    segment
        .iter()
        .map(|&(res, _)| {
            let (width, thickness, roundness) =
                match structure.ss_kind_of(res) {
                    SsKind::Helix => HELIX_PROFILE,
                    SsKind::Sheet => SHEET_PROFILE,
                    SsKind::Coil | SsKind::Turn => COIL_PROFILE,
                };
            Profile {
                width: width * options.radius_scale,
                thickness: thickness * options.radius_scale,
                roundness,
                color: color::residue_color(structure, res, options.colorer),
            }
        })
        .collect()
}

/// Offset of ring vertex `k` in the frame's cross-section plane, blending
/// between a rectangle and an ellipse by roundness.
fn ring_offset(frame: &CurveFrame, profile: &Profile, csv: usize, k: usize) -> (Vec3, Vec3) {
    let angle = std::f32::consts::TAU * k as f32 / csv as f32;
    let (sin_a, cos_a) = angle.sin_cos();
    let hw = profile.width * 0.5;
    let ht = profile.thickness * 0.5;

    let rect_x = cos_a.signum() * hw;
    let rect_y = sin_a.signum() * ht;
    let x = rect_x + (cos_a * hw - rect_x) * profile.roundness;
    let y = rect_y + (sin_a * ht - rect_y) * profile.roundness;

    let offset = frame.binormal * x + frame.normal * y;
    let normal = if profile.roundness > 0.5 {
        offset.normalize_or_zero()
    } else if sin_a.abs() > cos_a.abs() {
        frame.normal * sin_a.signum()
    } else {
        frame.binormal * cos_a.signum()
    };
    (offset, normal)
}

fn extrude_ring(
    frame: &CurveFrame,
    profile: &Profile,
    csv: usize,
    buffer: &mut GeometryBuffer,
) {
    for k in 0..csv {
        let (offset, normal) = ring_offset(frame, profile, csv, k);
        let _ =
            buffer.push_vertex(frame.position + offset, normal, profile.color);
    }
}

fn emit_cap(
    frame: &CurveFrame,
    profile: &Profile,
    csv: usize,
    forward: bool,
    buffer: &mut GeometryBuffer,
) {
    let cap_normal = if forward { frame.tangent } else { -frame.tangent };
    let center =
        buffer.push_vertex(frame.position, cap_normal, profile.color);
    let edge = buffer.positions.len() as u32;
    for k in 0..csv {
        let (offset, _) = ring_offset(frame, profile, csv, k);
        let _ = buffer.push_vertex(
            frame.position + offset,
            cap_normal,
            profile.color,
        );
    }
    for k in 0..csv {
        let next = ((k + 1) % csv) as u32;
        if forward {
            buffer.push_triangle(center, edge + k as u32, edge + next);
        } else {
            buffer.push_triangle(center, edge + next, edge + k as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::load_structure;
    use crate::geometry::{build_geometry, Colorer, Mode};
    use crate::scene::CancelToken;

    fn ca_helix_pdb(n: usize) -> String {
        let mut out = String::new();
        for i in 0..n {
            let t = i as f32 * 100.0f32.to_radians();
            out.push_str(&format!(
                "ATOM  {:>5}  CA  ALA A{:>4}    {:8.3}{:8.3}{:8.3}  1.00  0.00           C\n",
                i + 1,
                i + 1,
                2.3 * t.cos(),
                2.3 * t.sin(),
                1.5 * i as f32
            ));
        }
        out.push_str("END\n");
        out
    }

    fn cartoon_options(lod_level: u32) -> RepresentationOptions {
        RepresentationOptions {
            mode: Mode::Cartoon,
            colorer: Colorer::BySecondaryStructure,
            lod_level,
            ..RepresentationOptions::default()
        }
    }

    #[test]
    fn helix_chain_produces_a_closed_mesh() {
        let pdb = ca_helix_pdb(10);
        let result = load_structure(pdb.as_bytes(), None).unwrap();
        let s = result.structure();
        let atoms: Vec<usize> = (0..s.atoms.len()).collect();
        let (buffer, warnings) = build_geometry(
            s,
            &atoms,
            &cartoon_options(2),
            &CancelToken::new(),
        )
        .unwrap();

        assert!(warnings.is_empty());
        let lod = lod_params(2);
        let frames = 9 * lod.spline_segments + 1;
        let ring_verts = frames * lod.cross_section_verts;
        let cap_verts = 2 * (lod.cross_section_verts + 1);
        assert_eq!(buffer.vertex_count(), ring_verts + cap_verts);
        assert_eq!(buffer.indices.len() % 3, 0);
        // Every index points at a real vertex.
        let max = buffer.indices.iter().max().copied().unwrap_or(0);
        assert!((max as usize) < buffer.vertex_count());
    }

    #[test]
    fn no_backbone_selection_degrades_with_one_warning() {
        let pdb = "\
HETATM    1  O   HOH W   1       0.000   0.000   0.000  1.00  0.00           O
HETATM    2  O   HOH W   2       5.000   0.000   0.000  1.00  0.00           O
END
";
        let result = load_structure(pdb.as_bytes(), None).unwrap();
        let s = result.structure();
        let atoms: Vec<usize> = (0..s.atoms.len()).collect();
        let (buffer, warnings) = build_geometry(
            s,
            &atoms,
            &cartoon_options(2),
            &CancelToken::new(),
        )
        .unwrap();

        assert!(buffer.is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].kind,
            WarningKind::DegradedRepresentation
        );
    }

    #[test]
    fn selection_gap_splits_the_ribbon() {
        let pdb = ca_helix_pdb(9);
        let result = load_structure(pdb.as_bytes(), None).unwrap();
        let s = result.structure();

        // Drop the middle residue's CA from the selection.
        let atoms: Vec<usize> =
            (0..s.atoms.len()).filter(|&i| i != 4).collect();
        let (buffer, _) = build_geometry(
            s,
            &atoms,
            &cartoon_options(1),
            &CancelToken::new(),
        )
        .unwrap();

        let lod = lod_params(1);
        // Two 4-residue segments instead of one 9-residue ribbon.
        let frames = 3 * lod.spline_segments + 1;
        let per_segment = frames * lod.cross_section_verts
            + 2 * (lod.cross_section_verts + 1);
        assert_eq!(buffer.vertex_count(), 2 * per_segment);
    }

    #[test]
    fn higher_lod_adds_vertices() {
        let pdb = ca_helix_pdb(8);
        let result = load_structure(pdb.as_bytes(), None).unwrap();
        let s = result.structure();
        let atoms: Vec<usize> = (0..s.atoms.len()).collect();
        let token = CancelToken::new();
        let (low, _) =
            build_geometry(s, &atoms, &cartoon_options(0), &token).unwrap();
        let (high, _) =
            build_geometry(s, &atoms, &cartoon_options(3), &token).unwrap();
        assert!(high.vertex_count() > low.vertex_count());
    }

    #[test]
    fn cartoon_output_is_deterministic() {
        let pdb = ca_helix_pdb(12);
        let result = load_structure(pdb.as_bytes(), None).unwrap();
        let s = result.structure();
        let atoms: Vec<usize> = (0..s.atoms.len()).collect();
        let token = CancelToken::new();
        let (a, _) =
            build_geometry(s, &atoms, &cartoon_options(2), &token).unwrap();
        let (b, _) =
            build_geometry(s, &atoms, &cartoon_options(2), &token).unwrap();
        assert_eq!(a.position_bytes(), b.position_bytes());
        assert_eq!(a.index_bytes(), b.index_bytes());
        assert_eq!(a.color_bytes(), b.color_bytes());
    }
}
