//! Molecular surface builder.
//!
//! Splats a Gaussian density per selected atom onto a uniform lattice
//! sized by the LOD level, then extracts the isosurface by tetrahedral
//! decomposition of each lattice cell (six tetrahedra per cell, no case
//! tables). Normals come from the central-difference gradient of the
//! field. The build is the one long-running path in the crate, so it
//! checks the cancellation token at fixed work-unit boundaries (atom
//! batches while splatting, z-slabs while extracting) and returns
//! [`Error::Cancelled`] without touching any shared state.

use glam::Vec3;

use super::{color, lod_params, GeometryBuffer, RepresentationOptions};
use crate::error::Error;
use crate::events::{Warning, WarningKind};
use crate::model::Structure;
use crate::scene::CancelToken;
use crate::spatial::SpatialGrid;

/// Density falloff steepness; the isolevel sits where a lone atom's
/// field crosses its scaled van-der-Waals radius.
const FALLOFF: f32 = 2.0;
/// Lattice padding beyond the selection bounds, in multiples of the
/// largest atom radius.
const PADDING_RADII: f32 = 2.0;
/// Splat cutoff per atom, in multiples of its radius.
const CUTOFF_RADII: f32 = 2.5;

pub(super) fn build(
    structure: &Structure,
    atoms: &[usize],
    options: &RepresentationOptions,
    cancel: &CancelToken,
    warnings: &mut Vec<Warning>,
) -> Result<GeometryBuffer, Error> {
    let mut buffer = GeometryBuffer::with_lod(options.lod_level);
    if atoms.is_empty() {
        warnings.push(Warning::new(
            WarningKind::DegradedRepresentation,
            "surface requested over an empty selection, emitting empty \
             geometry"
                .to_owned(),
        ));
        return Ok(buffer);
    }

    let field = DensityField::splat(structure, atoms, options, cancel)?;
    let isolevel = (-FALLOFF).exp();
    field.extract(isolevel, cancel, &mut buffer)?;

    // Atom colors blended by proximity would need another pass; the
    // nearest selected atom decides instead, which is deterministic and
    // sharp at element boundaries.
    let positions: Vec<Vec3> = atoms
        .iter()
        .map(|&i| structure.atoms[i].position)
        .collect();
    let grid = SpatialGrid::build(&positions, 4.0);
    for (vertex, slot) in
        buffer.positions.iter().zip(buffer.colors.iter_mut())
    {
        if let Some(&local) = grid.nearest(Vec3::from(*vertex), 1).first() {
            *slot =
                color::atom_color(structure, atoms[local], options.colorer);
        }
    }

    Ok(buffer)
}

struct DensityField {
    values: Vec<f32>,
    dims: [usize; 3],
    origin: Vec3,
    spacing: f32,
}

impl DensityField {
    fn splat(
        structure: &Structure,
        atoms: &[usize],
        options: &RepresentationOptions,
        cancel: &CancelToken,
    ) -> Result<Self, Error> {
        let radius_of = |atom: usize| {
            structure.atoms[atom].element.vdw_radius() * options.radius_scale
        };
        let max_radius = atoms
            .iter()
            .map(|&i| radius_of(i))
            .fold(0.0f32, f32::max);

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for &i in atoms {
            let p = structure.atoms[i].position;
            min = min.min(p);
            max = max.max(p);
        }
        let pad = max_radius * PADDING_RADII;
        let min = min - Vec3::splat(pad);
        let max = max + Vec3::splat(pad);

        let extent = max - min;
        let longest = extent.max_element().max(1e-3);
        let cells = lod_params(options.lod_level).surface_cells;
        let spacing = longest / cells as f32;
        let dims = [
            (extent.x / spacing).ceil() as usize + 2,
            (extent.y / spacing).ceil() as usize + 2,
            (extent.z / spacing).ceil() as usize + 2,
        ];

        let mut field = Self {
            values: vec![0.0; dims[0] * dims[1] * dims[2]],
            dims,
            origin: min,
            spacing,
        };

        for (span, &atom) in atoms.iter().enumerate() {
            // One token check per atom batch keeps overhead negligible.
            if span % 64 == 0 && cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let center = structure.atoms[atom].position;
            let radius = radius_of(atom);
            let cutoff = radius * CUTOFF_RADII;
            let inv_r2 = 1.0 / (radius * radius);

            let lo = field.node_below(center - Vec3::splat(cutoff));
            let hi = field.node_above(center + Vec3::splat(cutoff));
            for z in lo[2]..=hi[2] {
                for y in lo[1]..=hi[1] {
                    for x in lo[0]..=hi[0] {
                        let p = field.node_position(x, y, z);
                        let d2 = p.distance_squared(center);
                        if d2 <= cutoff * cutoff {
                            let node = field.index(x, y, z);
                            field.values[node] +=
                                (-FALLOFF * d2 * inv_r2).exp();
                        }
                    }
                }
            }
        }

        Ok(field)
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.dims[1] + y) * self.dims[0] + x
    }

    fn node_position(&self, x: usize, y: usize, z: usize) -> Vec3 {
        self.origin
            + Vec3::new(x as f32, y as f32, z as f32) * self.spacing
    }

    fn node_below(&self, p: Vec3) -> [usize; 3] {
        let local = (p - self.origin) / self.spacing;
        [
            (local.x.floor().max(0.0) as usize).min(self.dims[0] - 1),
            (local.y.floor().max(0.0) as usize).min(self.dims[1] - 1),
            (local.z.floor().max(0.0) as usize).min(self.dims[2] - 1),
        ]
    }

    fn node_above(&self, p: Vec3) -> [usize; 3] {
        let local = (p - self.origin) / self.spacing;
        [
            (local.x.ceil().max(0.0) as usize).min(self.dims[0] - 1),
            (local.y.ceil().max(0.0) as usize).min(self.dims[1] - 1),
            (local.z.ceil().max(0.0) as usize).min(self.dims[2] - 1),
        ]
    }

    fn value(&self, x: usize, y: usize, z: usize) -> f32 {
        self.values[self.index(x, y, z)]
    }

    /// Field gradient by central differences, clamped at the lattice
    /// border. Negated so normals point out of the surface.
    fn normal_at(&self, p: Vec3) -> Vec3 {
        let h = self.spacing;
        let sample = |q: Vec3| -> f32 {
            let local = (q - self.origin) / self.spacing;
            let x = (local.x.round().max(0.0) as usize)
                .min(self.dims[0] - 1);
            let y = (local.y.round().max(0.0) as usize)
                .min(self.dims[1] - 1);
            let z = (local.z.round().max(0.0) as usize)
                .min(self.dims[2] - 1);
            self.value(x, y, z)
        };
        let gradient = Vec3::new(
            sample(p + Vec3::X * h) - sample(p - Vec3::X * h),
            sample(p + Vec3::Y * h) - sample(p - Vec3::Y * h),
            sample(p + Vec3::Z * h) - sample(p - Vec3::Z * h),
        );
        (-gradient).normalize_or(Vec3::Y)
    }

    fn extract(
        &self,
        isolevel: f32,
        cancel: &CancelToken,
        buffer: &mut GeometryBuffer,
    ) -> Result<(), Error> {
        // Each cube corner: (dx, dy, dz). Six tetrahedra share the main
        // diagonal 0-6, covering the cube exactly.
        const CORNERS: [(usize, usize, usize); 8] = [
            (0, 0, 0),
            (1, 0, 0),
            (1, 1, 0),
            (0, 1, 0),
            (0, 0, 1),
            (1, 0, 1),
            (1, 1, 1),
            (0, 1, 1),
        ];
        const TETRA: [[usize; 4]; 6] = [
            [0, 5, 1, 6],
            [0, 1, 2, 6],
            [0, 2, 3, 6],
            [0, 3, 7, 6],
            [0, 7, 4, 6],
            [0, 4, 5, 6],
        ];

        for z in 0..self.dims[2] - 1 {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            for y in 0..self.dims[1] - 1 {
                for x in 0..self.dims[0] - 1 {
                    let corner_values: Vec<f32> = CORNERS
                        .iter()
                        .map(|&(dx, dy, dz)| {
                            self.value(x + dx, y + dy, z + dz)
                        })
                        .collect();
                    if corner_values.iter().all(|&v| v < isolevel)
                        || corner_values.iter().all(|&v| v >= isolevel)
                    {
                        continue;
                    }
                    let corner_positions: Vec<Vec3> = CORNERS
                        .iter()
                        .map(|&(dx, dy, dz)| {
                            self.node_position(x + dx, y + dy, z + dz)
                        })
                        .collect();
                    for tet in &TETRA {
                        self.polygonize_tetrahedron(
                            tet,
                            &corner_positions,
                            &corner_values,
                            isolevel,
                            buffer,
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn polygonize_tetrahedron(
        &self,
        tet: &[usize; 4],
        positions: &[Vec3],
        values: &[f32],
        isolevel: f32,
        buffer: &mut GeometryBuffer,
    ) {
        let inside: Vec<usize> = tet
            .iter()
            .copied()
            .filter(|&c| values[c] >= isolevel)
            .collect();
        let outside: Vec<usize> = tet
            .iter()
            .copied()
            .filter(|&c| values[c] < isolevel)
            .collect();

        let cross = |a: usize, b: usize| -> Vec3 {
            let t = (isolevel - values[a]) / (values[b] - values[a]);
            positions[a].lerp(positions[b], t.clamp(0.0, 1.0))
        };

        match inside.len() {
            1 => {
                let a = inside[0];
                let p0 = cross(a, outside[0]);
                let p1 = cross(a, outside[1]);
                let p2 = cross(a, outside[2]);
                self.emit_triangle(p0, p1, p2, buffer);
            }
            3 => {
                let a = outside[0];
                let p0 = cross(inside[0], a);
                let p1 = cross(inside[1], a);
                let p2 = cross(inside[2], a);
                self.emit_triangle(p0, p2, p1, buffer);
            }
            2 => {
                // Quad between the two crossing pairs, split into two
                // triangles.
                let p0 = cross(inside[0], outside[0]);
                let p1 = cross(inside[0], outside[1]);
                let p2 = cross(inside[1], outside[1]);
                let p3 = cross(inside[1], outside[0]);
                self.emit_triangle(p0, p1, p2, buffer);
                self.emit_triangle(p0, p2, p3, buffer);
            }
            _ => {}
        }
    }

    fn emit_triangle(
        &self,
        p0: Vec3,
        p1: Vec3,
        p2: Vec3,
        buffer: &mut GeometryBuffer,
    ) {
        // Skip slivers produced when a crossing lands on a shared corner.
        if (p1 - p0).cross(p2 - p0).length_squared() < 1e-12 {
            return;
        }
        let placeholder = [0.0, 0.0, 0.0];
        let i0 = buffer.push_vertex(p0, self.normal_at(p0), placeholder);
        let i1 = buffer.push_vertex(p1, self.normal_at(p1), placeholder);
        let i2 = buffer.push_vertex(p2, self.normal_at(p2), placeholder);
        buffer.push_triangle(i0, i1, i2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::load_structure;
    use crate::geometry::{build_geometry, Mode};

    const LONE_XYZ: &str = "\
1
lone atom
C   0.000  0.000  0.000
";

    const WATER_XYZ: &str = "\
3
water
O   0.000   0.000   0.000
H   0.757   0.586   0.000
H  -0.757   0.586   0.000
";

    fn surface_options(lod_level: u32) -> RepresentationOptions {
        RepresentationOptions {
            mode: Mode::Surface,
            lod_level,
            ..RepresentationOptions::default()
        }
    }

    #[test]
    fn lone_atom_surface_wraps_the_radius() {
        let result = load_structure(LONE_XYZ.as_bytes(), None).unwrap();
        let s = result.structure();
        let (buffer, warnings) = build_geometry(
            s,
            &[0],
            &surface_options(2),
            &CancelToken::new(),
        )
        .unwrap();

        assert!(warnings.is_empty());
        assert!(!buffer.is_empty());
        // The isolevel for one atom sits at its scaled vdW radius; allow
        // lattice-resolution slack.
        let radius = s.atoms[0].element.vdw_radius();
        for p in &buffer.positions {
            let d = Vec3::from(*p).length();
            assert!(
                (d - radius).abs() < radius * 0.35,
                "vertex at distance {d}, radius {radius}"
            );
        }
        // Normals point away from the atom center.
        for (p, n) in buffer.positions.iter().zip(&buffer.normals) {
            assert!(Vec3::from(*p).dot(Vec3::from(*n)) > 0.0);
        }
    }

    #[test]
    fn molecule_surface_is_watertight_enough_to_bound_atoms() {
        let result = load_structure(WATER_XYZ.as_bytes(), None).unwrap();
        let s = result.structure();
        let atoms: Vec<usize> = (0..s.atoms.len()).collect();
        let (buffer, _) = build_geometry(
            s,
            &atoms,
            &surface_options(1),
            &CancelToken::new(),
        )
        .unwrap();

        assert!(!buffer.is_empty());
        let bounds = buffer.bounds;
        for atom in &s.atoms {
            let p = atom.position;
            assert!(p.x > bounds.min.x && p.x < bounds.max.x);
            assert!(p.y > bounds.min.y && p.y < bounds.max.y);
            assert!(p.z > bounds.min.z && p.z < bounds.max.z);
        }
    }

    #[test]
    fn cancelled_token_aborts_with_cancelled() {
        let result = load_structure(WATER_XYZ.as_bytes(), None).unwrap();
        let s = result.structure();
        let atoms: Vec<usize> = (0..s.atoms.len()).collect();
        let token = CancelToken::new();
        token.cancel();
        let outcome =
            build_geometry(s, &atoms, &surface_options(2), &token);
        assert!(matches!(outcome, Err(Error::Cancelled)));
    }

    #[test]
    fn empty_selection_degrades_with_warning() {
        let result = load_structure(WATER_XYZ.as_bytes(), None).unwrap();
        let s = result.structure();
        let (buffer, warnings) = build_geometry(
            s,
            &[],
            &surface_options(1),
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
    fn surface_is_deterministic() {
        let result = load_structure(WATER_XYZ.as_bytes(), None).unwrap();
        let s = result.structure();
        let atoms: Vec<usize> = (0..s.atoms.len()).collect();
        let token = CancelToken::new();
        let (a, _) =
            build_geometry(s, &atoms, &surface_options(1), &token).unwrap();
        let (b, _) =
            build_geometry(s, &atoms, &surface_options(1), &token).unwrap();
        assert_eq!(a.position_bytes(), b.position_bytes());
        assert_eq!(a.normal_bytes(), b.normal_bytes());
        assert_eq!(a.index_bytes(), b.index_bytes());
    }
}
