//! Ball-and-stick and spacefill builders.
//!
//! Spheres are tessellated once per LOD setting and emitted per selected
//! atom; bond cylinders split at the midpoint so each half carries its
//! atom's color. Spacefill reuses the sphere path at van-der-Waals radii
//! with no bonds.

use rustc_hash::FxHashSet;

use super::{color, lod_params, primitives, GeometryBuffer};
use crate::model::Structure;

/// Stick sphere radius as a fraction of the covalent radius.
const BALL_RADIUS_FRACTION: f32 = 0.35;
const STICK_RADIUS: f32 = 0.12;

pub(super) fn build(
    structure: &Structure,
    atoms: &[usize],
    options: &super::RepresentationOptions,
    with_bonds: bool,
) -> GeometryBuffer {
    let lod = lod_params(options.lod_level);
    let mut buffer = GeometryBuffer::with_lod(options.lod_level);

    for &i in atoms {
        let atom = &structure.atoms[i];
        let radius = if with_bonds {
            atom.element.covalent_radius() * BALL_RADIUS_FRACTION
        } else {
            atom.element.vdw_radius()
        } * options.radius_scale;
        primitives::add_sphere(
            &mut buffer,
            atom.position,
            radius,
            color::atom_color(structure, i, options.colorer),
            lod.sphere_stacks,
            lod.sphere_slices,
        );
    }

    if with_bonds {
        let selected: FxHashSet<usize> = atoms.iter().copied().collect();
        // Structure bond order is deterministic, so iterating the arena
        // keeps the output stable.
        for bond in &structure.bonds {
            let (a, b) = bond.atoms;
            if !selected.contains(&a) || !selected.contains(&b) {
                continue;
            }
            let pa = structure.atoms[a].position;
            let pb = structure.atoms[b].position;
            let mid = (pa + pb) * 0.5;
            let radius = STICK_RADIUS * options.radius_scale;
            primitives::add_cylinder(
                &mut buffer,
                pa,
                mid,
                radius,
                color::atom_color(structure, a, options.colorer),
                lod.cylinder_segments,
            );
            primitives::add_cylinder(
                &mut buffer,
                mid,
                pb,
                radius,
                color::atom_color(structure, b, options.colorer),
                lod.cylinder_segments,
            );
        }
    }

    buffer
}
