//! Sphere and cylinder tessellation shared by the instanced-style modes.

use glam::Vec3;

use super::GeometryBuffer;

/// Append a UV sphere. Normals point radially out, so positions double as
/// normal directions.
pub(super) fn add_sphere(
    buffer: &mut GeometryBuffer,
    center: Vec3,
    radius: f32,
    color: [f32; 3],
    stacks: usize,
    slices: usize,
) {
    let base = buffer.positions.len() as u32;

    for stack in 0..=stacks {
        let phi = std::f32::consts::PI * stack as f32 / stacks as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for slice in 0..slices {
            let theta =
                std::f32::consts::TAU * slice as f32 / slices as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            let dir = Vec3::new(
                sin_phi * cos_theta,
                cos_phi,
                sin_phi * sin_theta,
            );
            let _ = buffer.push_vertex(center + dir * radius, dir, color);
        }
    }

    for stack in 0..stacks {
        let ring_a = base + (stack * slices) as u32;
        let ring_b = base + ((stack + 1) * slices) as u32;
        for slice in 0..slices {
            let next = ((slice + 1) % slices) as u32;
            let v0 = ring_a + slice as u32;
            let v1 = ring_a + next;
            let v2 = ring_b + slice as u32;
            let v3 = ring_b + next;
            // Degenerate at the poles but harmless: those triangles have
            // zero area and consistent winding.
            buffer.push_triangle(v0, v2, v1);
            buffer.push_triangle(v1, v2, v3);
        }
    }
}

/// Append an open cylinder from `a` to `b` with radial side normals.
pub(super) fn add_cylinder(
    buffer: &mut GeometryBuffer,
    a: Vec3,
    b: Vec3,
    radius: f32,
    color: [f32; 3],
    segments: usize,
) {
    let axis = b - a;
    if axis.length_squared() < 1e-12 {
        return;
    }
    let axis = axis.normalize();
    let (u, v) = orthonormal_basis(axis);

    let base = buffer.positions.len() as u32;
    for end in [a, b] {
        for k in 0..segments {
            let angle = std::f32::consts::TAU * k as f32 / segments as f32;
            let (sin_a, cos_a) = angle.sin_cos();
            let normal = u * cos_a + v * sin_a;
            let _ = buffer.push_vertex(end + normal * radius, normal, color);
        }
    }

    let ring_b = base + segments as u32;
    for k in 0..segments {
        let next = ((k + 1) % segments) as u32;
        let v0 = base + k as u32;
        let v1 = base + next;
        let v2 = ring_b + k as u32;
        let v3 = ring_b + next;
        buffer.push_triangle(v0, v2, v1);
        buffer.push_triangle(v1, v2, v3);
    }
}

/// Deterministic orthonormal basis perpendicular to `axis`.
pub(super) fn orthonormal_basis(axis: Vec3) -> (Vec3, Vec3) {
    let arbitrary = if axis.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let u = axis.cross(arbitrary).normalize();
    let v = axis.cross(u).normalize();
    (u, v)
}
