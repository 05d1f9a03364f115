//! Backbone curve math: interpolation and moving frames.
//!
//! Pure `Vec3` transforms with no knowledge of residues or buffers.

use glam::Vec3;

/// A sample along the backbone curve with its local frame.
#[derive(Debug, Clone, Copy)]
pub(super) struct CurveFrame {
    pub position: Vec3,
    pub tangent: Vec3,
    pub normal: Vec3,
    pub binormal: Vec3,
}

/// Catmull-Rom interpolation through all control points, `segments`
/// samples per span plus the final point. Endpoints are mirrored so the
/// curve reaches the first and last controls. Two controls degrade to a
/// straight line.
pub(super) fn catmull_rom(points: &[Vec3], segments: usize) -> Vec<Vec3> {
    let n = points.len();
    if n < 2 {
        return points.to_vec();
    }
    if n == 2 {
        return lerp_chain(points, segments);
    }

    let mut samples = Vec::with_capacity((n - 1) * segments + 1);
    for i in 0..n - 1 {
        let p0 = if i == 0 {
            points[0] * 2.0 - points[1]
        } else {
            points[i - 1]
        };
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = if i + 2 < n {
            points[i + 2]
        } else {
            points[n - 1] * 2.0 - points[n - 2]
        };

        for j in 0..segments {
            let t = j as f32 / segments as f32;
            let t2 = t * t;
            let t3 = t2 * t;
            samples.push(
                0.5 * (p1 * 2.0
                    + (p2 - p0) * t
                    + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
                    + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * t3),
            );
        }
    }
    samples.push(points[n - 1]);
    samples
}

fn lerp_chain(points: &[Vec3], segments: usize) -> Vec<Vec3> {
    let mut samples = Vec::with_capacity(segments + 1);
    for j in 0..segments {
        let t = j as f32 / segments as f32;
        samples.push(points[0].lerp(points[1], t));
    }
    samples.push(points[1]);
    samples
}

/// Build frames along curve samples: central-difference tangents, then
/// rotation-minimizing normals via the double-reflection method
/// (Wang et al. 2008) so the extruded ribbon never twists abruptly.
pub(super) fn frames_along(samples: &[Vec3]) -> Vec<CurveFrame> {
    let n = samples.len();
    if n < 2 {
        return Vec::new();
    }

    let tangent_at = |i: usize| -> Vec3 {
        let t = if i == 0 {
            samples[1] - samples[0]
        } else if i == n - 1 {
            samples[n - 1] - samples[n - 2]
        } else {
            samples[i + 1] - samples[i - 1]
        };
        t.normalize_or_zero()
    };

    let t0 = tangent_at(0);
    let reference = if t0.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let n0 = t0.cross(reference).normalize();

    let mut frames = Vec::with_capacity(n);
    frames.push(CurveFrame {
        position: samples[0],
        tangent: t0,
        normal: n0,
        binormal: t0.cross(n0).normalize(),
    });

    for i in 0..n - 1 {
        let prev = frames[i];
        let next_tangent = tangent_at(i + 1);

        let v1 = samples[i + 1] - samples[i];
        let c1 = v1.dot(v1);
        let normal = if c1 < 1e-10 {
            prev.normal
        } else {
            // Reflect the previous frame across the chord plane, then
            // across the tangent bisector.
            let reflected_normal =
                prev.normal - v1 * (2.0 / c1) * v1.dot(prev.normal);
            let reflected_tangent =
                prev.tangent - v1 * (2.0 / c1) * v1.dot(prev.tangent);
            let v2 = next_tangent - reflected_tangent;
            let c2 = v2.dot(v2);
            if c2 < 1e-10 {
                reflected_normal
            } else {
                reflected_normal - v2 * (2.0 / c2) * v2.dot(reflected_normal)
            }
        };

        // Re-orthonormalize against drift.
        let normal =
            (normal - next_tangent * next_tangent.dot(normal)).normalize();
        frames.push(CurveFrame {
            position: samples[i + 1],
            tangent: next_tangent,
            normal,
            binormal: next_tangent.cross(normal).normalize(),
        });
    }

    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_passes_through_controls() {
        let controls = vec![
            Vec3::ZERO,
            Vec3::new(1.0, 2.0, 0.0),
            Vec3::new(2.0, 0.0, 1.0),
            Vec3::new(3.0, 1.0, 0.0),
        ];
        let segments = 4;
        let samples = catmull_rom(&controls, segments);
        assert_eq!(samples.len(), (controls.len() - 1) * segments + 1);
        for (i, control) in controls.iter().enumerate() {
            let sample = samples[i * segments];
            assert!(sample.distance(*control) < 1e-5, "control {i}");
        }
    }

    #[test]
    fn two_controls_become_a_line() {
        let samples =
            catmull_rom(&[Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)], 4);
        assert_eq!(samples.len(), 5);
        assert!(samples[2].distance(Vec3::new(2.0, 0.0, 0.0)) < 1e-6);
    }

    #[test]
    fn single_control_is_returned_unchanged() {
        let samples = catmull_rom(&[Vec3::ONE], 8);
        assert_eq!(samples, vec![Vec3::ONE]);
    }

    #[test]
    fn frames_are_orthonormal() {
        let controls: Vec<Vec3> = (0..8)
            .map(|i| {
                let t = i as f32 * 0.8;
                Vec3::new(t.cos() * 2.0, t.sin() * 2.0, i as f32 * 0.5)
            })
            .collect();
        let samples = catmull_rom(&controls, 6);
        let frames = frames_along(&samples);
        assert_eq!(frames.len(), samples.len());
        for frame in &frames {
            assert!(frame.tangent.dot(frame.normal).abs() < 1e-4);
            assert!(frame.tangent.dot(frame.binormal).abs() < 1e-4);
            assert!(frame.normal.dot(frame.binormal).abs() < 1e-4);
            assert!((frame.normal.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn frames_rotate_minimally_between_samples() {
        // On a helix the RMF normal should never flip between neighbors.
        let controls: Vec<Vec3> = (0..16)
            .map(|i| {
                let t = i as f32 * 0.6;
                Vec3::new(t.cos(), t.sin(), i as f32 * 0.3)
            })
            .collect();
        let samples = catmull_rom(&controls, 4);
        let frames = frames_along(&samples);
        for pair in frames.windows(2) {
            assert!(
                pair[0].normal.dot(pair[1].normal) > 0.5,
                "normal flipped between consecutive frames"
            );
        }
    }
}
