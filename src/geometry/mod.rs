//! Representation geometry builders.
//!
//! Each [`Mode`] maps to a dedicated builder with a uniform signature:
//! given an immutable [`Structure`], a selected atom subset, and a
//! [`RepresentationOptions`], produce a [`GeometryBuffer`] ready for GPU
//! upload. Builders are deterministic for a fixed input tuple and never
//! touch GPU handles. An incompatible style (cartoon over a selection
//! with no backbone atoms) degrades to an empty buffer plus a warning
//! rather than an error.

mod ball_and_stick;
mod cartoon;
mod color;
mod primitives;
mod spline;
mod surface;

use glam::Vec3;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::events::Warning;
use crate::model::{Aabb, Structure};
use crate::scene::CancelToken;

/// CPU-side mesh output of one representation build.
///
/// Vertex attributes are parallel arrays; `indices` is a triangle list.
/// The byte-view accessors expose the arrays in GPU-uploadable layout.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryBuffer {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Per-vertex unit normals.
    pub normals: Vec<[f32; 3]>,
    /// Per-vertex linear RGB colors.
    pub colors: Vec<[f32; 3]>,
    /// Triangle-list indices into the vertex arrays.
    pub indices: Vec<u32>,
    /// The LOD level this buffer was built at.
    pub lod: u32,
    /// Bounding box of all vertices.
    pub bounds: Aabb,
}

impl Default for GeometryBuffer {
    fn default() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
            indices: Vec::new(),
            lod: 0,
            bounds: Aabb::EMPTY,
        }
    }
}

impl GeometryBuffer {
    fn with_lod(lod: u32) -> Self {
        Self {
            lod,
            ..Self::default()
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// True when the buffer holds no geometry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Vertex positions as raw bytes.
    #[must_use]
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Vertex normals as raw bytes.
    #[must_use]
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Vertex colors as raw bytes.
    #[must_use]
    pub fn color_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Triangle indices as raw bytes.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Append one vertex, growing the bounds, and return its index.
    pub(crate) fn push_vertex(
        &mut self,
        position: Vec3,
        normal: Vec3,
        color: [f32; 3],
    ) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position.into());
        self.normals.push(normal.into());
        self.colors.push(color);
        self.bounds.grow(position);
        index
    }

    pub(crate) fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }
}

/// Representation style, a closed set — each variant maps to one builder.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Atoms as spheres, bonds as cylinders.
    #[default]
    BallsAndSticks,
    /// Van-der-Waals spacefill spheres, no bonds.
    Spheres,
    /// Spline-extruded ribbon over each chain's backbone trace.
    Cartoon,
    /// Gaussian isosurface over the selected atoms.
    Surface,
}

/// Per-vertex color source.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum Colorer {
    /// CPK color from the atom's element.
    #[default]
    ByElement,
    /// Palette color cycled per chain.
    ByChain,
    /// Palette color from the residue-type flag category.
    ByResidueType,
    /// Helix/sheet/coil/turn colors.
    BySecondaryStructure,
    /// One fixed linear RGB color.
    Uniform([f32; 3]),
}

/// Style configuration for one representation. All fields default, so
/// partial TOML/JSON configs work; unrecognized keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RepresentationOptions {
    /// Representation style.
    pub mode: Mode,
    /// Color source.
    pub colorer: Colorer,
    /// Multiplier on atom/bond radii. Must be positive.
    pub radius_scale: f32,
    /// Level of detail; higher strictly increases tessellation counts.
    pub lod_level: u32,
    /// Selection expression naming the atom subset to build.
    pub selection: String,
}

impl Default for RepresentationOptions {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            colorer: Colorer::default(),
            radius_scale: 1.0,
            lod_level: 2,
            selection: "all".to_owned(),
        }
    }
}

impl RepresentationOptions {
    /// Generate the JSON Schema describing the recognized options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(RepresentationOptions)
    }

    /// Parse options from TOML preset content. Missing fields use
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on malformed TOML or an invalid value.
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        let options: Self = toml::from_str(content)
            .map_err(|e| Error::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Serialize to pretty-printed TOML preset content.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when serialization fails.
    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `radius_scale` is not a positive
    /// finite number.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.radius_scale.is_finite() || self.radius_scale <= 0.0 {
            return Err(Error::Config(format!(
                "radius_scale must be positive, got {}",
                self.radius_scale
            )));
        }
        Ok(())
    }
}

/// Tessellation counts derived from an LOD level. Every count grows
/// strictly with the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LodParams {
    pub sphere_stacks: usize,
    pub sphere_slices: usize,
    pub cylinder_segments: usize,
    pub spline_segments: usize,
    pub cross_section_verts: usize,
    pub surface_cells: usize,
}

pub(crate) fn lod_params(level: u32) -> LodParams {
    let l = level as usize;
    LodParams {
        sphere_stacks: 4 + 2 * l,
        sphere_slices: 6 + 3 * l,
        cylinder_segments: 6 + 2 * l,
        spline_segments: 2 + 2 * l,
        cross_section_verts: 4 + 2 * l,
        surface_cells: 24 + 12 * l,
    }
}

/// Build the geometry for one representation over a selected atom subset.
///
/// `atoms` must be sorted ascending (as produced by the selection
/// evaluator). Warnings describe non-fatal degradations.
///
/// # Errors
///
/// Returns [`Error::Config`] for invalid options and [`Error::Cancelled`]
/// when a long-running build observes the token.
pub fn build_geometry(
    structure: &Structure,
    atoms: &[usize],
    options: &RepresentationOptions,
    cancel: &CancelToken,
) -> Result<(GeometryBuffer, Vec<Warning>), Error> {
    options.validate()?;
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let mut warnings = Vec::new();
    let buffer = match options.mode {
        Mode::BallsAndSticks => {
            ball_and_stick::build(structure, atoms, options, true)
        }
        Mode::Spheres => {
            ball_and_stick::build(structure, atoms, options, false)
        }
        Mode::Cartoon => {
            cartoon::build(structure, atoms, options, &mut warnings)
        }
        Mode::Surface => {
            surface::build(structure, atoms, options, cancel, &mut warnings)?
        }
    };
    Ok((buffer, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let options = RepresentationOptions::default();
        assert_eq!(options.mode, Mode::BallsAndSticks);
        assert_eq!(options.colorer, Colorer::ByElement);
        assert_eq!(options.lod_level, 2);
        assert!((options.radius_scale - 1.0).abs() < f32::EPSILON);
        assert_eq!(options.selection, "all");
    }

    #[test]
    fn lod_counts_strictly_increase() {
        for level in 0..6 {
            let lo = lod_params(level);
            let hi = lod_params(level + 1);
            assert!(hi.sphere_stacks > lo.sphere_stacks);
            assert!(hi.sphere_slices > lo.sphere_slices);
            assert!(hi.cylinder_segments > lo.cylinder_segments);
            assert!(hi.spline_segments > lo.spline_segments);
            assert!(hi.cross_section_verts > lo.cross_section_verts);
            assert!(hi.surface_cells > lo.surface_cells);
        }
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let options = RepresentationOptions::from_toml(
            "mode = \"cartoon\"\nlod_level = 4\n",
        )
        .unwrap();
        assert_eq!(options.mode, Mode::Cartoon);
        assert_eq!(options.lod_level, 4);
        assert_eq!(options.colorer, Colorer::ByElement);
        assert_eq!(options.selection, "all");
    }

    #[test]
    fn default_round_trips_through_toml() {
        let options = RepresentationOptions::default();
        let text = options.to_toml().unwrap();
        let parsed = RepresentationOptions::from_toml(&text).unwrap();
        assert_eq!(options, parsed);
    }

    #[test]
    fn unknown_toml_keys_are_ignored() {
        let options = RepresentationOptions::from_toml(
            "mode = \"spheres\"\nshiny = true\n",
        )
        .unwrap();
        assert_eq!(options.mode, Mode::Spheres);
    }

    #[test]
    fn invalid_radius_scale_is_rejected() {
        let result =
            RepresentationOptions::from_toml("radius_scale = -0.5\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn schema_has_expected_properties() {
        let schema =
            serde_json::to_value(RepresentationOptions::json_schema())
                .unwrap();
        let props = schema["properties"].as_object().unwrap();
        assert!(props.contains_key("mode"));
        assert!(props.contains_key("colorer"));
        assert!(props.contains_key("radius_scale"));
        assert!(props.contains_key("lod_level"));
        assert!(props.contains_key("selection"));
    }

    #[test]
    fn empty_buffer_byte_views_are_empty() {
        let buffer = GeometryBuffer::default();
        assert!(buffer.is_empty());
        assert!(buffer.position_bytes().is_empty());
        assert!(buffer.index_bytes().is_empty());
    }
}
