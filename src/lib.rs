//! Molecular structure model and geometry-generation pipeline.
//!
//! molscene turns structure files (PDB, XYZ) into a typed, immutable
//! chemical graph — atoms, bonds, residues, chains, secondary structure —
//! and builds GPU-ready geometry buffers from it. Parsing, bond
//! inference, selection evaluation, and representation building are pure
//! CPU work with no GPU or windowing dependencies; a rendering layer
//! consumes the finished [`geometry::GeometryBuffer`]s.
//!
//! # Key entry points
//!
//! - [`build::load_structure`] - bytes in, [`model::Structure`] out
//! - [`select::Selection`] - textual atom selections (`chain A and
//!   resname ALA`)
//! - [`geometry::RepresentationOptions`] - style configuration with TOML
//!   preset support
//! - [`scene::build_scene`] - parallel representation builds over one
//!   shared structure
//!
//! # Pipeline
//!
//! ```text
//! bytes → format::parse → RecordStream → build → Structure
//!       → select::Selection → atom subset
//!       → geometry::build_geometry → GeometryBuffer
//! ```
//!
//! A finalized [`model::Structure`] is never mutated; representation
//! builds share it read-only across the rayon pool and write each to
//! their own buffer. Load failures are typed [`error::Error`] values;
//! recoverable oddities surface as [`events::Warning`] lists alongside
//! successful results.

pub mod build;
pub mod chem;
pub mod error;
pub mod events;
pub mod format;
pub mod geometry;
pub mod model;
pub mod scene;
pub mod select;
pub mod spatial;

pub use build::{load_structure, load_structure_with, BuilderOptions};
pub use error::Error;
pub use events::{Severity, Warning, WarningKind};
pub use geometry::{GeometryBuffer, Mode, RepresentationOptions};
pub use model::Structure;
pub use scene::{build_scene, CancelToken, Representation};
pub use select::{select, Selection};
