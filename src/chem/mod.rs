//! Chemistry knowledge base: element properties and the residue-type
//! registry.
//!
//! Both tables are fixed at compile/startup time and read-only thereafter.
//! Lookups never fail: unknown element symbols map to [`Element::Unknown`]
//! and unknown residue codes map to the shared `UNK` entry, so downstream
//! code always has a valid type to reference.

mod element;
mod residue;

pub use element::Element;
pub use residue::{residue_type, ResidueFlags, ResidueType};
