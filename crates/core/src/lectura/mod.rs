//! Lectura-specific glyph set operations.

pub mod composites;
pub mod glyphset;
pub mod ordering;
