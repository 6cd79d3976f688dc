//! Error types for UFO compilation.

/// Result type for compilation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while compiling UFO masters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No masters were given.
    #[error("No masters to compile")]
    NoMasters,

    /// A master's glyph set differs from the first master's.
    #[error("Master '{master}' is missing glyph '{glyph}'")]
    MissingGlyph { master: String, glyph: String },

    /// Contour count differs between masters for a glyph.
    #[error("Contour count mismatch for glyph '{glyph}': master '{master}' has {actual} contours, expected {expected}")]
    ContourCountMismatch {
        glyph: String,
        master: String,
        expected: usize,
        actual: usize,
    },

    /// Point structure differs between masters for a glyph.
    #[error("Point structure mismatch for glyph '{glyph}' in master '{master}': {message}")]
    PointMismatch {
        glyph: String,
        master: String,
        message: String,
    },

    /// Component list differs between masters for a glyph.
    #[error("Component mismatch for glyph '{glyph}' in master '{master}': {message}")]
    ComponentMismatch {
        glyph: String,
        master: String,
        message: String,
    },

    /// A glyph mixes contours and components.
    #[error("Glyph '{glyph}' in master '{master}' mixes contours and components")]
    MixedOutlines { glyph: String, master: String },

    /// An open contour cannot be compiled to TrueType.
    #[error("Glyph '{glyph}' has an open contour")]
    OpenContour { glyph: String },

    /// A contour segment cannot be compiled.
    #[error("Unsupported segment in glyph '{glyph}': {message}")]
    UnsupportedSegment { glyph: String, message: String },

    /// A component references a glyph that is not in the font.
    #[error("Glyph '{glyph}' references missing base glyph '{base}'")]
    MissingBase { glyph: String, base: String },

    /// cmap construction failed.
    #[error("Failed to build cmap: {0}")]
    Cmap(String),

    /// Font builder error.
    #[error("Font builder error: {0}")]
    FontBuilder(#[from] write_fonts::BuilderError),

    /// Table write error.
    #[error("Font write error: {0}")]
    Write(#[from] write_fonts::error::Error),
}
