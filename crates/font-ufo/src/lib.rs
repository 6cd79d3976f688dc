//! # UFO font source reading and writing
//!
//! Reads and writes [UFO](https://unifiedfontobject.org/) font masters: the
//! directory layout, the XML plist metadata files, and the glif glyph
//! format. Only the parts of the format the build pipeline touches are
//! modeled; images, guidelines, kerning, and groups pass through untouched
//! or are ignored.
//!
//! ## Example
//!
//! ```no_run
//! use lectura_font_ufo::Ufo;
//!
//! let mut font = Ufo::load("Lectura-Regular.ufo").unwrap();
//! if let Some(glyph) = font.get("A") {
//!     println!("A has {} contours", glyph.contours.len());
//! }
//! font.save("out/Lectura-Regular.ufo").unwrap();
//! ```

mod error;
mod font;
pub mod glif;
mod glyph;
pub mod plist;

pub use error::{Error, Result};
pub use font::{FontInfo, PUBLIC_GLYPH_ORDER, Ufo, glif_filename};
pub use glyph::{
    Anchor, Component, Contour, ContourPoint, Glyph, MARK_COLOR_KEY, PointType,
};
