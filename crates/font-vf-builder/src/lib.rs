//! # Variable Font Builder
//!
//! Designspace handling and variable font assembly.
//!
//! This crate models designspace documents (axes, sources, instances),
//! reads and writes the `.designspace` XML format, implements the
//! variation model used for both delta computation and instance
//! interpolation, and assembles a variable font from compiled static
//! masters.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use lectura_font_vf_builder::{Axis, DesignSpace, Source, build_variable_font};
//!
//! let designspace = DesignSpace::new(
//!     vec![Axis::optical_size(8.0, 14.0, 14.0)],
//!     vec![
//!         Source::new("master_ufo/Lectura-Regular.ufo", vec![("opsz", 14.0)]).with_copy_info(),
//!         Source::new("master_ufo/Lectura-Caption.ufo", vec![("opsz", 8.0)]),
//!     ],
//! );
//!
//! let vf_data = build_variable_font(&designspace, |ufo| {
//!     Path::new("master_ttf").join(ufo.file_name().unwrap()).with_extension("ttf")
//! })
//! .unwrap();
//! std::fs::write("Lectura-VF.ttf", vf_data).unwrap();
//! ```

mod designspace;
pub mod document;
mod error;
mod variation_model;
mod vf_builder;

pub use designspace::{Axis, DesignSpace, Instance, Source};
pub use error::{Error, Result};
pub use variation_model::{Region, VariationModel};
pub use vf_builder::build_variable_font;
