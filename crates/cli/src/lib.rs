//! CLI for the Lectura font build pipeline.

pub mod cli;
