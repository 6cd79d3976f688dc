//! Instance UFO generation.
//!
//! Writes a temporary designspace document, reads it back, interpolates
//! an instance UFO for every named instance, overlays same-named drawn
//! sources, and stages the results for the master build.

use std::fs::{create_dir_all, remove_file};

use anyhow::{Context, Result, bail};
use lectura_font_ufo::{Glyph, Ufo};
use lectura_font_vf_builder::{DesignSpace, VariationModel, document};
use log::debug;
use rayon::prelude::*;

use crate::{io::check_results_with_paths, pipeline::PipelineContext, pipeline::vf::lectura_designspace};

pub fn prepare_instances(ctx: &PipelineContext) -> Result<()> {
    // The temporary document exists only to drive generation, mirroring
    // the designspace round-trip the final build step performs. Source
    // paths are absolutized so the round-trip through the document (whose
    // filenames resolve against the build directory) lands back on them.
    let source_dir = ctx
        .source_dir
        .canonicalize()
        .with_context(|| format!("source directory {} not found", ctx.source_dir.display()))?;
    let tmp_path = ctx.tmp_designspace_path();
    create_dir_all(&ctx.build_dir)?;
    document::write_document(&lectura_designspace(&source_dir), &tmp_path)?;
    let designspace = document::read_document(&tmp_path)?;
    remove_file(&tmp_path)?;

    if designspace.instances.is_empty() {
        println!("  No instances configured, skipping");
        return Ok(());
    }

    let masters: Vec<Ufo> = designspace
        .sources
        .iter()
        .map(|source| {
            Ufo::load(&source.path)
                .with_context(|| format!("loading master {}", source.path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let model = VariationModel::new(&designspace)
        .context("designspace has no source at the default location")?;

    create_dir_all(ctx.instance_dir())?;
    create_dir_all(ctx.master_ufo_dir())?;

    println!("  Generating {} instances...", designspace.instances.len());

    let results: Vec<_> = designspace
        .instances
        .par_iter()
        .map(|instance| {
            let filename = instance
                .filename
                .clone()
                .unwrap_or_else(|| format!("Lectura-{}.ufo", instance.name));
            let result = generate_instance(ctx, &designspace, &masters, &model, instance, &filename);
            (filename, result)
        })
        .collect();

    check_results_with_paths(&results, "generate instances")
}

fn generate_instance(
    ctx: &PipelineContext,
    designspace: &DesignSpace,
    masters: &[Ufo],
    model: &VariationModel,
    instance: &lectura_font_vf_builder::Instance,
    filename: &str,
) -> Result<()> {
    let location = instance.normalized_location(&designspace.axes);
    let scalars = model.scalars_at(&location);
    let default = &masters[model.default_idx];

    let mut font = Ufo::new(filename);
    font.info = default.info.clone();
    font.info.set_style_name(&instance.name);
    font.lib = default.lib.clone();

    for glyph in default.iter() {
        let interpolated = interpolate_glyph(glyph, masters, model, &scalars)
            .with_context(|| format!("interpolating glyph '{}'", glyph.name))?;
        font.insert(interpolated);
    }

    font.save(ctx.instance_dir().join(filename))?;
    debug!("generated instance {filename} at opsz location {location:?}");

    // Overlay hand-drawn glyphs for this instance, when a source exists.
    let source_path = ctx.source_dir.join(filename);
    if source_path.exists() {
        let source = Ufo::load(&source_path)?;
        println!("  Overlaying {} drawn glyphs into {filename}", source.len());
        for glyph in source.iter() {
            font.insert(glyph.clone());
        }
    }

    // Stage the result so the master build picks it up.
    font.save(ctx.master_ufo_dir().join(filename))?;
    Ok(())
}

/// Interpolate one glyph at a location. Masters missing the glyph (or
/// carrying an incompatible anchor list) contribute the default master's
/// geometry.
fn interpolate_glyph(
    default_glyph: &Glyph,
    masters: &[Ufo],
    model: &VariationModel,
    scalars: &[f32],
) -> Result<Glyph> {
    let name = &default_glyph.name;

    let glyphs: Vec<&Glyph> = masters
        .iter()
        .map(|master| master.get(name).unwrap_or(default_glyph))
        .collect();

    for (master, glyph) in masters.iter().zip(&glyphs) {
        if glyph.contours.len() != default_glyph.contours.len() {
            bail!(
                "master {} has {} contours, expected {}",
                master.file_name(),
                glyph.contours.len(),
                default_glyph.contours.len()
            );
        }
        for (contour, default_contour) in glyph.contours.iter().zip(&default_glyph.contours) {
            if contour.points.len() != default_contour.points.len() {
                bail!(
                    "master {} is not point-compatible for '{name}'",
                    master.file_name()
                );
            }
        }
        if glyph.components.len() != default_glyph.components.len() {
            bail!(
                "master {} has {} components for '{name}', expected {}",
                master.file_name(),
                glyph.components.len(),
                default_glyph.components.len()
            );
        }
    }

    let interp = |values: Vec<f64>| model.interpolate(&values, scalars);

    let mut result = default_glyph.clone();

    result.width = interp(glyphs.iter().map(|g| g.width).collect());
    result.height = interp(glyphs.iter().map(|g| g.height).collect());

    for (contour_idx, contour) in result.contours.iter_mut().enumerate() {
        for (point_idx, point) in contour.points.iter_mut().enumerate() {
            point.x = interp(
                glyphs.iter().map(|g| g.contours[contour_idx].points[point_idx].x).collect(),
            );
            point.y = interp(
                glyphs.iter().map(|g| g.contours[contour_idx].points[point_idx].y).collect(),
            );
        }
    }

    for (component_idx, component) in result.components.iter_mut().enumerate() {
        component.x_offset =
            interp(glyphs.iter().map(|g| g.components[component_idx].x_offset).collect());
        component.y_offset =
            interp(glyphs.iter().map(|g| g.components[component_idx].y_offset).collect());
    }

    // Anchors interpolate only when every master carries the same list.
    let anchors_compatible = glyphs.iter().all(|g| {
        g.anchors.len() == default_glyph.anchors.len()
            && g.anchors
                .iter()
                .zip(&default_glyph.anchors)
                .all(|(a, b)| a.name == b.name)
    });
    if anchors_compatible {
        for (anchor_idx, anchor) in result.anchors.iter_mut().enumerate() {
            anchor.x = interp(glyphs.iter().map(|g| g.anchors[anchor_idx].x).collect());
            anchor.y = interp(glyphs.iter().map(|g| g.anchors[anchor_idx].y).collect());
        }
    }

    Ok(result)
}
