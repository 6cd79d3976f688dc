//! Pipeline step definitions.

use std::fs::{create_dir_all, write};

use anyhow::{Context, Result};
use lectura_font_compiler::{CompileOptions, compile_interpolatable};
use lectura_font_ufo::Ufo;
use lectura_font_vf_builder::document;
use log::warn;
use rayon::prelude::*;

use super::{
    PipelineContext,
    clean::clean,
    instances::prepare_instances,
    vf::{build_vf, write_designspace},
};
use crate::{
    config::{DEFAULT_MASTER, MASTERS},
    io::{check_results_with_paths, glob_ufos},
    lectura::{
        composites::{build_composites, check_recipes},
        glyphset::fill_missing_glyphs,
        ordering::{clear_anchors, load_glyph_order, set_glyph_order},
    },
};

pub type PipelineStep = (&'static str, fn(&PipelineContext) -> Result<()>);

pub const BUILD_STEPS: &[PipelineStep] = &[
    ("clean", step_clean),
    ("prepare-instances", step_prepare_instances),
    ("build-masters", step_build_masters),
    ("write-designspace", step_write_designspace),
    ("compile-masters", step_compile_masters),
    ("build-vf", step_build_vf),
];

fn step_clean(ctx: &PipelineContext) -> Result<()> {
    clean(&ctx.build_dir, &ctx.dist_dir)
}

fn step_prepare_instances(ctx: &PipelineContext) -> Result<()> {
    prepare_instances(ctx)
}

fn step_build_masters(ctx: &PipelineContext) -> Result<()> {
    let order = load_glyph_order(&ctx.glyph_order_path())?;

    // Drawings nobody configured are a likely oversight.
    for path in glob_ufos(&ctx.source_dir, "*.ufo")? {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let configured = MASTERS.iter().any(|m| m.filename == name)
            || crate::config::INSTANCES.iter().any(|i| i.filename == name);
        if !configured {
            warn!("{name} is in the source directory but not in the build configuration");
        }
    }

    // Masters load from the staging directory when instance generation
    // already updated them, otherwise from the drawings.
    let mut fonts: Vec<Ufo> = MASTERS
        .iter()
        .map(|master| {
            let staged = ctx.master_ufo_dir().join(master.filename);
            let path = if master.filename != DEFAULT_MASTER && staged.exists() {
                staged
            } else {
                ctx.source_dir.join(master.filename)
            };
            Ufo::load(&path).with_context(|| format!("loading master {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let (default, others) = fonts.split_first_mut().expect("MASTERS is non-empty");
    let filled = fill_missing_glyphs(default, others);
    println!("  Filled {filled} glyphs from {DEFAULT_MASTER}");

    if ctx.composites {
        for (font, master) in fonts.iter().zip(MASTERS) {
            if master.build_accents {
                check_recipes(font)?;
            }
        }
        let mut accent_fonts: Vec<&mut Ufo> = fonts
            .iter_mut()
            .zip(MASTERS)
            .filter(|(_, master)| master.build_accents)
            .map(|(font, _)| font)
            .collect();
        build_composites(&mut accent_fonts)?;
        println!("  Built composites in {} masters", accent_fonts.len());
    } else {
        println!("  Composite construction disabled");
    }

    let mut all: Vec<&mut Ufo> = fonts.iter_mut().collect();
    set_glyph_order(&order, &mut all);
    clear_anchors(&mut all);

    let master_dir = ctx.master_ufo_dir();
    create_dir_all(&master_dir)?;

    let results: Vec<_> = fonts
        .par_iter_mut()
        .zip(MASTERS)
        .map(|(font, master)| {
            let path = master_dir.join(master.filename);
            (path.clone(), font.save(&path).map_err(anyhow::Error::from))
        })
        .collect();
    check_results_with_paths(&results, "save masters")?;

    println!("  Saved {} masters to {}", fonts.len(), master_dir.display());
    Ok(())
}

fn step_write_designspace(ctx: &PipelineContext) -> Result<()> {
    write_designspace(ctx)
}

fn step_compile_masters(ctx: &PipelineContext) -> Result<()> {
    let designspace = document::read_document(&ctx.designspace_path())?;

    let masters: Vec<Ufo> = designspace
        .sources
        .iter()
        .map(|source| {
            Ufo::load(&source.path)
                .with_context(|| format!("loading staged master {}", source.path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    println!("  Compiling {} masters to interpolatable TrueType...", masters.len());

    let master_refs: Vec<&Ufo> = masters.iter().collect();
    let compiled = compile_interpolatable(&master_refs, &CompileOptions::default())?;

    let ttf_dir = ctx.master_ttf_dir();
    create_dir_all(&ttf_dir)?;

    for (source, data) in designspace.sources.iter().zip(&compiled) {
        let path = ctx.compiled_master_path(&source.path);
        write(&path, data).with_context(|| format!("writing {}", path.display()))?;
        println!("  {} ({:.1} KB)", path.display(), data.len() as f64 / 1024.0);
    }

    Ok(())
}

fn step_build_vf(ctx: &PipelineContext) -> Result<()> {
    build_vf(ctx)
}
