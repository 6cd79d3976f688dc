//! Designspace construction and variable font building.

use std::{fs::create_dir_all, fs::write, path::Path};

use anyhow::{Context, Result, bail};
use lectura_font_vf_builder::{
    Axis, DesignSpace, Instance, Source, build_variable_font, document,
};

use crate::{
    config::{FAMILY_NAME, INSTANCES, MASTERS, OPSZ_DEFAULT, OPSZ_MAX, OPSZ_MIN},
    pipeline::PipelineContext,
};

/// The Lectura designspace, with sources rooted in `master_dir`.
///
/// The same designspace serves instance generation (rooted in the source
/// directory) and variable font assembly (rooted in the staging
/// directory).
pub fn lectura_designspace(master_dir: &Path) -> DesignSpace {
    let axes = vec![
        Axis::optical_size(OPSZ_MIN, OPSZ_DEFAULT, OPSZ_MAX).with_label_name("en", "Optical size"),
    ];

    let sources: Vec<Source> = MASTERS
        .iter()
        .map(|master| {
            let mut source = Source::new(master_dir.join(master.filename), vec![("opsz", master.opsz)])
                .with_family_name(FAMILY_NAME)
                .with_style_name(master.style_name);
            if master.copy_info {
                source = source.with_copy_info();
            }
            source
        })
        .collect();

    let instances: Vec<Instance> = INSTANCES
        .iter()
        .map(|instance| {
            Instance::new(instance.style_name, vec![("opsz", instance.opsz)])
                .with_family_name(FAMILY_NAME)
                .with_filename(instance.filename)
        })
        .collect();

    DesignSpace::new(axes, sources).with_instances(instances)
}

/// Write the final designspace document for the staged masters.
pub fn write_designspace(ctx: &PipelineContext) -> Result<()> {
    let designspace = lectura_designspace(&ctx.master_ufo_dir());
    create_dir_all(&ctx.build_dir)?;
    document::write_document(&designspace, &ctx.designspace_path())?;
    println!(
        "  Wrote {} ({} sources, {} instances)",
        ctx.designspace_path().display(),
        designspace.sources.len(),
        designspace.instances.len()
    );
    Ok(())
}

/// Assemble the variable font from the designspace document and the
/// compiled masters.
pub fn build_vf(ctx: &PipelineContext) -> Result<()> {
    let designspace = document::read_document(&ctx.designspace_path())?;

    for source in &designspace.sources {
        let compiled = ctx.compiled_master_path(&source.path);
        if !compiled.exists() {
            bail!("Compiled master not found: {}", compiled.display());
        }
    }

    println!("  Sources: {} masters", designspace.sources.len());
    println!("  Axes: opsz ({OPSZ_MIN}-{OPSZ_MAX})");

    let vf_data = build_variable_font(&designspace, |ufo_path| ctx.compiled_master_path(ufo_path))
        .context("Failed to build variable font")?;

    create_dir_all(&ctx.dist_dir)?;
    let output = ctx.vf_output();
    write(&output, &vf_data).with_context(|| format!("Failed to write {}", output.display()))?;

    let size_kb = vf_data.len() as f64 / 1024.0;
    println!("  Output: {} ({size_kb:.1} KB)", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn designspace_matches_config() {
        let ds = lectura_designspace(Path::new("master_ufo"));
        assert!(ds.validate().is_ok());
        assert_eq!(ds.axes.len(), 1);
        assert_eq!(ds.axes[0].tag, "opsz");
        assert_eq!(ds.sources.len(), MASTERS.len());
        assert_eq!(ds.instances.len(), INSTANCES.len());

        let default = ds.default_source().unwrap();
        assert_eq!(default.name, "Lectura-Regular.ufo");
        assert!(default.copy_info);
    }
}
