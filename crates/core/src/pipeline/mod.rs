//! Build pipeline for the Lectura fonts.

mod clean;
mod instances;
mod steps;
mod vf;

pub use clean::clean;
pub use steps::{BUILD_STEPS, PipelineStep};
pub use vf::lectura_designspace;

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::Result;

use crate::config::{
    DESIGNSPACE_FILENAME, GLYPH_ORDER_FILENAME, INSTANCE_DIR, MASTER_TTF_DIR, MASTER_UFO_DIR,
    TMP_DESIGNSPACE_FILENAME, VF_FILENAME,
};

pub struct PipelineContext {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub dist_dir: PathBuf,
    /// Whether accented composites are constructed (`--no-composites`
    /// skips the step).
    pub composites: bool,
}

impl PipelineContext {
    pub fn new(source_dir: PathBuf, build_dir: PathBuf, dist_dir: PathBuf, composites: bool) -> Self {
        Self { source_dir, build_dir, dist_dir, composites }
    }

    pub fn master_ufo_dir(&self) -> PathBuf {
        self.build_dir.join(MASTER_UFO_DIR)
    }

    pub fn master_ttf_dir(&self) -> PathBuf {
        self.build_dir.join(MASTER_TTF_DIR)
    }

    pub fn instance_dir(&self) -> PathBuf {
        self.build_dir.join(INSTANCE_DIR)
    }

    pub fn designspace_path(&self) -> PathBuf {
        self.build_dir.join(DESIGNSPACE_FILENAME)
    }

    pub fn tmp_designspace_path(&self) -> PathBuf {
        self.build_dir.join(TMP_DESIGNSPACE_FILENAME)
    }

    pub fn glyph_order_path(&self) -> PathBuf {
        self.source_dir.join(GLYPH_ORDER_FILENAME)
    }

    pub fn vf_output(&self) -> PathBuf {
        self.dist_dir.join(VF_FILENAME)
    }

    /// Compiled TrueType path for a staged master UFO path.
    pub fn compiled_master_path(&self, ufo_path: &Path) -> PathBuf {
        let file_name = ufo_path.file_name().map(PathBuf::from).unwrap_or_default();
        self.master_ttf_dir().join(file_name.with_extension("ttf"))
    }
}

pub fn run_step(
    name: &str,
    step_num: usize,
    total: usize,
    ctx: &PipelineContext,
    f: impl Fn(&PipelineContext) -> Result<()>,
) -> Result<()> {
    println!("\n[{step_num}/{total}] {name}");
    let start = Instant::now();
    f(ctx)?;
    println!("  ✓ {name} ({:.2}s)", start.elapsed().as_secs_f64());
    Ok(())
}

pub fn run_steps(steps: &[PipelineStep], ctx: &PipelineContext, total: usize) -> Result<()> {
    for (i, (name, step_fn)) in steps.iter().enumerate() {
        run_step(name, i + 1, total, ctx, step_fn)?;
    }
    Ok(())
}

/// Run the full build: sources to variable font.
pub fn build(
    source_dir: &Path,
    build_dir: &Path,
    dist_dir: &Path,
    composites: bool,
) -> Result<()> {
    let ctx = PipelineContext::new(
        source_dir.to_path_buf(),
        build_dir.to_path_buf(),
        dist_dir.to_path_buf(),
        composites,
    );
    let start = Instant::now();

    println!("═══════════════════════════════════════════════════════════════════════════════");
    println!("Lectura Variable Font Build Pipeline");
    println!("═══════════════════════════════════════════════════════════════════════════════");

    run_steps(BUILD_STEPS, &ctx, BUILD_STEPS.len())?;

    println!("\n═══════════════════════════════════════════════════════════════════════════════");
    println!("✨ Build complete in {:.2}s", start.elapsed().as_secs_f64());
    println!("   Output: {}", ctx.vf_output().display());
    println!("═══════════════════════════════════════════════════════════════════════════════");

    Ok(())
}
