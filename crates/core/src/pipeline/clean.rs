use std::{fs::remove_dir_all, path::Path};

use anyhow::Result;

pub fn clean(build_dir: &Path, dist_dir: &Path) -> Result<()> {
    let mut removed = 0;

    for dir in [build_dir, dist_dir] {
        if dir.exists() {
            remove_dir_all(dir)?;
            println!("Removed {}", dir.display());
            removed += 1;
        } else {
            println!("Skipped {} (not found)", dir.display());
        }
    }

    println!("Cleaned {removed} directories");
    Ok(())
}
