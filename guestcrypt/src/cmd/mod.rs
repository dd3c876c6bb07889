use std::path::Path;

use anyhow::bail;

use crate::config::Config;

pub mod decaps;
pub mod encaps;
pub mod genconfig;
pub mod hash;
pub mod keygen;

pub(crate) trait Command {
    async fn run(self, config: &Config) -> anyhow::Result<()>;
}

/// Fail if any of `files` exists, unless `force` is given
fn check_overwrite(force: bool, files: &[&Path]) -> anyhow::Result<()> {
    if force {
        return Ok(());
    }
    let problems: Vec<String> = files
        .iter()
        .filter(|f| f.exists())
        .map(|f| format!("file {f:?} exists, refusing to overwrite it"))
        .collect();
    if !problems.is_empty() {
        bail!(problems.join("\n"));
    }
    Ok(())
}
