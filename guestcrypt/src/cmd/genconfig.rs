use anyhow::{ensure, Result};

use super::Command;
use crate::cli;
use crate::config::Config;

impl Command for cli::GenConfig {
    async fn run(self, _: &Config) -> Result<()> {
        ensure!(
            self.force || !self.config_file.exists(),
            "config file {0:?} already exists",
            self.config_file
        );

        Config::default().store(&self.config_file, self.force.into())?;
        log::info!("wrote default configuration to {:?}", self.config_file);
        Ok(())
    }
}
