//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use std::path::Path;

use crate::error::Result;
use crate::migration::{MigrationList, MigrationStep, ProcessorOptions};

impl Config {
    /// Load configuration from a YAML file.
    ///
    /// A `migrations.file` entry is resolved relative to the config file's
    /// directory and its steps are appended to the inline ones.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path.parent())
    }

    /// Parse configuration from a YAML string. A steps file is resolved
    /// relative to the working directory.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::parse(yaml, None)
    }

    fn parse(yaml: &str, base_dir: Option<&Path>) -> Result<Self> {
        let mut config: Config = serde_yaml::from_str(yaml)?;
        if let Some(file) = config.migrations.file.take() {
            let resolved = match base_dir {
                Some(dir) if file.is_relative() => dir.join(&file),
                _ => file,
            };
            let content = std::fs::read_to_string(&resolved)?;
            let steps: Vec<MigrationStep> = serde_yaml::from_str(&content)?;
            config.migrations.steps.extend(steps);
            config.migrations.file = Some(resolved);
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// The configured steps as a validated migration list.
    pub fn migration_list(&self) -> Result<MigrationList> {
        MigrationList::from_steps(self.migrations.steps.iter().cloned())
    }

    pub fn processor_options(&self) -> ProcessorOptions {
        ProcessorOptions {
            log_table: self.migrations.log_table.clone(),
            allow_content_changes: self.migrations.allow_content_changes,
        }
    }
}
