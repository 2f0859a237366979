//! Configuration builder
//!
//! This module provides a builder pattern for constructing configuration.

use std::path::Path;

use log::debug;

use crate::config::error::Result;
use crate::config::source::{CliSource, ConfigSource, EnvSource, FileSource};
use crate::config::types::{ConfigValues, ExchangeConfig};

/// Configuration builder
///
/// Sources are applied in the order they are added, lowest priority first.
/// Defaults fill whatever is still unset when the configuration is resolved.
pub struct ConfigBuilder {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Add file source
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        debug!("Adding file configuration source: {}", path.display());
        self.sources.push(Box::new(FileSource::new(path)));
        self
    }

    /// Add environment source
    pub fn with_env(mut self, prefix: &str) -> Self {
        debug!("Adding environment configuration source with prefix: {}", prefix);
        self.sources.push(Box::new(EnvSource::new(prefix)));
        self
    }

    /// Add command line source
    pub fn with_cli(mut self, values: ConfigValues) -> Self {
        debug!("Adding command line configuration source");
        self.sources.push(Box::new(CliSource::new(values)));
        self
    }

    /// Merge all sources without resolving defaults
    pub fn merge(self) -> Result<ConfigValues> {
        let mut values = ConfigValues::default();

        debug!("Building configuration from {} sources", self.sources.len());

        for source in self.sources {
            let source_values = source.load()?;
            let fields = source_values.present_fields();
            if !fields.is_empty() {
                debug!("Values from {}: {}", source.source_type(), fields.join(", "));
            }
            values = values.merge(source_values);
        }

        Ok(values)
    }

    /// Build the configuration
    pub fn build(self) -> Result<ExchangeConfig> {
        self.merge()?.resolve()
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
