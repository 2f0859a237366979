//! Configuration module
//!
//! This module handles application configuration, including loading from
//! different sources (files, environment variables, command line arguments)
//! and validating the configuration.
//!
//! Priority, lowest to highest: defaults, configuration file, environment
//! variables (`SOCKET_TESTER_*`), command line arguments.

mod builder;
pub mod defaults;
mod error;
mod source;
mod types;
mod validator;

pub use builder::ConfigBuilder;
pub use defaults::ENV_PREFIX;
pub use error::ConfigError;
pub use source::{CliSource, ConfigSource, EnvSource, FileSource};
pub use types::{ConfigValues, ExchangeConfig, ValueSource};
pub use validator::{validate_config, ConfigValidator};
