// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for gtest-runner.
//!
//! Configuration is layered, with later sources taking priority:
//!
//! 1. The embedded [default config](GtestRunnerConfig::DEFAULT_CONFIG).
//! 2. `.config/gtest-runner.toml` in the given directory, or an explicitly specified file.
//! 3. Overrides, typically from the command line.

use crate::{
    command_line::DEFAULT_MAX_COMMAND_LENGTH,
    errors::{ConfigParseError, ConfigParseErrorKind},
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Overrides applied on top of config files.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Overrides `run.max-command-length`.
    pub max_command_length: Option<usize>,

    /// Overrides `run.print-test-output`.
    pub print_test_output: Option<bool>,
}

/// gtest-runner configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GtestRunnerConfig {
    max_command_length: usize,
    print_test_output: bool,
}

impl Default for GtestRunnerConfig {
    fn default() -> Self {
        Self {
            max_command_length: DEFAULT_MAX_COMMAND_LENGTH,
            print_test_output: false,
        }
    }
}

impl GtestRunnerConfig {
    /// The default location of the config file, relative to the directory passed to
    /// [`Self::from_sources`].
    pub const CONFIG_PATH: &'static str = ".config/gtest-runner.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config, layering `file` (or `root/.config/gtest-runner.toml` if `file` is `None`)
    /// and then `overrides` over the defaults.
    ///
    /// An explicitly specified `file` must exist. Unknown keys are logged as warnings.
    pub fn from_sources(
        root: &Utf8Path,
        file: Option<&Utf8Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let builder = Self::apply_overrides(builder, overrides).map_err(|error| {
            ConfigParseError::new(None, ConfigParseErrorKind::Build(Box::new(error)))
        })?;

        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(Some(config_file.clone()), kind))?;
        if !unknown.is_empty() {
            warn!(
                "ignoring unknown configuration keys in `{config_file}`: {}",
                unknown.into_iter().collect::<Vec<_>>().join(", ")
            );
        }

        let config = config.run;
        if config.max_command_length == 0 {
            return Err(ConfigParseError::new(
                Some(config_file),
                ConfigParseErrorKind::InvalidValue {
                    key: "run.max-command-length",
                    message: "must be greater than zero".into(),
                },
            ));
        }

        Ok(Self {
            max_command_length: config.max_command_length,
            print_test_output: config.print_test_output,
        })
    }

    /// Returns the maximum command-line length, in bytes.
    pub fn max_command_length(&self) -> usize {
        self.max_command_length
    }

    /// Returns true if test output should be echoed while tests run.
    pub fn print_test_output(&self) -> bool {
        self.print_test_output
    }

    // ---
    // Helper methods
    // ---

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn apply_overrides(
        mut builder: ConfigBuilder<DefaultState>,
        overrides: &ConfigOverrides,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if let Some(max_command_length) = overrides.max_command_length {
            let value = u64::try_from(max_command_length).unwrap_or(u64::MAX);
            builder = builder.set_override("run.max-command-length", value)?;
        }
        if let Some(print_test_output) = overrides.print_test_output {
            builder = builder.set_override("run.print-test-output", print_test_output)?;
        }
        Ok(builder)
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(ConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::Build(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: ConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| ConfigParseErrorKind::Deserialize(Box::new(error)))?;

        Ok((config, ignored))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ConfigDeserialize {
    run: RunConfigDeserialize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RunConfigDeserialize {
    max_command_length: usize,
    print_test_output: bool,
}

/// Returns the path of the config file that [`GtestRunnerConfig::from_sources`] reads by default.
pub fn default_config_path(root: &Utf8Path) -> Utf8PathBuf {
    root.join(GtestRunnerConfig::CONFIG_PATH)
}
