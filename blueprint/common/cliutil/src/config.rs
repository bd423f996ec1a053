// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

use crate::{level_for_verbosity, LoggingConfig};
use anyhow::Result;

/// The configuration for the current process.
#[derive(Default)]
pub struct ConfigBuilder {
    logging: Option<LoggingConfig>,

    verbosity: u8,

    log_command_line: bool,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            logging: None,
            verbosity: 0,
            log_command_line: true,
        }
    }

    /// Overrides the logging config. If this isn't called, it defaults to
    /// `LoggingConfig::from_env()` at the level selected by [`Self::verbosity`].
    pub fn logging(mut self, cfg: LoggingConfig) -> Self {
        self.logging = Some(cfg);
        self
    }

    /// Sets the number of `-v` flags the user passed.
    pub fn verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// `enable` controls whether to log the command-line of the current process.
    pub fn log_command_line(mut self, enable: bool) -> Self {
        self.log_command_line = enable;
        self
    }

    /// Builds a Config suitable for use with cli_main.
    pub fn build(self) -> Result<Config> {
        let logging = match self.logging {
            Some(logging) => logging,
            None => LoggingConfig::from_env(level_for_verbosity(self.verbosity))?,
        };
        Ok(Config {
            logging,
            log_command_line: self.log_command_line,
        })
    }
}

/// A POD struct containing the configs, after applying any defaults for unset values.
/// Build it with `cliutil::ConfigBuilder::new().<field>().build()`.
pub struct Config {
    pub(crate) logging: LoggingConfig,
    pub(crate) log_command_line: bool,
}
