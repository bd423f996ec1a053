// Copyright 2024 The ChromiumOS Authors
// Use of this source code is governed by a BSD-style license that can be
// found in the LICENSE file.

//! Provides functions common to the blueprint generator CLI programs.

use itertools::Itertools;
use std::{
    ffi::OsStr,
    fmt::{Debug, Display},
    process::{ExitCode, Termination},
};

mod config;
mod logging;

pub use crate::config::*;
pub use crate::logging::*;

/// Wraps a CLI main function to provide the common startup/cleanup logic.
///
/// Logging is configured before `main` runs, so `main` is free to use the
/// `tracing` macros right away.
pub fn cli_main<F, T, E>(main: F, config: Config) -> ExitCode
where
    F: FnOnce() -> Result<T, E>,
    T: Termination,
    E: Debug + Display,
{
    let _log_guard = match config.logging.setup() {
        Ok(guard) => guard,
        Err(error) => {
            eprintln!("FATAL: {}: {:#}", get_current_process_name(), error);
            return ExitCode::FAILURE;
        }
    };
    if config.log_command_line {
        log_current_command_line();
    }
    handle_top_level_result(main())
}

/// Logs the command line of the current process.
///
/// You don't need this function if you use [`cli_main`] because it calls this
/// function for you.
pub fn log_current_command_line() {
    let escaped_command = std::env::args()
        .map(|s| shell_escape::escape(s.into()))
        .join(" ");
    tracing::info!("COMMAND: {}", escaped_command);
}

/// Handles the top-level [`Result`] and returns [`ExitCode`] to be returned.
///
/// The error is reported on a single line. The full debug representation,
/// including the backtrace when one was captured, follows only when debug
/// logging is enabled.
///
/// You don't need this function if you use [`cli_main`].
pub fn handle_top_level_result<T: Termination, E: Debug + Display>(
    result: Result<T, E>,
) -> ExitCode {
    match result {
        Err(error) => {
            eprintln!("FATAL: {}: {:#}", get_current_process_name(), error);
            if tracing::enabled!(tracing::Level::DEBUG) {
                eprintln!("{:?}", error);
            }
            ExitCode::FAILURE
        }
        Ok(value) => value.report(),
    }
}

/// Returns the current process name, or `__unknown__` if it failed to get one.
fn get_current_process_name() -> String {
    let current_exe = std::env::current_exe().unwrap_or_default();
    current_exe
        .file_name()
        .unwrap_or(OsStr::new("__unknown__"))
        .to_string_lossy()
        .into_owned()
}
