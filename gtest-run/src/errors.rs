// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use gtest_metadata::GtestExitCode;
use gtest_runner::errors::{
    ConfigParseError, DiscoverError, SignalHandlerSetupError, TestFilterBuildError,
    WriteTestListError,
};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected failure of a `gtest-run` invocation.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine the current directory")]
    CurrentDirFailed {
        #[source]
        error: std::io::Error,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("test filter build error")]
    TestFilterBuildError {
        #[from]
        err: TestFilterBuildError,
    },
    #[error("signal handler setup error")]
    SignalHandlerSetupError {
        #[from]
        err: SignalHandlerSetupError,
    },
    #[error("failed to list tests")]
    TestListFailed {
        #[from]
        err: DiscoverError,
    },
    #[error("failed to write test list")]
    WriteTestListError {
        #[from]
        err: WriteTestListError,
    },
    #[error("failed to write test output")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
    #[error("no tests to run")]
    NoTestsRun,
    #[error("test run failed")]
    TestRunFailed,
}

impl ExpectedError {
    pub(crate) fn current_dir_failed(error: std::io::Error) -> Self {
        Self::CurrentDirFailed { error }
    }

    pub(crate) fn write_output_error(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    pub(crate) fn test_run_failed() -> Self {
        Self::TestRunFailed
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::ConfigParseError { .. }
            | Self::TestFilterBuildError { .. }
            | Self::SignalHandlerSetupError { .. } => GtestExitCode::SETUP_ERROR,
            Self::TestListFailed { .. } => GtestExitCode::TEST_LIST_CREATION_FAILED,
            Self::WriteTestListError { .. } | Self::WriteOutputError { .. } => {
                GtestExitCode::WRITE_OUTPUT_ERROR
            }
            Self::NoTestsRun => GtestExitCode::NO_TESTS_RUN,
            Self::TestRunFailed => GtestExitCode::TEST_RUN_FAILED,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::CurrentDirFailed { error } => {
                error!("could not determine the current directory");
                Some(error as &dyn Error)
            }
            Self::ConfigParseError { err } => {
                match err.config_file() {
                    Some(file) => error!(
                        "failed to parse gtest-runner config at `{}`",
                        file.style(styles.bold)
                    ),
                    None => error!("failed to parse gtest-runner config"),
                }
                err.source()
            }
            Self::TestFilterBuildError { err } => {
                error!(
                    "invalid test name pattern `{}`",
                    err.pattern().style(styles.bold)
                );
                err.source()
            }
            Self::SignalHandlerSetupError { err } => {
                error!("{err}");
                err.source()
            }
            Self::TestListFailed { err } => {
                match err {
                    DiscoverError::CommandFailed {
                        command,
                        exit_code,
                        output,
                        ..
                    } => {
                        let exit_str = exit_code
                            .map_or_else(|| "a signal".to_owned(), |code| format!("code {code}"));
                        error!(
                            "`{}` exited with {exit_str}, output:\n{output}",
                            command.style(styles.bold)
                        );
                    }
                    other => error!("{other}"),
                }
                err.source()
            }
            Self::WriteTestListError { err } => {
                error!("failed to write test list to output");
                Some(err as &dyn Error)
            }
            Self::WriteOutputError { err } => {
                error!("failed to write test output");
                Some(err as &dyn Error)
            }
            Self::NoTestsRun => {
                error!("no tests to run (hint: check the names passed to --filter)");
                None
            }
            Self::TestRunFailed => {
                error!("test run failed");
                None
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
