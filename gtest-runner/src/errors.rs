// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by gtest-runner.

use camino::Utf8PathBuf;
use config::ConfigError;
use std::borrow::Cow;
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse gtest-runner config{}", display_config_file(.config_file.as_ref()))]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Option<Utf8PathBuf>,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: Option<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self { config_file, kind }
    }

    /// Returns the config file that failed to parse, if one was involved.
    pub fn config_file(&self) -> Option<&Utf8PathBuf> {
        self.config_file.as_ref()
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

fn display_config_file(config_file: Option<&Utf8PathBuf>) -> String {
    match config_file {
        Some(file) => format!(" at `{file}`"),
        None => String::new(),
    }
}

/// The kind of error that occurred while parsing a config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config from its sources.
    #[error(transparent)]
    Build(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    Deserialize(Box<serde_path_to_error::Error<ConfigError>>),

    /// A value in the config was out of range.
    #[error("invalid value for `{key}`: {message}")]
    InvalidValue {
        /// The key that had an invalid value.
        key: &'static str,

        /// A description of what's wrong with the value.
        message: Cow<'static, str>,
    },
}

/// An error that occurs while parsing a GoogleTest name of the form `Suite.Case`.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("invalid test name `{input}`: {reason}")]
pub struct TestNameParseError {
    input: String,
    reason: &'static str,
}

impl TestNameParseError {
    pub(crate) fn new(input: impl Into<String>, reason: &'static str) -> Self {
        Self {
            input: input.into(),
            reason,
        }
    }

    /// Returns the input that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// An error that occurs while discovering the tests in an executable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoverError {
    /// Running the executable to list its tests failed.
    #[error("running `{command}` failed")]
    Command {
        /// The command that was run.
        command: String,

        /// The underlying error.
        #[source]
        error: ProcessRunError,
    },

    /// The executable exited with a failure while listing its tests.
    #[error("`{command}` exited with {}", display_exit_code(*.exit_code))]
    CommandFailed {
        /// The command that was run.
        command: String,

        /// The exit code, or `None` if the process was terminated by a signal.
        exit_code: Option<i32>,

        /// The output produced by the command.
        output: String,
    },

    /// An error occurred while parsing a line of the test list.
    #[error("for `{executable}`, {message}\nfull output:\n{full_output}")]
    ParseLine {
        /// The executable being listed.
        executable: Utf8PathBuf,

        /// A descriptive message.
        message: Cow<'static, str>,

        /// The full output.
        full_output: String,
    },
}

impl DiscoverError {
    pub(crate) fn parse_line(
        executable: impl Into<Utf8PathBuf>,
        message: impl Into<Cow<'static, str>>,
        full_output: impl Into<String>,
    ) -> Self {
        Self::ParseLine {
            executable: executable.into(),
            message: message.into(),
            full_output: full_output.into(),
        }
    }
}

fn display_exit_code(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "an abnormal termination (signal)".to_owned(),
    }
}

/// An error that occurs while running a process through a
/// [`ProcessRunner`](crate::process::ProcessRunner).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProcessRunError {
    /// The argument string could not be split into individual arguments.
    #[error("failed to split arguments `{arguments}`")]
    SplitArguments {
        /// The argument string.
        arguments: String,

        /// The underlying error.
        #[source]
        error: shell_words::ParseError,
    },

    /// The process could not be spawned.
    #[error("failed to spawn `{executable}`")]
    Spawn {
        /// The executable that was being spawned.
        executable: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// An error occurred while reading the output of the process.
    #[error("failed to read output of `{executable}`")]
    ReadOutput {
        /// The executable whose output was being read.
        executable: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },
}

/// A fatal error that occurs while parsing a result XML file.
///
/// Most problems with result files (missing files, malformed XML) are not errors: they are logged
/// and treated as an empty set of results. The errors here indicate that the file was produced in a
/// format that isn't understood, and must not be silently misreported.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ResultXmlError {
    /// A test case had a status that isn't known.
    #[error(
        "unknown testcase status `{status}` for `{test_name}` in `{file}` \
         (the test framework's result format may have changed)"
    )]
    UnknownStatus {
        /// The result file.
        file: Utf8PathBuf,

        /// The fully qualified name of the test case.
        test_name: String,

        /// The status that was found.
        status: String,
    },
}

/// An error that occurs while running the tests of a single executable.
///
/// These errors are caught by the [`TestExecutor`](crate::runner::TestExecutor), logged, and do
/// not prevent other executables from being run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExecuteError {
    /// Creating the temporary directory for the result file failed.
    #[error("failed to create temporary directory for test results")]
    TempDirCreate {
        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// Removing a stale result file failed.
    #[error("failed to remove stale result file `{file}`")]
    ResultFileRemove {
        /// The result file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// Running a batch of tests failed.
    #[error("failed to run tests in `{executable}`")]
    ProcessRun {
        /// The executable being run.
        executable: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: ProcessRunError,
    },

    /// The result file contained data in an unrecognized format.
    #[error("failed to collect test results for `{executable}`")]
    ResultXml {
        /// The executable being run.
        executable: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: ResultXmlError,
    },
}

/// An error that occurs while setting up the Ctrl-C handler.
#[derive(Debug, Error)]
#[error("error setting up signal handler")]
pub struct SignalHandlerSetupError(#[from] ctrlc::Error);

/// An error that occurs while writing a test list.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteTestListError {
    /// An error occurred while writing the list to the provided output.
    #[error("error writing to output")]
    Io(#[source] std::io::Error),

    /// An error occurred while serializing JSON, or while writing it to the provided output.
    #[error("error serializing to JSON")]
    Json(#[source] serde_json::Error),
}

/// An error that occurs while building a [`TestFilter`](crate::test_filter::TestFilter).
#[derive(Clone, Debug, Error)]
#[error("invalid test name pattern `{pattern}`")]
pub struct TestFilterBuildError {
    pattern: String,
    #[source]
    error: globset::Error,
}

impl TestFilterBuildError {
    pub(crate) fn new(pattern: impl Into<String>, error: globset::Error) -> Self {
        Self {
            pattern: pattern.into(),
            error,
        }
    }

    /// Returns the pattern that failed to parse.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}
