// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spawning test executables.

use crate::errors::ProcessRunError;
use camino::Utf8Path;
use std::io::{BufRead, BufReader, Write};
use tracing::debug;

/// The output of a process that ran to completion.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProcessOutput {
    /// Standard output and standard error merged, one entry per line, without line terminators.
    pub lines: Vec<String>,

    /// The exit code, or `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

/// Runs an executable and collects its output.
pub trait ProcessRunner {
    /// Runs `executable` with `arguments` inside `working_dir` and blocks until it exits.
    ///
    /// `arguments` is a single string in the shape produced by
    /// [`CommandLineBuilder`](crate::command_line::CommandLineBuilder). A non-zero exit is not an
    /// error: failing tests exit non-zero.
    fn run(
        &self,
        working_dir: &Utf8Path,
        executable: &Utf8Path,
        arguments: &str,
        print_output: bool,
    ) -> Result<ProcessOutput, ProcessRunError>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for &R {
    fn run(
        &self,
        working_dir: &Utf8Path,
        executable: &Utf8Path,
        arguments: &str,
        print_output: bool,
    ) -> Result<ProcessOutput, ProcessRunError> {
        (**self).run(working_dir, executable, arguments, print_output)
    }
}

/// A [`ProcessRunner`] that spawns processes with `duct`.
#[derive(Copy, Clone, Debug, Default)]
pub struct DuctProcessRunner;

impl ProcessRunner for DuctProcessRunner {
    fn run(
        &self,
        working_dir: &Utf8Path,
        executable: &Utf8Path,
        arguments: &str,
        print_output: bool,
    ) -> Result<ProcessOutput, ProcessRunError> {
        let args =
            shell_words::split(arguments).map_err(|error| ProcessRunError::SplitArguments {
                arguments: arguments.to_owned(),
                error,
            })?;
        debug!(%executable, %working_dir, ?args, "spawning process");

        let reader_handle = duct::cmd(executable.as_std_path(), args)
            .dir(working_dir)
            .stderr_to_stdout()
            .unchecked()
            .reader()
            .map_err(|error| ProcessRunError::Spawn {
                executable: executable.to_owned(),
                error,
            })?;

        let read_error = |error| ProcessRunError::ReadOutput {
            executable: executable.to_owned(),
            error,
        };

        // Read lines as they arrive so that output can be echoed while the tests run.
        let mut lines = Vec::new();
        let mut reader = BufReader::new(&reader_handle);
        let mut buf = Vec::with_capacity(256);
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).map_err(read_error)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(trim_line_ending(&buf)).into_owned();
            if print_output {
                let mut stdout = std::io::stdout().lock();
                // A closed stdout shouldn't stop the tests from running.
                _ = writeln!(stdout, "{line}");
            }
            lines.push(line);
        }

        // After reading completes (EOF), the handle is internally waited on.
        let exit_code = reader_handle
            .try_wait()
            .map_err(read_error)?
            .and_then(|output| output.status.code());

        Ok(ProcessOutput { lines, exit_code })
    }
}

/// Returns the directory tests in `executable` are run from: the directory containing it.
pub fn executable_dir(executable: &Utf8Path) -> &Utf8Path {
    match executable.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
