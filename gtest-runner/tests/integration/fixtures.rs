// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use gtest_runner::{
    config::{ConfigOverrides, GtestRunnerConfig},
    errors::ProcessRunError,
    process::{ProcessOutput, ProcessRunner},
    reporter::{HostReporter, TestOutcome, TestResult},
    signal::CancellationToken,
    test_list::{LIST_TESTS_ARG, TestCase, TestName},
};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    fmt::Write as _,
    fs, io,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum FixtureStatus {
    Pass,
    Fail,
    Skip,
    /// Stops the executable without writing a result file.
    Crash,
    /// Written to the result file with a status that isn't recognized.
    UnknownStatus,
}

/// A [`ProcessRunner`] that pretends to be a set of GoogleTest executables.
#[derive(Default)]
pub(crate) struct FakeRunner {
    executables: HashMap<Utf8PathBuf, Vec<(String, FixtureStatus)>>,
    invocations: RefCell<Vec<(Utf8PathBuf, String)>>,
    listings: Cell<usize>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl FakeRunner {
    pub(crate) fn with_executable(
        mut self,
        executable: &str,
        tests: &[(&str, FixtureStatus)],
    ) -> Self {
        let tests = tests
            .iter()
            .map(|&(name, status)| (name.to_owned(), status))
            .collect();
        self.executables.insert(executable.into(), tests);
        self
    }

    /// Cancels `token` once `runs` test runs (not listings) have completed.
    pub(crate) fn cancel_after(mut self, runs: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((runs, token));
        self
    }

    /// Returns the executable and arguments of every test run, excluding listings.
    pub(crate) fn invocations(&self) -> Vec<(String, String)> {
        self.invocations
            .borrow()
            .iter()
            .map(|(exe, args)| (exe.to_string(), args.clone()))
            .collect()
    }

    /// Returns the number of times tests were listed.
    pub(crate) fn listings(&self) -> usize {
        self.listings.get()
    }

    fn list_output(tests: &[(String, FixtureStatus)]) -> Vec<String> {
        let mut lines = vec!["Running main() from gtest_main.cc".to_owned()];
        let mut current_suite = "";
        for (name, _) in tests {
            let (suite, case) = name.split_once('.').expect("fixture names are Suite.Case");
            if suite != current_suite {
                lines.push(format!("{suite}."));
                current_suite = suite;
            }
            lines.push(format!("  {case}"));
        }
        lines
    }
}

impl ProcessRunner for FakeRunner {
    fn run(
        &self,
        _working_dir: &Utf8Path,
        executable: &Utf8Path,
        arguments: &str,
        _print_output: bool,
    ) -> Result<ProcessOutput, ProcessRunError> {
        let Some(tests) = self.executables.get(executable) else {
            return Err(ProcessRunError::Spawn {
                executable: executable.to_owned(),
                error: io::Error::new(io::ErrorKind::NotFound, "no such executable"),
            });
        };

        if arguments == LIST_TESTS_ARG {
            self.listings.set(self.listings.get() + 1);
            return Ok(ProcessOutput {
                lines: Self::list_output(tests),
                exit_code: Some(0),
            });
        }

        self.invocations
            .borrow_mut()
            .push((executable.to_owned(), arguments.to_owned()));

        let mut output_file = None;
        let mut filter: Option<Vec<String>> = None;
        for arg in shell_words::split(arguments).expect("arguments are well-formed") {
            if let Some(path) = arg.strip_prefix("--gtest_output=xml:") {
                output_file = Some(Utf8PathBuf::from(path));
            } else if let Some(patterns) = arg.strip_prefix("--gtest_filter=") {
                filter = Some(patterns.split(':').map(str::to_owned).collect());
            } else {
                panic!("unexpected argument {arg:?}");
            }
        }

        let mut lines = Vec::new();
        let mut xml_cases = String::new();
        let mut crashed = false;
        let mut any_failed = false;
        for (name, status) in tests {
            let selected = filter.as_ref().is_none_or(|patterns| {
                patterns.iter().any(|pattern| match pattern.strip_suffix('*') {
                    Some(prefix) => name.starts_with(prefix),
                    None => pattern == name,
                })
            });
            if !selected {
                continue;
            }

            let (suite, case) = name.split_once('.').expect("fixture names are Suite.Case");
            lines.push(format!("[ RUN      ] {name}"));
            let xml_status = match status {
                FixtureStatus::Pass => {
                    lines.push(format!("[       OK ] {name} (3 ms)"));
                    r#"status="run""#
                }
                FixtureStatus::Fail => {
                    any_failed = true;
                    lines.push(format!("{name} went wrong"));
                    lines.push(format!("[  FAILED  ] {name} (5 ms)"));
                    _ = writeln!(
                        xml_cases,
                        r#"<testcase name="{case}" status="run" time="0.005" classname="{suite}"><failure message="{name} went wrong" /></testcase>"#
                    );
                    continue;
                }
                FixtureStatus::Skip => {
                    lines.push(format!("[  SKIPPED ] {name} (0 ms)"));
                    r#"status="run" result="skipped""#
                }
                FixtureStatus::Crash => {
                    lines.push("Segmentation fault".to_owned());
                    crashed = true;
                    break;
                }
                FixtureStatus::UnknownStatus => {
                    lines.push(format!("[       OK ] {name} (3 ms)"));
                    r#"status="exploded""#
                }
            };
            _ = writeln!(
                xml_cases,
                r#"<testcase name="{case}" {xml_status} time="0.003" classname="{suite}" />"#
            );
        }

        if !crashed {
            if let Some(output_file) = output_file {
                let xml = format!(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                     <testsuites>\n<testsuite name=\"all\">\n{xml_cases}</testsuite>\n</testsuites>\n"
                );
                fs::write(&output_file, xml).expect("result file written");
            }
        }

        if let Some((runs, token)) = &self.cancel_after {
            if self.invocations.borrow().len() >= *runs {
                token.cancel();
            }
        }

        let exit_code = if crashed {
            None
        } else if any_failed {
            Some(1)
        } else {
            Some(0)
        };
        Ok(ProcessOutput { lines, exit_code })
    }
}

/// A [`HostReporter`] that records everything it is told.
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    pub(crate) started: Vec<String>,
    pub(crate) finished: Vec<TestResult>,
}

impl RecordingReporter {
    /// Returns the name and outcome of each finished test.
    pub(crate) fn outcomes(&self) -> Vec<(String, TestOutcome)> {
        self.finished
            .iter()
            .map(|result| {
                (
                    format!(
                        "{}:{}",
                        result.test_case.executable,
                        result.test_case.display_name()
                    ),
                    result.outcome.clone(),
                )
            })
            .collect()
    }
}

impl HostReporter for RecordingReporter {
    fn test_started(&mut self, test_case: &TestCase) {
        self.started.push(format!(
            "{}:{}",
            test_case.executable,
            test_case.display_name()
        ));
    }

    fn test_finished(&mut self, result: &TestResult) {
        self.finished.push(result.clone());
    }
}

/// Loads a config with the given maximum command length and nothing else set.
pub(crate) fn config_with_max_length(max_command_length: usize) -> GtestRunnerConfig {
    let dir = Utf8TempDir::new().expect("temp dir created");
    let overrides = ConfigOverrides {
        max_command_length: Some(max_command_length),
        print_test_output: None,
    };
    GtestRunnerConfig::from_sources(dir.path(), None, &overrides).expect("valid config")
}

pub(crate) fn test_case(executable: &str, name: &str) -> TestCase {
    TestCase::new(executable, TestName::new(name).expect("valid test name"))
}
