// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The test executor.
//!
//! The main structure in this module is [`TestExecutor`].

use crate::{
    command_line::CommandLineBuilder,
    config::GtestRunnerConfig,
    console_output::parse_console_output,
    errors::{ExecuteError, ResultXmlError},
    helpers::{DisplayErrorChain, plural},
    process::{ProcessRunner, executable_dir},
    reconcile::{local_computer_name, reconcile},
    reporter::{HostReporter, TestResult},
    result_xml::parse_result_xml,
    signal::CancellationToken,
    test_list::{TestCase, TestDiscoverer, TestList},
};
use camino::Utf8Path;
use indexmap::{IndexMap, IndexSet};
use std::{borrow::Cow, collections::HashSet, fs, io};
use tracing::{debug, error, warn};

/// A summary of a call to [`TestExecutor::run_tests`] or [`TestExecutor::run_executables`].
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RunSummary {
    /// The number of executables whose tests ran to completion.
    pub executables_run: usize,

    /// The number of executables that could not be listed or run.
    pub executables_failed: usize,

    /// Whether the run was canceled before every executable finished.
    pub canceled: bool,
}

impl RunSummary {
    /// Returns true if every executable ran and the run wasn't canceled.
    ///
    /// This says nothing about whether the tests themselves passed.
    pub fn is_success(&self) -> bool {
        self.executables_failed == 0 && !self.canceled
    }
}

/// Runs GoogleTest executables in length-bounded batches and reports a result for each test.
pub struct TestExecutor<'a> {
    discoverer: &'a dyn TestDiscoverer,
    process_runner: &'a dyn ProcessRunner,
    command_line_builder: CommandLineBuilder,
    print_test_output: bool,
    computer_name: Option<String>,
    cancellation: CancellationToken,
}

impl<'a> TestExecutor<'a> {
    /// Creates a new executor.
    ///
    /// Results are annotated with the name of this computer.
    pub fn new(
        discoverer: &'a dyn TestDiscoverer,
        process_runner: &'a dyn ProcessRunner,
        config: &GtestRunnerConfig,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            discoverer,
            process_runner,
            command_line_builder: CommandLineBuilder::new(config.max_command_length()),
            print_test_output: config.print_test_output(),
            computer_name: local_computer_name(),
            cancellation,
        }
    }

    /// Sets the computer name results are annotated with.
    pub fn set_computer_name(&mut self, computer_name: Option<String>) -> &mut Self {
        self.computer_name = computer_name;
        self
    }

    /// Runs the given tests.
    ///
    /// The full list of tests in each executable is discovered first, so that suites whose tests
    /// are all selected can be passed in as wildcards. If discovery fails for an executable, its
    /// selected tests are still run, just without wildcards.
    pub fn run_tests(
        &self,
        test_cases: &[TestCase],
        reporter: &mut dyn HostReporter,
    ) -> RunSummary {
        self.run_tests_impl(None, test_cases, reporter)
    }

    /// Runs the given tests, taking the full list of tests in each executable from `test_list`
    /// instead of listing the executables again.
    ///
    /// Executables missing from `test_list` are listed as in [`Self::run_tests`].
    pub fn run_tests_in(
        &self,
        test_list: &TestList,
        test_cases: &[TestCase],
        reporter: &mut dyn HostReporter,
    ) -> RunSummary {
        self.run_tests_impl(Some(test_list), test_cases, reporter)
    }

    fn run_tests_impl(
        &self,
        test_list: Option<&TestList>,
        test_cases: &[TestCase],
        reporter: &mut dyn HostReporter,
    ) -> RunSummary {
        let groups = group_by_executable(test_cases);

        let universes: Vec<Cow<'_, [TestCase]>> = groups
            .keys()
            .map(
                |executable| match test_list.and_then(|list| list.executable_tests(executable)) {
                    Some(universe) => Cow::Borrowed(universe),
                    None => Cow::Owned(self.discover_universe(executable)),
                },
            )
            .collect();

        let mut summary = RunSummary::default();
        for ((executable, cases), universe) in groups.iter().zip(&universes) {
            if self.cancellation.is_canceled() {
                summary.canceled = true;
                break;
            }
            self.run_executable_logged(false, executable, universe, cases, reporter, &mut summary);
        }
        summary
    }

    fn discover_universe(&self, executable: &Utf8Path) -> Vec<TestCase> {
        match self.discoverer.discover(executable) {
            Ok(universe) => universe,
            Err(error) => {
                warn!(
                    "could not list tests in `{executable}`, running the selected tests \
                     without suite wildcards: {}",
                    DisplayErrorChain(&error)
                );
                Vec::new()
            }
        }
    }

    /// Runs every test in each of the given executables.
    ///
    /// An executable whose tests can't be listed is logged and skipped.
    pub fn run_executables<'e>(
        &self,
        executables: impl IntoIterator<Item = &'e Utf8Path>,
        reporter: &mut dyn HostReporter,
    ) -> RunSummary {
        let executables: IndexSet<&Utf8Path> = executables.into_iter().collect();

        let mut summary = RunSummary::default();
        for executable in executables {
            if self.cancellation.is_canceled() {
                summary.canceled = true;
                break;
            }
            match self.discoverer.discover(executable) {
                Ok(cases) => self.run_executable_logged(
                    true,
                    executable,
                    &cases,
                    &cases,
                    reporter,
                    &mut summary,
                ),
                Err(error) => {
                    error!(
                        "skipping `{executable}`, could not list its tests: {}",
                        DisplayErrorChain(&error)
                    );
                    summary.executables_failed += 1;
                }
            }
        }
        summary
    }

    fn run_executable_logged(
        &self,
        run_all: bool,
        executable: &Utf8Path,
        all_cases: &[TestCase],
        cases: &[TestCase],
        reporter: &mut dyn HostReporter,
        summary: &mut RunSummary,
    ) {
        match self.run_executable(run_all, executable, all_cases, cases, reporter) {
            Ok(ExecutableStatus::Completed) => summary.executables_run += 1,
            Ok(ExecutableStatus::Canceled) => summary.canceled = true,
            Err(error) => {
                error!("{}", DisplayErrorChain(&error));
                summary.executables_failed += 1;
            }
        }
    }

    fn run_executable(
        &self,
        run_all: bool,
        executable: &Utf8Path,
        all_cases: &[TestCase],
        cases: &[TestCase],
        reporter: &mut dyn HostReporter,
    ) -> Result<ExecutableStatus, ExecuteError> {
        for case in cases {
            reporter.test_started(case);
        }

        let temp_dir = camino_tempfile::Builder::new()
            .prefix("gtest-runner-")
            .tempdir()
            .map_err(|error| ExecuteError::TempDirCreate { error })?;
        let result_file = temp_dir.path().join("results.xml");
        let working_dir = executable_dir(executable);

        let batches = self.command_line_builder.build(
            run_all,
            executable.as_str().len(),
            all_cases,
            cases,
            &result_file,
        );
        debug!(
            "running {} {} from `{executable}` in {} {}",
            cases.len(),
            plural::tests_str(cases.len()),
            batches.len(),
            plural::batches_str(batches.len()),
        );

        for batch in batches {
            if self.cancellation.is_canceled() {
                return Ok(ExecutableStatus::Canceled);
            }
            remove_stale_result_file(&result_file)?;

            let output = self
                .process_runner
                .run(working_dir, executable, &batch.arguments, self.print_test_output)
                .map_err(|error| ExecuteError::ProcessRun {
                    executable: executable.to_owned(),
                    error,
                })?;
            debug!(
                "`{executable}` exited with {:?} after {} lines of output",
                output.exit_code,
                output.lines.len()
            );

            let expected: Vec<TestCase> = batch.test_cases.into_iter().cloned().collect();
            let results = self
                .collect_results(&result_file, &output.lines, &expected)
                .map_err(|error| ExecuteError::ResultXml {
                    executable: executable.to_owned(),
                    error,
                })?;
            for result in &results {
                reporter.test_finished(result);
            }
        }

        Ok(ExecutableStatus::Completed)
    }

    fn collect_results(
        &self,
        result_file: &Utf8Path,
        console_lines: &[String],
        expected: &[TestCase],
    ) -> Result<Vec<TestResult>, ResultXmlError> {
        let xml_results = parse_result_xml(result_file, expected)?;

        // The console output is only consulted if the XML file is incomplete.
        let (console_results, crashed_test) = if xml_results.len() < expected.len() {
            let parsed = parse_console_output(console_lines, expected);
            (parsed.results, parsed.crashed_test)
        } else {
            (Vec::new(), None)
        };

        Ok(reconcile(
            expected,
            xml_results,
            console_results,
            crashed_test.as_ref(),
            self.computer_name.as_deref(),
        ))
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ExecutableStatus {
    Completed,
    Canceled,
}

/// Groups test cases by executable, preserving the order in which executables and tests first
/// appear. Repeated test cases are only kept once.
pub fn group_by_executable(test_cases: &[TestCase]) -> IndexMap<&Utf8Path, Vec<TestCase>> {
    let mut seen = HashSet::with_capacity(test_cases.len());
    let mut groups: IndexMap<&Utf8Path, Vec<TestCase>> = IndexMap::new();
    for case in test_cases {
        if !seen.insert(case) {
            continue;
        }
        groups
            .entry(case.executable.as_path())
            .or_default()
            .push(case.clone());
    }
    groups
}

fn remove_stale_result_file(result_file: &Utf8Path) -> Result<(), ExecuteError> {
    match fs::remove_file(result_file) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(ExecuteError::ResultFileRemove {
            file: result_file.to_owned(),
            error,
        }),
    }
}
