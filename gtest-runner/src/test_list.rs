// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test names, test cases, and discovery of the tests inside a GoogleTest executable.

use crate::{
    errors::{DiscoverError, TestNameParseError, WriteTestListError},
    helpers::{DisplayTestName, NameStyles},
    process::{ProcessRunner, executable_dir},
    test_filter::TestFilter,
};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use owo_colors::OwoColorize;
use serde::{Serialize, Serializer};
use std::{fmt, io, io::Write, str::FromStr};
use tracing::debug;

/// The argument that makes a GoogleTest executable print its tests instead of running them.
pub const LIST_TESTS_ARG: &str = "--gtest_list_tests";

/// A fully qualified GoogleTest name, of the form `Suite.Case`.
///
/// The name is split at the first `.`: the suite is everything before it, and the case is
/// everything after. Neither part may be empty.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TestName {
    full: String,
    dot: usize,
}

impl TestName {
    /// Parses a fully qualified name.
    pub fn new(name: impl Into<String>) -> Result<Self, TestNameParseError> {
        let full = name.into();
        let dot = full
            .find('.')
            .ok_or_else(|| TestNameParseError::new(&full, "missing `.` between suite and case"))?;
        if dot == 0 {
            return Err(TestNameParseError::new(full, "suite name is empty"));
        }
        if dot + 1 == full.len() {
            return Err(TestNameParseError::new(full, "case name is empty"));
        }
        Ok(Self { full, dot })
    }

    /// Creates a name out of a suite and a case.
    pub fn from_parts(suite: &str, case: &str) -> Result<Self, TestNameParseError> {
        if suite.contains('.') {
            return Err(TestNameParseError::new(
                format!("{suite}.{case}"),
                "suite name contains `.`",
            ));
        }
        Self::new(format!("{suite}.{case}"))
    }

    /// Returns the fully qualified name.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// Returns the suite: the part of the name before the first `.`.
    #[inline]
    pub fn suite(&self) -> &str {
        &self.full[..self.dot]
    }

    /// Returns the case: the part of the name after the first `.`.
    #[inline]
    pub fn case(&self) -> &str {
        &self.full[self.dot + 1..]
    }
}

impl fmt::Display for TestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl FromStr for TestName {
    type Err = TestNameParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for TestName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.full)
    }
}

/// A single test inside a GoogleTest executable.
///
/// Two test cases are the same if they have the same name and belong to the same executable.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestCase {
    /// The executable containing this test.
    pub executable: Utf8PathBuf,

    /// The fully qualified name of the test.
    pub name: TestName,
}

impl TestCase {
    /// Creates a new test case.
    pub fn new(executable: impl Into<Utf8PathBuf>, name: TestName) -> Self {
        Self {
            executable: executable.into(),
            name,
        }
    }

    /// Returns the suite this test belongs to.
    #[inline]
    pub fn suite(&self) -> &str {
        self.name.suite()
    }

    /// Returns the name shown to users, which is the fully qualified name.
    #[inline]
    pub fn display_name(&self) -> &str {
        self.name.as_str()
    }
}

/// Enumerates the tests inside an executable.
pub trait TestDiscoverer {
    /// Returns every test case in `executable`, in the order the executable reports them.
    fn discover(&self, executable: &Utf8Path) -> Result<Vec<TestCase>, DiscoverError>;
}

/// A [`TestDiscoverer`] that runs the executable with `--gtest_list_tests`.
#[derive(Clone, Debug)]
pub struct GtestDiscoverer<R> {
    runner: R,
}

impl<R: ProcessRunner> GtestDiscoverer<R> {
    /// Creates a new discoverer that spawns processes through `runner`.
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: ProcessRunner> TestDiscoverer for GtestDiscoverer<R> {
    fn discover(&self, executable: &Utf8Path) -> Result<Vec<TestCase>, DiscoverError> {
        let command = format!("{executable} {LIST_TESTS_ARG}");
        debug!("listing tests: {command}");

        let output = self
            .runner
            .run(executable_dir(executable), executable, LIST_TESTS_ARG, false)
            .map_err(|error| DiscoverError::Command {
                command: command.clone(),
                error,
            })?;
        let list_output = output.lines.join("\n");
        if output.exit_code != Some(0) {
            return Err(DiscoverError::CommandFailed {
                command,
                exit_code: output.exit_code,
                output: list_output,
            });
        }

        parse_list_output(executable, &list_output)
    }
}

/// Parses the output of `--gtest_list_tests`.
///
/// The output looks like:
///
/// ```text
/// Running main() from gtest_main.cc
/// FooSuite.
///   BarTest
///   BazTest
/// Inst/ParamSuite.
///   Works/0  # GetParam() = 1
/// ```
pub fn parse_list_output(
    executable: &Utf8Path,
    list_output: &str,
) -> Result<Vec<TestCase>, DiscoverError> {
    let mut cases = Vec::new();
    let mut current_suite: Option<&str> = None;

    for line in list_output.lines() {
        let line = strip_comment(line);
        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with(char::is_whitespace) {
            let case = line.trim();
            let Some(suite) = current_suite else {
                return Err(DiscoverError::parse_line(
                    executable,
                    format!("test case `{case}` appeared before any test suite"),
                    list_output,
                ));
            };
            let name = TestName::from_parts(suite, case).map_err(|err| {
                DiscoverError::parse_line(executable, err.to_string(), list_output)
            })?;
            cases.push(TestCase::new(executable, name));
        } else if let Some(suite) = line.strip_suffix('.') {
            // Banners printed by custom main functions can also end with a period.
            if !suite.is_empty() && !suite.contains(char::is_whitespace) {
                current_suite = Some(suite);
            }
        }
    }

    Ok(cases)
}

fn strip_comment(line: &str) -> &str {
    line.split_once("  #")
        .map_or(line, |(before, _)| before)
        .trim_end()
}

/// The format in which to write out a [`TestList`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputFormat {
    /// A human-readable output format.
    Human {
        /// Whether to produce verbose output.
        verbose: bool,
    },

    /// Machine-readable output format.
    Serializable(SerializableFormat),
}

/// A serialized, machine-readable output format.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum SerializableFormat {
    /// JSON with no whitespace.
    Json,
    /// JSON, prettified.
    JsonPretty,
}

impl SerializableFormat {
    fn to_writer(self, value: &impl Serialize, writer: impl Write) -> serde_json::Result<()> {
        match self {
            SerializableFormat::Json => serde_json::to_writer(writer, value),
            SerializableFormat::JsonPretty => serde_json::to_writer_pretty(writer, value),
        }
    }
}

/// The tests discovered across a set of executables.
#[derive(Clone, Debug, Default)]
pub struct TestList {
    executables: IndexMap<Utf8PathBuf, Vec<TestCase>>,
}

impl TestList {
    /// Discovers the tests in each executable. Executables that appear more than once are only
    /// listed once.
    pub fn discover<'a>(
        executables: impl IntoIterator<Item = &'a Utf8Path>,
        discoverer: &dyn TestDiscoverer,
    ) -> Result<Self, DiscoverError> {
        let mut list = IndexMap::new();
        for executable in executables {
            if list.contains_key(executable) {
                continue;
            }
            let cases = discoverer.discover(executable)?;
            list.insert(executable.to_owned(), cases);
        }
        Ok(Self { executables: list })
    }

    /// Returns the total number of tests across all executables.
    pub fn test_count(&self) -> usize {
        self.executables.values().map(Vec::len).sum()
    }

    /// Returns the number of executables in this list.
    pub fn executable_count(&self) -> usize {
        self.executables.len()
    }

    /// Returns every test discovered in `executable`, or `None` if it isn't part of this list.
    pub fn executable_tests(&self, executable: &Utf8Path) -> Option<&[TestCase]> {
        self.executables.get(executable).map(Vec::as_slice)
    }

    /// Iterates over all the tests, executable by executable.
    pub fn iter_tests(&self) -> impl Iterator<Item = &TestCase> + '_ {
        self.executables.values().flatten()
    }

    /// Keeps only the tests selected by `filter`. Executables left without tests stay in the list.
    pub fn apply_filter(&mut self, filter: &TestFilter) {
        if filter.is_all() {
            return;
        }
        for cases in self.executables.values_mut() {
            cases.retain(|case| filter.is_match(case));
        }
    }

    /// Consumes the list, returning the tests grouped by executable.
    pub fn into_executables(self) -> IndexMap<Utf8PathBuf, Vec<TestCase>> {
        self.executables
    }

    /// Outputs this list to the given writer.
    pub fn write(
        &self,
        output_format: OutputFormat,
        writer: impl Write,
        colorize: bool,
    ) -> Result<(), WriteTestListError> {
        match output_format {
            OutputFormat::Human { verbose } => self
                .write_human(writer, verbose, colorize)
                .map_err(WriteTestListError::Io),
            OutputFormat::Serializable(format) => format
                .to_writer(&self.to_summary(), writer)
                .map_err(WriteTestListError::Json),
        }
    }

    /// Outputs this list as a string with the given format.
    pub fn to_string(&self, output_format: OutputFormat) -> Result<String, WriteTestListError> {
        let mut buf = Vec::with_capacity(1024);
        self.write(output_format, &mut buf, false)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn to_summary(&self) -> TestListSummary<'_> {
        let executables = self
            .executables
            .iter()
            .map(|(executable, cases)| {
                let mut suites: IndexMap<&str, Vec<&str>> = IndexMap::new();
                for case in cases {
                    suites
                        .entry(case.suite())
                        .or_default()
                        .push(case.name.case());
                }
                (executable.as_path(), ExecutableSummary { suites })
            })
            .collect();
        TestListSummary {
            test_count: self.test_count(),
            executables,
        }
    }

    fn write_human(&self, mut writer: impl Write, verbose: bool, colorize: bool) -> io::Result<()> {
        let mut styles = NameStyles::default();
        if colorize {
            styles.colorize();
        }

        for (executable, cases) in &self.executables {
            writeln!(writer, "{}:", executable.style(styles.executable))?;
            if verbose {
                writeln!(writer, "  cwd: {}", executable_dir(executable))?;
            }

            if cases.is_empty() {
                writeln!(writer, "    (no tests)")?;
            }
            for case in cases {
                writeln!(writer, "    {}", DisplayTestName::new(&case.name, &styles))?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct TestListSummary<'a> {
    test_count: usize,
    executables: IndexMap<&'a Utf8Path, ExecutableSummary<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct ExecutableSummary<'a> {
    suites: IndexMap<&'a str, Vec<&'a str>>,
}
