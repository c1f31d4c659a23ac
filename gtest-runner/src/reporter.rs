// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test results and the host-facing reporter interface.
//!
//! The main structure in this module is [`ConsoleReporter`], a [`HostReporter`] that writes
//! per-test status lines and a final summary.

use crate::{
    helpers::{DisplayDuration, DisplayTestName, NameStyles, plural},
    test_list::TestCase,
};
use owo_colors::{OwoColorize, Style};
use std::{io, io::Write, time::Duration};
use tracing::warn;

/// The outcome of a single test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TestOutcome {
    /// The test passed.
    Passed,

    /// The test failed.
    Failed {
        /// The failure messages reported by the test.
        message: String,
    },

    /// The test was disabled or skipped itself.
    Skipped,

    /// No result could be found for the test, usually because the executable crashed.
    NotFound {
        /// An explanation of why the result is missing. May be empty.
        message: String,
    },
}

impl TestOutcome {
    /// Returns true if this outcome doesn't indicate a problem.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Passed | Self::Skipped)
    }

    /// Returns the message attached to this outcome, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Failed { message } | Self::NotFound { message } => Some(message),
            Self::Passed | Self::Skipped => None,
        }
    }
}

/// The result of a single test, as handed to a [`HostReporter`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestResult {
    /// The test this result is for.
    pub test_case: TestCase,

    /// The outcome.
    pub outcome: TestOutcome,

    /// How long the test took. Never shorter than 1 ms when set, and unset if unknown.
    pub duration: Option<Duration>,

    /// The host the test ran on, if recorded.
    pub computer_name: Option<String>,
}

impl TestResult {
    /// Creates a new result without a computer name.
    pub fn new(test_case: TestCase, outcome: TestOutcome, duration: Option<Duration>) -> Self {
        Self {
            test_case,
            outcome,
            duration,
            computer_name: None,
        }
    }
}

/// Receives test lifecycle events.
pub trait HostReporter {
    /// Called once for each test, before any batch of its executable runs.
    fn test_started(&mut self, test_case: &TestCase);

    /// Called exactly once for each test with its final result.
    fn test_finished(&mut self, result: &TestResult);
}

/// Statistics for a test run.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct RunStats {
    /// The number of tests that were started.
    pub started: usize,

    /// The number of tests that finished, across all outcomes.
    pub finished: usize,

    /// The number of tests that passed.
    pub passed: usize,

    /// The number of tests that failed.
    pub failed: usize,

    /// The number of tests that were skipped.
    pub skipped: usize,

    /// The number of tests for which no result was found.
    pub not_found: usize,
}

impl RunStats {
    /// Returns true if no tests failed or went missing, and every started test finished.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.not_found == 0 && self.finished >= self.started
    }

    fn on_test_finished(&mut self, outcome: &TestOutcome) {
        self.finished += 1;
        match outcome {
            TestOutcome::Passed => self.passed += 1,
            TestOutcome::Failed { .. } => self.failed += 1,
            TestOutcome::Skipped => self.skipped += 1,
            TestOutcome::NotFound { .. } => self.not_found += 1,
        }
    }
}

#[derive(Debug, Default)]
struct Styles {
    count: Style,
    pass: Style,
    fail: Style,
    skip: Style,
    fail_output: Style,
    names: NameStyles,
}

impl Styles {
    fn colorize(&mut self) {
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.skip = Style::new().yellow().bold();
        self.fail_output = Style::new().magenta();
        self.names.colorize();
    }
}

/// A [`HostReporter`] that writes status lines to a writer, typically stderr.
#[derive(Debug)]
pub struct ConsoleReporter<W> {
    writer: W,
    styles: Box<Styles>,
    stats: RunStats,
    failing: Vec<(TestCase, &'static str)>,
}

impl<W: Write> ConsoleReporter<W> {
    /// Creates a new reporter writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            styles: Box::default(),
            stats: RunStats::default(),
            failing: Vec::new(),
        }
    }

    /// Colorizes output.
    pub fn colorize(&mut self) -> &mut Self {
        self.styles.colorize();
        self
    }

    /// Returns the statistics collected so far.
    pub fn run_stats(&self) -> RunStats {
        self.stats
    }

    /// Writes the final summary, including a list of tests that didn't succeed.
    pub fn write_summary(&mut self, canceled: bool) -> io::Result<()> {
        let stats = self.stats;
        let summary_style = if stats.is_success() && !canceled {
            self.styles.pass
        } else {
            self.styles.fail
        };
        writeln!(self.writer, "------------")?;
        write!(
            self.writer,
            "{:>12} {} {} run: {} {}",
            "Summary".style(summary_style),
            stats.finished.style(self.styles.count),
            plural::tests_str(stats.finished),
            stats.passed.style(self.styles.count),
            "passed".style(self.styles.pass),
        )?;
        for (count, label, style) in [
            (stats.failed, "failed", self.styles.fail),
            (stats.not_found, "not found", self.styles.fail),
            (stats.skipped, "skipped", self.styles.skip),
        ] {
            if count > 0 {
                write!(
                    self.writer,
                    ", {} {}",
                    count.style(self.styles.count),
                    label.style(style)
                )?;
            }
        }
        if canceled {
            let remaining = stats.started.saturating_sub(stats.finished);
            write!(
                self.writer,
                "; {} {} not run (canceled)",
                remaining.style(self.styles.count),
                plural::tests_str(remaining),
            )?;
        }
        writeln!(self.writer)?;

        for (test_case, label) in &self.failing {
            writeln!(
                self.writer,
                "{:>12} {}",
                label.style(self.styles.fail),
                DisplayTestName::new(&test_case.name, &self.styles.names),
            )?;
        }
        self.writer.flush()
    }

    fn write_finished(&mut self, result: &TestResult) -> io::Result<()> {
        let (label, style) = match &result.outcome {
            TestOutcome::Passed => ("PASS", self.styles.pass),
            TestOutcome::Failed { .. } => ("FAIL", self.styles.fail),
            TestOutcome::Skipped => ("SKIP", self.styles.skip),
            TestOutcome::NotFound { .. } => ("NOT FOUND", self.styles.fail),
        };
        writeln!(
            self.writer,
            "{:>12} {} {}",
            label.style(style),
            DisplayDuration(result.duration),
            DisplayTestName::new(&result.test_case.name, &self.styles.names),
        )?;

        if let Some(message) = result.outcome.message().filter(|m| !m.is_empty()) {
            for line in message.lines() {
                writeln!(
                    self.writer,
                    "{:>12} {}",
                    "",
                    line.style(self.styles.fail_output)
                )?;
            }
        }

        if !result.outcome.is_success() {
            self.failing.push((result.test_case.clone(), label));
        }
        Ok(())
    }
}

impl<W: Write> HostReporter for ConsoleReporter<W> {
    fn test_started(&mut self, _test_case: &TestCase) {
        self.stats.started += 1;
    }

    fn test_finished(&mut self, result: &TestResult) {
        self.stats.on_test_finished(&result.outcome);
        if let Err(error) = self.write_finished(result) {
            warn!("failed to write test result: {error}");
        }
    }
}
