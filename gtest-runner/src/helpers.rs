// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for gtest-runner.

use crate::test_list::TestName;
use owo_colors::{OwoColorize, Style};
use std::{fmt, time::Duration};

/// Utilities for pluralizing various words based on count.
pub mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "executable" if `count` is 1, otherwise "executables".
    pub fn executables_str(count: usize) -> &'static str {
        if count == 1 {
            "executable"
        } else {
            "executables"
        }
    }

    /// Returns "batch" if `count` is 1, otherwise "batches".
    pub fn batches_str(count: usize) -> &'static str {
        if count == 1 { "batch" } else { "batches" }
    }
}

/// Styles used to display test names.
#[derive(Clone, Debug, Default)]
pub(crate) struct NameStyles {
    pub(crate) executable: Style,
    pub(crate) suite: Style,
    pub(crate) test_name: Style,
}

impl NameStyles {
    pub(crate) fn colorize(&mut self) {
        self.executable = Style::new().magenta().bold();
        self.suite = Style::new().cyan();
        self.test_name = Style::new().blue().bold();
    }
}

/// Wrapper for displaying a test name with styling.
pub(crate) struct DisplayTestName<'a> {
    name: &'a TestName,
    styles: &'a NameStyles,
}

impl<'a> DisplayTestName<'a> {
    pub(crate) fn new(name: &'a TestName, styles: &'a NameStyles) -> Self {
        Self { name, styles }
    }
}

impl fmt::Display for DisplayTestName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.name.suite().style(self.styles.suite),
            ".".style(self.styles.suite),
            self.name.case().style(self.styles.test_name),
        )
    }
}

/// Formats a duration as seconds with millisecond precision, e.g. `[   0.004s]`.
pub(crate) struct DisplayDuration(pub(crate) Option<Duration>);

impl fmt::Display for DisplayDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(duration) => write!(f, "[{:>8.3}s]", duration.as_secs_f64()),
            None => write!(f, "[{:>9}]", "-"),
        }
    }
}

/// Writes an error along with its chain of sources, one per line.
pub(crate) struct DisplayErrorChain<'a>(pub(crate) &'a dyn std::error::Error);

impl fmt::Display for DisplayErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(error) = source {
            write!(f, "\n  caused by: {error}")?;
            source = error.source();
        }
        Ok(())
    }
}
