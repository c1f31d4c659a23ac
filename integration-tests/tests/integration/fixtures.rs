// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino_tempfile::Utf8TempDir;
use gtest_runner::{
    config::{ConfigOverrides, GtestRunnerConfig},
    reporter::{HostReporter, TestResult},
    test_list::TestCase,
};

/// A [`HostReporter`] that records everything it is told.
#[derive(Debug, Default)]
pub(crate) struct RecordingReporter {
    pub(crate) started: Vec<String>,
    pub(crate) finished: Vec<TestResult>,
}

impl HostReporter for RecordingReporter {
    fn test_started(&mut self, test_case: &TestCase) {
        self.started.push(test_case.display_name().to_owned());
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
