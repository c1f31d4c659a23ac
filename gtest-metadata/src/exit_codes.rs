// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `gtest-run` failures.
///
/// `gtest-run` invocations may fail for a variety of reasons. This structure documents the exit
/// codes that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum GtestExitCode {}

impl GtestExitCode {
    /// No errors occurred and `gtest-run` exited normally.
    pub const OK: i32 = 0;

    /// No tests were selected to run, but no other errors occurred.
    pub const NO_TESTS_RUN: i32 = 4;

    /// A user issue happened while setting up a `gtest-run` invocation, e.g. a bad config file.
    pub const SETUP_ERROR: i32 = 96;

    /// One or more tests failed, were not found in the results, or the run was canceled.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// Listing the tests in a test executable produced an error.
    pub const TEST_LIST_CREATION_FAILED: i32 = 104;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
