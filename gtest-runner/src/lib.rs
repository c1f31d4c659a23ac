// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for running [GoogleTest](https://github.com/google/googletest) executables.
//!
//! The basic flow of operations is:
//!
//! 1. Test cases are discovered from an executable with a [`TestDiscoverer`](test_list::TestDiscoverer).
//! 2. The [`TestExecutor`](runner::TestExecutor) groups the requested test cases by executable and
//!    uses a [`CommandLineBuilder`](command_line::CommandLineBuilder) to split them into batches that
//!    fit within the maximum command-line length.
//! 3. Each batch is run through a [`ProcessRunner`](process::ProcessRunner).
//! 4. The XML result file and the console output are parsed, and the two sources are
//!    [reconciled](reconcile::reconcile) into exactly one result per test case, which is then handed
//!    to a [`HostReporter`](reporter::HostReporter).

pub mod command_line;
pub mod config;
pub mod console_output;
pub mod errors;
pub mod helpers;
pub mod process;
pub mod reconcile;
pub mod reporter;
pub mod result_xml;
pub mod runner;
pub mod signal;
pub mod test_filter;
pub mod test_list;
