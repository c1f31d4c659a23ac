// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recovering test results from the console output of a GoogleTest executable.
//!
//! This is a fallback for when the XML result file is missing or incomplete, which usually means
//! that the executable crashed. The console output still shows which tests finished and which test
//! was running when the crash happened.

use crate::{
    reporter::{TestOutcome, TestResult},
    result_xml::MIN_DURATION,
    test_list::TestCase,
};
use std::{cmp, collections::HashMap, time::Duration};
use tracing::debug;

const RUN: &str = "[ RUN      ]";
const OK: &str = "[       OK ]";
const FAILED: &str = "[  FAILED  ]";
const SKIPPED: &str = "[  SKIPPED ]";

/// The message prefix for the test that was running when the output ended.
pub const CRASH_MESSAGE: &str = "!! This is probably the test that crashed !!";

/// Results recovered from console output.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConsoleResults {
    /// Results for tests that are in the expected cases, in the order they finished.
    pub results: Vec<TestResult>,

    /// The test that started but never finished, if it is one of the expected cases.
    pub crashed_test: Option<TestCase>,
}

#[derive(Debug)]
struct RunningTest<'a> {
    name: &'a str,
    output: Vec<&'a str>,
}

/// Parses the console output of a test run. Lines that can't be interpreted are ignored.
pub fn parse_console_output<S: AsRef<str>>(
    lines: &[S],
    expected_cases: &[TestCase],
) -> ConsoleResults {
    let expected: HashMap<&str, &TestCase> = expected_cases
        .iter()
        .map(|case| (case.display_name(), case))
        .collect();

    let mut results = Vec::new();
    let mut running: Option<RunningTest<'_>> = None;

    for line in lines {
        let line = line.as_ref();
        if let Some(rest) = line.strip_prefix(RUN) {
            if let Some(previous) = &running {
                debug!(
                    "test `{}` started before `{}` finished, ignoring the latter",
                    test_name(rest),
                    previous.name
                );
            }
            running = Some(RunningTest {
                name: test_name(rest),
                output: Vec::new(),
            });
            continue;
        }

        let Some(test) = &mut running else {
            // Includes the list of failed tests printed at the end of the run.
            continue;
        };
        match end_marker(line) {
            Some((kind, rest)) if test_name(rest) == test.name => {
                if let Some(&case) = expected.get(test.name) {
                    let outcome = match kind {
                        EndKind::Ok => TestOutcome::Passed,
                        EndKind::Failed => TestOutcome::Failed {
                            message: test.output.join("\n"),
                        },
                        EndKind::Skipped => TestOutcome::Skipped,
                    };
                    results.push(TestResult::new(
                        case.clone(),
                        outcome,
                        Some(parse_duration(rest)),
                    ));
                }
                running = None;
            }
            _ => test.output.push(line),
        }
    }

    let mut crashed_test = None;
    if let Some(test) = running {
        if let Some(&case) = expected.get(test.name) {
            let mut message = CRASH_MESSAGE.to_owned();
            for line in &test.output {
                message.push('\n');
                message.push_str(line);
            }
            results.push(TestResult::new(
                case.clone(),
                TestOutcome::Failed { message },
                None,
            ));
            crashed_test = Some(case.clone());
        }
    }

    ConsoleResults {
        results,
        crashed_test,
    }
}

#[derive(Copy, Clone, Debug)]
enum EndKind {
    Ok,
    Failed,
    Skipped,
}

fn end_marker(line: &str) -> Option<(EndKind, &str)> {
    [
        (OK, EndKind::Ok),
        (FAILED, EndKind::Failed),
        (SKIPPED, EndKind::Skipped),
    ]
    .into_iter()
    .find_map(|(marker, kind)| line.strip_prefix(marker).map(|rest| (kind, rest)))
}

/// Extracts the name from the text after a marker. Parameterized tests print
/// `Suite.Case/0, where GetParam() = 1`, so the name ends at the first space or comma.
fn test_name(rest: &str) -> &str {
    rest.trim_start()
        .split([' ', ','])
        .next()
        .unwrap_or_default()
}

/// Parses the trailing `(N ms)` of an end marker.
fn parse_duration(rest: &str) -> Duration {
    let millis = rest
        .trim_end()
        .strip_suffix(" ms)")
        .and_then(|rest| rest.rsplit_once('('))
        .and_then(|(_, millis)| millis.parse::<u64>().ok());
    match millis {
        Some(millis) => cmp::max(Duration::from_millis(millis), MIN_DURATION),
        None => MIN_DURATION,
    }
}
