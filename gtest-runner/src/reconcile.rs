// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Merging results from the XML result file and the console output.
//!
//! Neither source is guaranteed to be complete. The XML file is only written once the executable
//! finishes, and console output can be interleaved or cut short. Reconciliation produces exactly
//! one result per expected test case: XML results are preferred, console results fill the gaps,
//! and anything still missing is reported as [`TestOutcome::NotFound`].

use crate::{
    reporter::{TestOutcome, TestResult},
    test_list::{TestCase, TestName},
};
use std::collections::HashSet;
use tracing::warn;

/// Returns the name of this computer, used to annotate results.
///
/// Logs a warning and returns `None` if the name can't be determined.
pub fn local_computer_name() -> Option<String> {
    match whoami::hostname() {
        Ok(name) => Some(name),
        Err(error) => {
            warn!("unable to determine the host name: {error}");
            None
        }
    }
}

/// Produces exactly one result for each of `expected_cases`, in this order:
///
/// 1. `xml_results`, minus duplicates and results for unexpected tests.
/// 2. `console_results` for tests that don't have a result yet.
/// 3. A [`TestOutcome::NotFound`] result for every remaining test. If `crashed_test` is set, the
///    message names it as the likely cause.
///
/// Results without a computer name get `computer_name`.
pub fn reconcile(
    expected_cases: &[TestCase],
    xml_results: Vec<TestResult>,
    console_results: Vec<TestResult>,
    crashed_test: Option<&TestCase>,
    computer_name: Option<&str>,
) -> Vec<TestResult> {
    let expected: HashSet<&TestName> = expected_cases.iter().map(|case| &case.name).collect();
    let mut seen: HashSet<TestName> = HashSet::with_capacity(expected.len());
    let mut results = Vec::with_capacity(expected.len());

    for result in xml_results.into_iter().chain(console_results) {
        if expected.contains(&result.test_case.name) && seen.insert(result.test_case.name.clone())
        {
            results.push(result);
        }
    }

    let message = crashed_test
        .map(|case| format!("probably crash of test {}", case.display_name()))
        .unwrap_or_default();
    for case in expected_cases {
        if seen.insert(case.name.clone()) {
            results.push(TestResult::new(
                case.clone(),
                TestOutcome::NotFound {
                    message: message.clone(),
                },
                None,
            ));
        }
    }

    if let Some(computer_name) = computer_name {
        for result in &mut results {
            result
                .computer_name
                .get_or_insert_with(|| computer_name.to_owned());
        }
    }

    results
}
