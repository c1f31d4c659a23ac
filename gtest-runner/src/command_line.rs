// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Building GoogleTest command lines that stay within the maximum command-line length.
//!
//! The tests to run are passed to the executable through `--gtest_filter`, which takes a
//! `:`-separated list of patterns. Long lists of tests are split across several invocations
//! ("batches"). To keep each invocation short, a suite whose tests are all being run is written as a
//! single `Suite.*` wildcard.

use crate::test_list::{TestCase, TestName};
use camino::Utf8Path;
use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;

/// The default maximum length of a command line, in bytes.
///
/// This is the limit imposed by `cmd.exe` on Windows, and comfortably below the limits of other
/// platforms.
pub const DEFAULT_MAX_COMMAND_LENGTH: usize = 8191;

const FILTER_ARG: &str = "--gtest_filter=";

/// One invocation of a test executable.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestBatch<'a> {
    /// The arguments to pass to the executable.
    pub arguments: String,

    /// The tests selected by `arguments`, in the order their filter tokens appear.
    pub test_cases: Vec<&'a TestCase>,
}

/// Splits a set of tests into length-bounded batches.
#[derive(Clone, Debug)]
pub struct CommandLineBuilder {
    max_command_length: usize,
}

impl Default for CommandLineBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_COMMAND_LENGTH)
    }
}

impl CommandLineBuilder {
    /// Creates a new builder with the given maximum command-line length, in bytes.
    pub fn new(max_command_length: usize) -> Self {
        Self { max_command_length }
    }

    /// Returns the maximum command-line length.
    pub fn max_command_length(&self) -> usize {
        self.max_command_length
    }

    /// Returns the maximum length of the argument string for an executable whose path is
    /// `executable_path_len` bytes long.
    ///
    /// One byte is reserved for the space between the executable and its arguments.
    pub fn argument_budget(&self, executable_path_len: usize) -> usize {
        self.max_command_length
            .saturating_sub(executable_path_len.saturating_add(1))
    }

    /// Splits `cases_to_run` into batches.
    ///
    /// * `run_all` runs every test in the executable, so no filter is emitted.
    /// * `all_cases` is the universe of tests in the executable, used to decide which suites can
    ///   be written as wildcards.
    /// * `output_file` is where the executable writes its XML results.
    ///
    /// Every returned batch begins with the same `--gtest_output` argument. Each test in
    /// `cases_to_run` appears in exactly one batch; duplicates are ignored.
    pub fn build<'a>(
        &self,
        run_all: bool,
        executable_path_len: usize,
        all_cases: &[TestCase],
        cases_to_run: &'a [TestCase],
        output_file: &Utf8Path,
    ) -> Vec<TestBatch<'a>> {
        let output_arg = output_argument(output_file);
        let requested = dedup_by_name(cases_to_run);

        if run_all || requested.is_empty() {
            return vec![TestBatch {
                arguments: output_arg,
                test_cases: requested.into_values().collect(),
            }];
        }

        let tokens = filter_tokens(all_cases, &requested);
        let budget = self.argument_budget(executable_path_len);
        let prefix = format!("{output_arg} {FILTER_ARG}");

        let mut batches = Vec::new();
        let mut arguments = String::new();
        let mut test_cases = Vec::new();
        for FilterToken { token, cases } in tokens {
            // A token always goes into an empty batch, even if it's too long on its own.
            if !test_cases.is_empty() && arguments.len() + 1 + token.len() > budget {
                batches.push(TestBatch {
                    arguments: std::mem::take(&mut arguments),
                    test_cases: std::mem::take(&mut test_cases),
                });
            }

            if test_cases.is_empty() {
                arguments.push_str(&prefix);
            } else {
                arguments.push(':');
            }
            arguments.push_str(&token);
            test_cases.extend(cases);
        }
        if !test_cases.is_empty() {
            batches.push(TestBatch {
                arguments,
                test_cases,
            });
        }

        batches
    }
}

/// Returns the argument that makes GoogleTest write its XML results to `output_file`.
pub fn output_argument(output_file: &Utf8Path) -> String {
    format!("--gtest_output=\"xml:{output_file}\"")
}

#[derive(Debug)]
struct FilterToken<'a> {
    token: String,
    cases: Vec<&'a TestCase>,
}

fn dedup_by_name(cases: &[TestCase]) -> IndexMap<&TestName, &TestCase> {
    let mut requested = IndexMap::with_capacity(cases.len());
    for case in cases {
        requested.entry(&case.name).or_insert(case);
    }
    requested
}

/// Produces wildcard tokens for fully requested suites (in order of first appearance), followed
/// by one token per remaining test (in input order).
fn filter_tokens<'a>(
    all_cases: &[TestCase],
    requested: &IndexMap<&TestName, &'a TestCase>,
) -> Vec<FilterToken<'a>> {
    let mut universe: IndexMap<&str, HashSet<&TestName>> = IndexMap::new();
    for case in all_cases {
        universe.entry(case.suite()).or_default().insert(&case.name);
    }

    let mut wildcard_suites: IndexSet<&str> = IndexSet::new();
    let mut seen_suites: HashSet<&str> = HashSet::new();
    for name in requested.keys() {
        let suite = name.suite();
        if !seen_suites.insert(suite) {
            continue;
        }
        let fully_requested = universe.get(suite).is_some_and(|names| {
            !names.is_empty() && names.iter().all(|name| requested.contains_key(*name))
        });
        if fully_requested {
            wildcard_suites.insert(suite);
        }
    }

    let mut tokens: Vec<FilterToken<'a>> = wildcard_suites
        .iter()
        .map(|suite| FilterToken {
            token: format!("{suite}.*"),
            cases: Vec::new(),
        })
        .collect();
    for (name, &case) in requested {
        match wildcard_suites.get_index_of(name.suite()) {
            Some(index) => tokens[index].cases.push(case),
            None => tokens.push(FilterToken {
                token: name.to_string(),
                cases: vec![case],
            }),
        }
    }

    tokens
}
