// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Selecting tests by name.
//!
//! Patterns are globs matched against the full `Suite.Case` name. Unlike GoogleTest's own
//! `--gtest_filter`, `*` also matches `/`, so `Inst/*` selects every instantiation of a
//! parameterized suite.

use crate::{errors::TestFilterBuildError, test_list::TestCase};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// A filter over test names, built from zero or more glob patterns.
#[derive(Clone, Debug)]
pub struct TestFilter {
    // None means that every test matches.
    globs: Option<GlobSet>,
}

impl TestFilter {
    /// Builds a filter. A test matches if any pattern matches its name. With no patterns, every
    /// test matches.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, TestFilterBuildError> {
        if patterns.is_empty() {
            return Ok(Self::all());
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = GlobBuilder::new(pattern)
                // Only allow escapes via [].
                .backslash_escape(false)
                .build()
                .map_err(|error| TestFilterBuildError::new(pattern, error))?;
            builder.add(glob);
        }
        let globs = builder
            .build()
            .map_err(|error| TestFilterBuildError::new(patterns_str(patterns), error))?;
        Ok(Self { globs: Some(globs) })
    }

    /// Returns a filter that matches every test.
    pub fn all() -> Self {
        Self { globs: None }
    }

    /// Returns true if this filter matches every test.
    pub fn is_all(&self) -> bool {
        self.globs.is_none()
    }

    /// Returns true if `test_case` is selected by this filter.
    pub fn is_match(&self, test_case: &TestCase) -> bool {
        match &self.globs {
            Some(globs) => globs.is_match(test_case.display_name()),
            None => true,
        }
    }
}

fn patterns_str<S: AsRef<str>>(patterns: &[S]) -> String {
    patterns
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}
