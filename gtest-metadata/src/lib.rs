// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Machine-readable metadata for `gtest-run`.
//!
//! At the moment this crate only documents the exit codes that `gtest-run` may produce.

mod exit_codes;

pub use exit_codes::*;
