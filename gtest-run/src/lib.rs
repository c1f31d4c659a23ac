// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs GoogleTest executables in batches that fit within the maximum command-line length, and
//! reports one result per test even if an executable crashes partway through.
//!
//! The core logic lives in the [`gtest_runner`] crate. This crate is the command-line front end.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::{OutputContext, StderrStyles};
