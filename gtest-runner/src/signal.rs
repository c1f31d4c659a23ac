// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cooperative cancellation of a test run.

use crate::errors::SignalHandlerSetupError;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tracing::debug;

/// A handle used to request that a test run stop.
///
/// Cancellation is cooperative: the [`TestExecutor`](crate::runner::TestExecutor) checks the token
/// before each executable and before each batch. A batch that is already running is not
/// interrupted. Clones share the same state.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    canceled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new token that isn't canceled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Returns true if cancellation was requested.
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

/// The kind of signal handling to set up for a test run.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum SignalHandlerKind {
    /// Cancel the run on Ctrl-C, and on termination signals where the platform has them.
    Standard,

    /// Don't handle any signals. Useful for tests.
    Noop,
}

impl SignalHandlerKind {
    /// Returns a cancellation token that is canceled according to this kind of signal handling.
    ///
    /// The process-wide handler can only be installed once, so `Standard` fails on a second call.
    pub fn build(self) -> Result<CancellationToken, SignalHandlerSetupError> {
        let token = CancellationToken::new();
        match self {
            Self::Standard => {
                let handler_token = token.clone();
                ctrlc::set_handler(move || {
                    debug!("received interrupt, canceling test run");
                    handler_token.cancel();
                })?;
            }
            Self::Noop => {}
        }
        Ok(token)
    }
}
