// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use color_eyre::Result;
use gtest_metadata::GtestExitCode;
use gtest_run::GtestRunApp;

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = enable_ansi_support::enable_ansi_support();

    let opts = GtestRunApp::parse();
    let output = opts.init_output();

    match opts.exec(output) {
        Ok(()) => std::process::exit(GtestExitCode::OK),
        Err(error) => {
            error.display_to_stderr(&output.stderr_styles());
            std::process::exit(error.process_exit_code())
        }
    }
}
