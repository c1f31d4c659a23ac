// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino::Utf8Path;
use color_eyre::eyre::{Result, ensure};
use gtest_runner::{
    config::GtestRunnerConfig,
    console_output::CRASH_MESSAGE,
    reporter::{ConsoleReporter, TestOutcome},
    result_xml::MIN_DURATION,
    runner::{RunSummary, TestExecutor},
    signal::{CancellationToken, SignalHandlerKind},
    test_list::{GtestDiscoverer, TestList},
};
use pretty_assertions::assert_eq;

#[test]
fn runs_selected_tests_with_suite_wildcards() -> Result<()> {
    let runner = FakeRunner::default().with_executable(
        "/fake/alpha",
        &[
            ("Math.Add", FixtureStatus::Pass),
            ("Math.Sub", FixtureStatus::Fail),
            ("Str.Len", FixtureStatus::Skip),
            ("Str.Cat", FixtureStatus::Pass),
        ],
    );
    let discoverer = GtestDiscoverer::new(&runner);
    let mut executor = TestExecutor::new(
        &discoverer,
        &runner,
        &GtestRunnerConfig::default(),
        SignalHandlerKind::Noop.build()?,
    );
    executor.set_computer_name(Some("testhost".to_owned()));

    let cases = vec![
        test_case("/fake/alpha", "Math.Add"),
        test_case("/fake/alpha", "Math.Sub"),
        test_case("/fake/alpha", "Str.Len"),
    ];
    let mut reporter = RecordingReporter::default();
    let summary = executor.run_tests(&cases, &mut reporter);

    assert_eq!(
        summary,
        RunSummary {
            executables_run: 1,
            executables_failed: 0,
            canceled: false,
        }
    );
    assert_eq!(filters(&runner), vec!["--gtest_filter=Math.*:Str.Len"]);
    assert_eq!(
        reporter.started,
        vec![
            "/fake/alpha:Math.Add",
            "/fake/alpha:Math.Sub",
            "/fake/alpha:Str.Len"
        ]
    );
    assert_eq!(
        reporter.outcomes(),
        vec![
            ("/fake/alpha:Math.Add".to_owned(), TestOutcome::Passed),
            (
                "/fake/alpha:Math.Sub".to_owned(),
                TestOutcome::Failed {
                    message: "Math.Sub went wrong".to_owned()
                }
            ),
            ("/fake/alpha:Str.Len".to_owned(), TestOutcome::Skipped),
        ]
    );
    for result in &reporter.finished {
        ensure!(
            result.duration.is_some_and(|d| d >= MIN_DURATION),
            "XML results carry a duration: {result:?}"
        );
        ensure!(
            result.computer_name.as_deref() == Some("testhost"),
            "results carry the computer name: {result:?}"
        );
    }

    Ok(())
}

#[test]
fn run_executables_passes_no_filter() -> Result<()> {
    let runner = FakeRunner::default().with_executable(
        "/fake/alpha",
        &[
            ("Math.Add", FixtureStatus::Pass),
            ("Math.Sub", FixtureStatus::Pass),
        ],
    );
    let discoverer = GtestDiscoverer::new(&runner);
    let executor = TestExecutor::new(
        &discoverer,
        &runner,
        &config_with_max_length(1),
        SignalHandlerKind::Noop.build()?,
    );

    let mut reporter = RecordingReporter::default();
    let summary = executor.run_executables(
        [Utf8Path::new("/fake/alpha"), Utf8Path::new("/fake/alpha")],
        &mut reporter,
    );

    assert!(summary.is_success());
    assert_eq!(summary.executables_run, 1, "duplicate executables run once");
    let invocations = runner.invocations();
    assert_eq!(invocations.len(), 1, "no filter means a single batch");
    ensure!(
        !invocations[0].1.contains("--gtest_filter"),
        "unexpected filter in {:?}",
        invocations[0].1
    );
    assert_eq!(
        reporter.outcomes(),
        vec![
            ("/fake/alpha:Math.Add".to_owned(), TestOutcome::Passed),
            ("/fake/alpha:Math.Sub".to_owned(), TestOutcome::Passed),
        ]
    );

    Ok(())
}

#[test]
fn repeated_test_is_started_and_finished_once() -> Result<()> {
    let runner = FakeRunner::default().with_executable(
        "/fake/alpha",
        &[
            ("Math.Add", FixtureStatus::Pass),
            ("Math.Sub", FixtureStatus::Pass),
        ],
    );
    let discoverer = GtestDiscoverer::new(&runner);
    let executor = TestExecutor::new(
        &discoverer,
        &runner,
        &GtestRunnerConfig::default(),
        SignalHandlerKind::Noop.build()?,
    );
    let cases = vec![
        test_case("/fake/alpha", "Math.Add"),
        test_case("/fake/alpha", "Math.Add"),
    ];

    let mut reporter = RecordingReporter::default();
    let summary = executor.run_tests(&cases, &mut reporter);
    assert!(summary.is_success());
    assert_eq!(filters(&runner), vec!["--gtest_filter=Math.Add"]);
    assert_eq!(reporter.started, vec!["/fake/alpha:Math.Add"]);
    assert_eq!(
        reporter.outcomes(),
        vec![("/fake/alpha:Math.Add".to_owned(), TestOutcome::Passed)]
    );

    let mut console = ConsoleReporter::new(Vec::new());
    executor.run_tests(&cases, &mut console);
    let stats = console.run_stats();
    assert_eq!((stats.started, stats.finished, stats.passed), (1, 1, 1));
    assert!(stats.is_success(), "no test is left without a result");

    Ok(())
}

#[test]
fn discovered_list_is_not_listed_again() -> Result<()> {
    let runner = FakeRunner::default()
        .with_executable(
            "/fake/alpha",
            &[
                ("Math.Add", FixtureStatus::Pass),
                ("Math.Sub", FixtureStatus::Pass),
                ("Str.Len", FixtureStatus::Pass),
            ],
        )
        .with_executable("/fake/beta", &[("Net.Ping", FixtureStatus::Pass)]);
    let discoverer = GtestDiscoverer::new(&runner);
    let executor = TestExecutor::new(
        &discoverer,
        &runner,
        &GtestRunnerConfig::default(),
        SignalHandlerKind::Noop.build()?,
    );

    let test_list = TestList::discover([Utf8Path::new("/fake/alpha")], &discoverer)?;
    assert_eq!(runner.listings(), 1);

    let cases = vec![
        test_case("/fake/alpha", "Math.Add"),
        test_case("/fake/alpha", "Math.Sub"),
        test_case("/fake/beta", "Net.Ping"),
    ];
    let mut reporter = RecordingReporter::default();
    let summary = executor.run_tests_in(&test_list, &cases, &mut reporter);

    assert!(summary.is_success());
    // Only the executable missing from the list is listed again.
    assert_eq!(runner.listings(), 2);
    assert_eq!(
        filters(&runner),
        vec!["--gtest_filter=Math.*", "--gtest_filter=Net.*"]
    );
    assert_eq!(reporter.finished.len(), 3);

    Ok(())
}

#[test]
fn crashed_test_is_identified_from_console_output() -> Result<()> {
    let runner = FakeRunner::default().with_executable(
        "/fake/crashy",
        &[
            ("Boom.First", FixtureStatus::Pass),
            ("Boom.Second", FixtureStatus::Crash),
            ("Boom.Third", FixtureStatus::Pass),
        ],
    );
    let discoverer = GtestDiscoverer::new(&runner);
    let mut executor = TestExecutor::new(
        &discoverer,
        &runner,
        &GtestRunnerConfig::default(),
        SignalHandlerKind::Noop.build()?,
    );
    executor.set_computer_name(Some("testhost".to_owned()));

    let mut reporter = RecordingReporter::default();
    let summary = executor.run_executables([Utf8Path::new("/fake/crashy")], &mut reporter);

    // The executable ran and every test was accounted for, even though some of them failed.
    assert!(summary.is_success());
    assert_eq!(
        reporter.outcomes(),
        vec![
            ("/fake/crashy:Boom.First".to_owned(), TestOutcome::Passed),
            (
                "/fake/crashy:Boom.Second".to_owned(),
                TestOutcome::Failed {
                    message: format!("{CRASH_MESSAGE}\nSegmentation fault"),
                }
            ),
            (
                "/fake/crashy:Boom.Third".to_owned(),
                TestOutcome::NotFound {
                    message: "probably crash of test Boom.Second".to_owned(),
                }
            ),
        ]
    );

    let durations: Vec<_> = reporter.finished.iter().map(|r| r.duration).collect();
    assert_eq!(
        durations,
        vec![Some(std::time::Duration::from_millis(3)), None, None]
    );
    ensure!(
        reporter
            .finished
            .iter()
            .all(|r| r.computer_name.as_deref() == Some("testhost")),
        "synthesized results carry the computer name too"
    );

    Ok(())
}

#[test]
fn batches_are_reconciled_independently() -> Result<()> {
    let runner = FakeRunner::default().with_executable(
        "/fake/multi",
        &[
            ("A.One", FixtureStatus::Pass),
            ("B.One", FixtureStatus::Crash),
            ("B.Two", FixtureStatus::Pass),
            ("C.One", FixtureStatus::Pass),
        ],
    );
    let discoverer = GtestDiscoverer::new(&runner);
    // Every filter token ends up in its own batch.
    let executor = TestExecutor::new(
        &discoverer,
        &runner,
        &config_with_max_length(1),
        SignalHandlerKind::Noop.build()?,
    );

    let cases = vec![
        test_case("/fake/multi", "A.One"),
        test_case("/fake/multi", "B.One"),
        test_case("/fake/multi", "B.Two"),
        test_case("/fake/multi", "C.One"),
    ];
    let mut reporter = RecordingReporter::default();
    let summary = executor.run_tests(&cases, &mut reporter);

    assert!(summary.is_success());
    assert_eq!(
        filters(&runner),
        vec![
            "--gtest_filter=A.*",
            "--gtest_filter=B.*",
            "--gtest_filter=C.*"
        ]
    );
    assert_eq!(
        reporter.outcomes(),
        vec![
            ("/fake/multi:A.One".to_owned(), TestOutcome::Passed),
            (
                "/fake/multi:B.One".to_owned(),
                TestOutcome::Failed {
                    message: format!("{CRASH_MESSAGE}\nSegmentation fault"),
                }
            ),
            (
                "/fake/multi:B.Two".to_owned(),
                TestOutcome::NotFound {
                    message: "probably crash of test B.One".to_owned(),
                }
            ),
            ("/fake/multi:C.One".to_owned(), TestOutcome::Passed),
        ]
    );

    Ok(())
}

#[test]
fn cancellation_stops_before_next_batch() -> Result<()> {
    let token = CancellationToken::new();
    let runner = FakeRunner::default()
        .with_executable(
            "/fake/first",
            &[
                ("A.One", FixtureStatus::Pass),
                ("B.One", FixtureStatus::Pass),
            ],
        )
        .with_executable("/fake/second", &[("C.One", FixtureStatus::Pass)])
        .cancel_after(1, token.clone());
    let discoverer = GtestDiscoverer::new(&runner);
    let executor = TestExecutor::new(&discoverer, &runner, &config_with_max_length(1), token);

    let cases = vec![
        test_case("/fake/first", "A.One"),
        test_case("/fake/first", "B.One"),
        test_case("/fake/second", "C.One"),
    ];
    let mut reporter = RecordingReporter::default();
    let summary = executor.run_tests(&cases, &mut reporter);

    assert_eq!(
        summary,
        RunSummary {
            executables_run: 0,
            executables_failed: 0,
            canceled: true,
        }
    );
    assert_eq!(filters(&runner), vec!["--gtest_filter=A.*"]);
    assert_eq!(
        reporter.outcomes(),
        vec![("/fake/first:A.One".to_owned(), TestOutcome::Passed)]
    );
    assert_eq!(
        reporter.started,
        vec!["/fake/first:A.One", "/fake/first:B.One"],
        "the second executable was never started"
    );

    Ok(())
}

#[test]
fn error_in_one_executable_does_not_stop_the_others() -> Result<()> {
    let runner =
        FakeRunner::default().with_executable("/fake/good", &[("G.One", FixtureStatus::Pass)]);
    let discoverer = GtestDiscoverer::new(&runner);
    let executor = TestExecutor::new(
        &discoverer,
        &runner,
        &GtestRunnerConfig::default(),
        SignalHandlerKind::Noop.build()?,
    );

    let cases = vec![
        test_case("/fake/missing", "M.One"),
        test_case("/fake/good", "G.One"),
    ];
    let mut reporter = RecordingReporter::default();
    let summary = executor.run_tests(&cases, &mut reporter);

    assert_eq!(
        summary,
        RunSummary {
            executables_run: 1,
            executables_failed: 1,
            canceled: false,
        }
    );
    assert_eq!(
        reporter.outcomes(),
        vec![("/fake/good:G.One".to_owned(), TestOutcome::Passed)]
    );

    // Listing failures are skipped entirely when running whole executables.
    let mut reporter = RecordingReporter::default();
    let summary = executor.run_executables(
        [Utf8Path::new("/fake/missing"), Utf8Path::new("/fake/good")],
        &mut reporter,
    );
    assert_eq!(summary.executables_run, 1);
    assert_eq!(summary.executables_failed, 1);
    assert_eq!(reporter.started, vec!["/fake/good:G.One"]);

    Ok(())
}

#[test]
fn unknown_status_aborts_remaining_batches_of_executable() -> Result<()> {
    let runner = FakeRunner::default()
        .with_executable(
            "/fake/odd",
            &[
                ("A.One", FixtureStatus::UnknownStatus),
                ("B.One", FixtureStatus::Pass),
            ],
        )
        .with_executable("/fake/fine", &[("F.One", FixtureStatus::Pass)]);
    let discoverer = GtestDiscoverer::new(&runner);
    let executor = TestExecutor::new(
        &discoverer,
        &runner,
        &config_with_max_length(1),
        SignalHandlerKind::Noop.build()?,
    );

    let cases = vec![
        test_case("/fake/odd", "A.One"),
        test_case("/fake/odd", "B.One"),
        test_case("/fake/fine", "F.One"),
    ];
    let mut reporter = RecordingReporter::default();
    let summary = executor.run_tests(&cases, &mut reporter);

    assert_eq!(
        summary,
        RunSummary {
            executables_run: 1,
            executables_failed: 1,
            canceled: false,
        }
    );
    let invocations: Vec<_> = runner
        .invocations()
        .into_iter()
        .map(|(exe, _)| exe)
        .collect();
    assert_eq!(
        invocations,
        vec!["/fake/odd", "/fake/fine"],
        "the batch for B.* never ran"
    );
    assert_eq!(
        reporter.outcomes(),
        vec![("/fake/fine:F.One".to_owned(), TestOutcome::Passed)],
        "no results are reported for the executable with the unknown status"
    );

    Ok(())
}

// ---
// Helper methods
// ---

/// Returns the `--gtest_filter` argument of each test run, or the empty string if there was none.
fn filters(runner: &FakeRunner) -> Vec<String> {
    runner
        .invocations()
        .into_iter()
        .map(|(_, arguments)| {
            arguments
                .split(' ')
                .find(|arg| arg.starts_with("--gtest_filter="))
                .unwrap_or_default()
                .to_owned()
        })
        .collect()
}
