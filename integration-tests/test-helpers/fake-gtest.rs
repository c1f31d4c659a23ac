// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A stand-in for a GoogleTest executable, used by the integration tests.
//!
//! The tests it contains are read from `fake-gtest-plan.txt` in the current directory, one per
//! line in the form `Suite.Case <pass|fail|skip|crash>`. Every invocation is appended to
//! `fake-gtest-invocations.txt` so that tests can check how the executable was called.

use std::{
    env,
    fmt::Write as _,
    fs::{self, OpenOptions},
    io::Write as _,
    process::exit,
};

const PLAN_FILE: &str = "fake-gtest-plan.txt";
const INVOCATIONS_FILE: &str = "fake-gtest-invocations.txt";

#[derive(Clone, Copy, Debug, PartialEq)]
enum Behavior {
    Pass,
    Fail,
    Skip,
    Crash,
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    record_invocation(&args);

    let plan = read_plan();
    let mut list_tests = false;
    let mut output_path = None;
    let mut filter = None;
    for arg in &args {
        if arg == "--gtest_list_tests" {
            list_tests = true;
        } else if let Some(path) = arg.strip_prefix("--gtest_output=xml:") {
            output_path = Some(path.to_owned());
        } else if let Some(patterns) = arg.strip_prefix("--gtest_filter=") {
            filter = Some(patterns.split(':').map(str::to_owned).collect::<Vec<_>>());
        } else {
            eprintln!("[fake-gtest] unknown argument: {arg}");
            exit(2);
        }
    }

    if list_tests {
        println!("Running main() from fake-gtest.rs");
        let mut current_suite = "";
        for (name, _) in &plan {
            let (suite, case) = name.split_once('.').expect("plan names are Suite.Case");
            if suite != current_suite {
                println!("{suite}.");
                current_suite = suite;
            }
            println!("  {case}");
        }
        return;
    }

    let selected: Vec<_> = plan
        .iter()
        .filter(|(name, _)| match &filter {
            Some(patterns) => patterns.iter().any(|pattern| matches(pattern, name)),
            None => true,
        })
        .collect();

    println!("[==========] Running {} tests.", selected.len());
    let mut xml_cases = String::new();
    let mut any_failed = false;
    for (name, behavior) in selected {
        let (suite, case) = name.split_once('.').expect("plan names are Suite.Case");
        println!("[ RUN      ] {name}");
        match behavior {
            Behavior::Pass => {
                println!("[       OK ] {name} (0 ms)");
                _ = writeln!(
                    xml_cases,
                    r#"    <testcase name="{case}" status="run" result="completed" time="0" classname="{suite}" />"#
                );
            }
            Behavior::Fail => {
                println!("fake.cpp:1: Failure");
                println!("[  FAILED  ] {name} (2 ms)");
                any_failed = true;
                _ = writeln!(
                    xml_cases,
                    r#"    <testcase name="{case}" status="run" result="completed" time="0.002" classname="{suite}">
      <failure message="fake failure" type=""><![CDATA[fake.cpp:1: Failure]]></failure>
    </testcase>"#
                );
            }
            Behavior::Skip => {
                println!("[  SKIPPED ] {name} (0 ms)");
                _ = writeln!(
                    xml_cases,
                    r#"    <testcase name="{case}" status="run" result="skipped" time="0" classname="{suite}" />"#
                );
            }
            Behavior::Crash => {
                println!("about to crash");
                // Exit without writing the result file, like a real crash would.
                exit(3);
            }
        }
    }

    if let Some(path) = output_path {
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuites>\n  <testsuite name=\"all\">\n{xml_cases}  </testsuite>\n</testsuites>\n"
        );
        fs::write(&path, xml).expect("result file written");
    }
    exit(if any_failed { 1 } else { 0 });
}

fn matches(pattern: &str, name: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => name.starts_with(prefix),
        None => pattern == name,
    }
}

fn read_plan() -> Vec<(String, Behavior)> {
    let contents = fs::read_to_string(PLAN_FILE).unwrap_or_default();
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (name, behavior) = line
                .split_once(' ')
                .unwrap_or_else(|| panic!("invalid plan line: {line}"));
            let behavior = match behavior.trim() {
                "pass" => Behavior::Pass,
                "fail" => Behavior::Fail,
                "skip" => Behavior::Skip,
                "crash" => Behavior::Crash,
                other => panic!("unknown behavior: {other}"),
            };
            (name.to_owned(), behavior)
        })
        .collect()
}

fn record_invocation(args: &[String]) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(INVOCATIONS_FILE)
        .expect("invocations file opened");
    writeln!(file, "{}", args.join(" ")).expect("invocation recorded");
}
