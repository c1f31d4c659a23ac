// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing the XML result files written by `--gtest_output=xml:<path>`.
//!
//! The file has the shape:
//!
//! ```xml
//! <testsuites>
//!   <testsuite name="FooSuite">
//!     <testcase name="Passes" status="run" time="0.004" classname="FooSuite" />
//!     <testcase name="Fails" status="run" time="0.01" classname="FooSuite">
//!       <failure message="..."><![CDATA[foo.cpp:12: Failure ...]]></failure>
//!     </testcase>
//!   </testsuite>
//! </testsuites>
//! ```

use crate::{
    errors::ResultXmlError,
    reporter::{TestOutcome, TestResult},
    test_list::TestCase,
};
use camino::Utf8Path;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::{
    borrow::Cow,
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader},
    time::Duration,
};
use tracing::{debug, warn};

/// The shortest duration reported for a test.
pub const MIN_DURATION: Duration = Duration::from_millis(1);

const SUITE_PATH: [&[u8]; 2] = [b"testsuites", b"testsuite"];

/// Parses `result_file`, returning a result for each test case in it that is also in
/// `expected_cases`.
///
/// A missing or unreadable file isn't an error: the executable most likely crashed before it
/// could write its results. In that case a warning is logged and an empty list is returned, and
/// the results must be recovered some other way.
///
/// Returns an error if a test case has a status that isn't recognized.
pub fn parse_result_xml(
    result_file: &Utf8Path,
    expected_cases: &[TestCase],
) -> Result<Vec<TestResult>, ResultXmlError> {
    let file = match File::open(result_file) {
        Ok(file) => file,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            warn!("output file `{result_file}` does not exist, did your tests crash?");
            return Ok(Vec::new());
        }
        Err(error) => {
            warn_incomplete(result_file, &error.to_string());
            return Ok(Vec::new());
        }
    };

    let expected: HashMap<&str, &TestCase> = expected_cases
        .iter()
        .map(|case| (case.display_name(), case))
        .collect();

    match parse_events(BufReader::new(file), result_file, &expected) {
        Ok(results) => {
            debug!("read {} results from `{result_file}`", results.len());
            Ok(results)
        }
        Err(ParseFailure::Incomplete(message)) => {
            warn_incomplete(result_file, &message);
            Ok(Vec::new())
        }
        Err(ParseFailure::Fatal(err)) => Err(err),
    }
}

/// Converts a duration in seconds, clamping it to at least [`MIN_DURATION`].
pub fn duration_from_secs(secs: f64) -> Duration {
    // NaN fails this comparison as well.
    if secs > MIN_DURATION.as_secs_f64() {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    } else {
        MIN_DURATION
    }
}

fn warn_incomplete(result_file: &Utf8Path, message: &str) {
    warn!(
        "test result file `{result_file}` could not be parsed (completely) - \
         your test has probably crashed: {message}"
    );
}

#[derive(Debug)]
enum ParseFailure {
    Incomplete(String),
    Fatal(ResultXmlError),
}

#[derive(Debug)]
struct PendingCase {
    classname: String,
    name: String,
    status: String,
    result: Option<String>,
    time: String,
    failures: Vec<String>,
}

impl PendingCase {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, ParseFailure> {
        Ok(Self {
            classname: required_attr(start, "classname")?,
            name: required_attr(start, "name")?,
            status: required_attr(start, "status")?,
            result: optional_attr(start, "result")?,
            time: required_attr(start, "time")?,
            failures: Vec::new(),
        })
    }

    fn finish(
        self,
        result_file: &Utf8Path,
        expected: &HashMap<&str, &TestCase>,
    ) -> Result<Option<TestResult>, ParseFailure> {
        let qualified_name = format!("{}.{}", self.classname, self.name);
        let Some(&test_case) = expected.get(qualified_name.as_str()) else {
            return Ok(None);
        };

        let secs: f64 = self.time.parse().map_err(|_| {
            ParseFailure::Incomplete(format!(
                "invalid time `{}` for `{qualified_name}`",
                self.time
            ))
        })?;

        let outcome = match self.status.as_str() {
            // GoogleTest 1.10 and above mark GTEST_SKIP() tests this way.
            "run" if self.result.as_deref() == Some("skipped") => TestOutcome::Skipped,
            "run" if self.failures.is_empty() => TestOutcome::Passed,
            "run" => TestOutcome::Failed {
                message: self.failures.join("\n\n"),
            },
            "notrun" => TestOutcome::Skipped,
            _ => {
                return Err(ParseFailure::Fatal(ResultXmlError::UnknownStatus {
                    file: result_file.to_owned(),
                    test_name: qualified_name,
                    status: self.status,
                }));
            }
        };

        Ok(Some(TestResult::new(
            test_case.clone(),
            outcome,
            Some(duration_from_secs(secs)),
        )))
    }
}

fn parse_events(
    input: impl BufRead,
    result_file: &Utf8Path,
    expected: &HashMap<&str, &TestCase>,
) -> Result<Vec<TestResult>, ParseFailure> {
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text(true);

    let mut results = Vec::new();
    let mut buf = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<PendingCase> = None;
    // Text collected for the <failure> element currently being read.
    let mut failure: Option<String> = None;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| ParseFailure::Incomplete(err.to_string()))?;
        match event {
            Event::Start(start) => {
                if path == SUITE_PATH && start.name().as_ref() == b"testcase" {
                    current = Some(PendingCase::from_start(&start)?);
                } else if is_failure_start(&path, current.as_ref(), &start) {
                    failure = Some(String::new());
                }
                path.push(start.name().as_ref().to_vec());
            }
            Event::Empty(start) => {
                if path == SUITE_PATH && start.name().as_ref() == b"testcase" {
                    let case = PendingCase::from_start(&start)?;
                    results.extend(case.finish(result_file, expected)?);
                } else if is_failure_start(&path, current.as_ref(), &start) {
                    let message = optional_attr(&start, "message")?.unwrap_or_default();
                    if let Some(case) = &mut current {
                        case.failures.push(message);
                    }
                }
            }
            Event::End(end) => {
                path.pop();
                if end.name().as_ref() == b"failure" {
                    if let (Some(text), Some(case)) = (failure.take(), &mut current) {
                        case.failures.push(text);
                    }
                } else if path == SUITE_PATH && end.name().as_ref() == b"testcase" {
                    if let Some(case) = current.take() {
                        results.extend(case.finish(result_file, expected)?);
                    }
                }
            }
            Event::Text(text) => {
                if let Some(failure) = &mut failure {
                    let text = text
                        .unescape()
                        .map_err(|err| ParseFailure::Incomplete(err.to_string()))?;
                    failure.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(failure) = &mut failure {
                    failure.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !path.is_empty() {
        return Err(ParseFailure::Incomplete(format!(
            "unexpected end of file inside <{}>",
            String::from_utf8_lossy(&path[path.len() - 1])
        )));
    }

    Ok(results)
}

fn is_failure_start(
    path: &[Vec<u8>],
    current: Option<&PendingCase>,
    start: &BytesStart<'_>,
) -> bool {
    current.is_some() && path.len() == SUITE_PATH.len() + 1 && start.name().as_ref() == b"failure"
}

fn optional_attr(start: &BytesStart<'_>, name: &str) -> Result<Option<String>, ParseFailure> {
    let attr = start
        .try_get_attribute(name)
        .map_err(|err| ParseFailure::Incomplete(err.to_string()))?;
    attr.map(|attr| {
        attr.unescape_value()
            .map(Cow::into_owned)
            .map_err(|err| ParseFailure::Incomplete(err.to_string()))
    })
    .transpose()
}

fn required_attr(start: &BytesStart<'_>, name: &str) -> Result<String, ParseFailure> {
    optional_attr(start, name)?.ok_or_else(|| {
        ParseFailure::Incomplete(format!(
            "<{}> is missing the `{name}` attribute",
            String::from_utf8_lossy(start.name().as_ref())
        ))
    })
}
