// Copyright (c) The gtest-runner Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    ExpectedError,
    output::{OutputContext, OutputOpts, clap_styles},
};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gtest_runner::{
    config::{ConfigOverrides, GtestRunnerConfig},
    helpers::plural,
    process::DuctProcessRunner,
    reporter::ConsoleReporter,
    runner::TestExecutor,
    signal::SignalHandlerKind,
    test_filter::TestFilter,
    test_list::{GtestDiscoverer, OutputFormat, SerializableFormat, TestCase, TestList},
};
use std::io::{self, BufWriter, Write};
use supports_color::Stream;
use tracing::{info, warn};

type Result<T, E = ExpectedError> = std::result::Result<T, E>;

/// Runs GoogleTest executables in batches that fit within the maximum command-line length.
///
/// Results are read from GoogleTest's XML output, falling back to console output if an executable
/// crashes. Every selected test gets exactly one result.
#[derive(Debug, Parser)]
#[command(name = "gtest-run", version, styles = clap_styles::style())]
pub struct GtestRunApp {
    #[command(flatten)]
    output: OutputOpts,

    #[command(flatten)]
    config_opts: ConfigOpts,

    #[command(subcommand)]
    command: Command,
}

impl GtestRunApp {
    /// Initializes logging and colors.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app.
    pub fn exec(self, output: OutputContext) -> Result<()> {
        match self.command {
            Command::List {
                select,
                message_format,
            } => exec_list(&select, message_format.to_output_format(output.verbose), output),
            Command::Run {
                select,
                runner_opts,
            } => exec_run(&self.config_opts, &select, &runner_opts, output),
        }
    }
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Config file [default: .config/gtest-runner.toml in the current directory]
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn make_config(&self, overrides: &ConfigOverrides) -> Result<GtestRunnerConfig> {
        let current_dir = std::env::current_dir().map_err(ExpectedError::current_dir_failed)?;
        let current_dir = Utf8PathBuf::try_from(current_dir)
            .map_err(|error| ExpectedError::current_dir_failed(error.into_io_error()))?;
        Ok(GtestRunnerConfig::from_sources(
            &current_dir,
            self.config_file.as_deref(),
            overrides,
        )?)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the tests in GoogleTest executables
    ///
    /// Use --message-format json to get machine-readable output.
    List {
        #[command(flatten)]
        select: TestSelectOpts,

        /// Output format
        #[arg(
            short = 'T',
            long,
            value_enum,
            default_value_t,
            help_heading = "OUTPUT OPTIONS",
            value_name = "FMT"
        )]
        message_format: MessageFormatOpts,
    },

    /// Run the tests in GoogleTest executables
    ///
    /// Without --filter, every test in each executable is run without a --gtest_filter argument.
    /// With --filter, the executables are listed first and the matching tests are passed in as
    /// filters, split across as many runs as the maximum command-line length requires.
    Run {
        #[command(flatten)]
        select: TestSelectOpts,

        #[command(flatten)]
        runner_opts: RunnerOpts,
    },
}

#[derive(Debug, Args)]
#[command(next_help_heading = "FILTER OPTIONS")]
struct TestSelectOpts {
    /// Only select tests whose `Suite.Case` name matches this glob; may be repeated
    #[arg(long, short = 'E', value_name = "GLOB")]
    filter: Vec<String>,

    /// GoogleTest executables
    #[arg(value_name = "EXECUTABLES", required = true, help_heading = None)]
    executables: Vec<Utf8PathBuf>,
}

impl TestSelectOpts {
    fn executables(&self) -> impl Iterator<Item = &Utf8Path> + '_ {
        self.executables.iter().map(Utf8PathBuf::as_path)
    }

    fn make_filter(&self) -> Result<TestFilter> {
        Ok(TestFilter::new(&self.filter)?)
    }

    fn discover(&self, discoverer: &GtestDiscoverer<DuctProcessRunner>) -> Result<TestList> {
        Ok(TestList::discover(self.executables(), discoverer)?)
    }

    fn compute_list(&self, discoverer: &GtestDiscoverer<DuctProcessRunner>) -> Result<TestList> {
        let filter = self.make_filter()?;
        let mut test_list = self.discover(discoverer)?;
        test_list.apply_filter(&filter);
        Ok(test_list)
    }
}

#[derive(Debug, Default, Args)]
#[command(next_help_heading = "RUNNER OPTIONS")]
struct RunnerOpts {
    /// Maximum length of a test command line, in bytes [default: from config]
    #[arg(long, value_name = "BYTES", env = "GTEST_RUN_MAX_COMMAND_LENGTH")]
    max_command_length: Option<usize>,

    /// Echo the output of test executables while they run
    #[arg(long, env = "GTEST_RUN_PRINT_TEST_OUTPUT")]
    print_test_output: bool,
}

impl RunnerOpts {
    fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            max_command_length: self.max_command_length,
            // An unset flag leaves the config value alone.
            print_test_output: self.print_test_output.then_some(true),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum MessageFormatOpts {
    #[default]
    Human,
    Json,
    JsonPretty,
}

impl MessageFormatOpts {
    fn to_output_format(self, verbose: bool) -> OutputFormat {
        match self {
            Self::Human => OutputFormat::Human { verbose },
            Self::Json => OutputFormat::Serializable(SerializableFormat::Json),
            Self::JsonPretty => OutputFormat::Serializable(SerializableFormat::JsonPretty),
        }
    }
}

fn exec_list(
    select: &TestSelectOpts,
    output_format: OutputFormat,
    output: OutputContext,
) -> Result<()> {
    let discoverer = GtestDiscoverer::new(DuctProcessRunner);
    let test_list = select.compute_list(&discoverer)?;

    let stdout = io::stdout();
    // Buffer the output to minimize syscalls.
    let mut writer = BufWriter::new(stdout.lock());
    test_list.write(
        output_format,
        &mut writer,
        output.color.should_colorize(Stream::Stdout),
    )?;
    writer.flush().map_err(ExpectedError::write_output_error)?;
    Ok(())
}

fn exec_run(
    config_opts: &ConfigOpts,
    select: &TestSelectOpts,
    runner_opts: &RunnerOpts,
    output: OutputContext,
) -> Result<()> {
    let config = config_opts.make_config(&runner_opts.to_overrides())?;
    let filter = select.make_filter()?;
    let cancellation = SignalHandlerKind::Standard.build()?;

    let process_runner = DuctProcessRunner;
    let discoverer = GtestDiscoverer::new(process_runner);
    let executor = TestExecutor::new(&discoverer, &process_runner, &config, cancellation);

    let mut reporter = ConsoleReporter::new(io::stderr());
    if output.color.should_colorize(Stream::Stderr) {
        reporter.colorize();
    }

    let summary = if filter.is_all() {
        executor.run_executables(select.executables(), &mut reporter)
    } else {
        // The unfiltered list tells the executor which suites can be run as wildcards.
        let all_tests = select.discover(&discoverer)?;
        let mut test_list = all_tests.clone();
        test_list.apply_filter(&filter);
        let test_cases: Vec<TestCase> = test_list.iter_tests().cloned().collect();
        if test_cases.is_empty() {
            return Err(ExpectedError::NoTestsRun);
        }
        info!(
            "starting {} {} across {} {}",
            test_cases.len(),
            plural::tests_str(test_cases.len()),
            test_list.executable_count(),
            plural::executables_str(test_list.executable_count()),
        );
        executor.run_tests_in(&all_tests, &test_cases, &mut reporter)
    };

    reporter
        .write_summary(summary.canceled)
        .map_err(ExpectedError::write_output_error)?;

    let stats = reporter.run_stats();
    if summary.executables_failed > 0 {
        warn!(
            "{} {} could not be run",
            summary.executables_failed,
            plural::executables_str(summary.executables_failed)
        );
    }
    if stats.started == 0 && summary.is_success() {
        return Err(ExpectedError::NoTestsRun);
    }
    if !stats.is_success() || !summary.is_success() {
        return Err(ExpectedError::test_run_failed());
    }
    Ok(())
}
