//! Application wiring behind the `dirmatch` binary.

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use anyhow::Context;
use bytesize::ByteSize;

use crate::cli::{Cli, Commands, CompareArgs, GenerateArgs, OutputFormat};
use crate::compare::Comparator;
use crate::config::Config;
use crate::error::ExitCode;
use crate::generator::{generate, GeneratorConfig};
use crate::logging;
use crate::output::{CsvOutput, JsonOutput, TextOutput};
use crate::progress::Progress;
use crate::signal;

/// Global flags shared by the subcommands.
#[derive(Debug, Clone, Copy)]
struct Globals {
    quiet: bool,
    no_color: bool,
}

/// Run the parsed command line and return the process exit code.
///
/// Comparisons that complete return `Ok` even when files are unique or were
/// skipped; the [`ExitCode`] tells them apart.
///
/// # Errors
///
/// Invalid input, interruption and I/O failures on the roots or on stdout.
/// [`ExitCode::for_error`] maps them to exit codes.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let globals = Globals {
        quiet: cli.quiet,
        no_color: cli.no_color,
    };

    match cli.command {
        Commands::Compare(args) => {
            let mut config = Config::load(cli.config.as_deref());
            config.apply_args(&args);
            run_compare(&args, &config, globals)
        }
        Commands::Generate(args) => run_generate(&args, globals),
    }
}

fn run_compare(args: &CompareArgs, config: &Config, globals: Globals) -> anyhow::Result<ExitCode> {
    let handler = signal::install_handler();

    let mut compare_config = config.compare_config().with_shutdown_flag(handler.flag());
    let show_progress = !globals.quiet
        && !args.no_progress
        && config.output == OutputFormat::Text
        && io::stderr().is_terminal();
    if show_progress {
        compare_config = compare_config.with_progress_callback(Arc::new(Progress::new(false)));
    }
    log::debug!("Comparing with {compare_config:?}");

    let outcome = Comparator::new(compare_config).compare(&args.dir_a, &args.dir_b)?;
    let exit_code = ExitCode::for_outcome(&outcome);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match config.output {
        OutputFormat::Text => {
            let color = !globals.no_color && io::stdout().is_terminal();
            TextOutput::new(&outcome)
                .with_color(color)
                .with_summary(!globals.quiet)
                .write_to(&mut out)
                .context("Failed to write results")?;
        }
        OutputFormat::Json => {
            JsonOutput::new(&outcome, exit_code)
                .write_to(&mut out, true)
                .context("Failed to write JSON results")?;
        }
        OutputFormat::Csv => {
            CsvOutput::new(&outcome)
                .write_to(&mut out)
                .context("Failed to write CSV results")?;
        }
    }
    out.flush().context("Failed to flush output")?;

    log::info!(
        "{} equal, {} similar, {} unique in A, {} unique in B ({} skipped)",
        outcome.summary.equal_pairs,
        outcome.summary.similar_pairs,
        outcome.summary.unique_a,
        outcome.summary.unique_b,
        outcome.summary.failed_files()
    );
    Ok(exit_code)
}

fn run_generate(args: &GenerateArgs, globals: Globals) -> anyhow::Result<ExitCode> {
    let config = GeneratorConfig::default()
        .with_seed(args.seed)
        .with_big_size(args.big_size)
        .with_small_size(args.small_size)
        .with_similar_size(args.similar_size)
        .with_count(args.count)
        .with_max_mutations(args.max_mutations);

    let report = generate(&args.dir_a, &args.dir_b, &config)?;
    if !globals.quiet {
        println!(
            "Wrote {} files ({}) into {} and {}",
            report.files_written,
            ByteSize::b(report.bytes_written),
            args.dir_a.display(),
            args.dir_b.display()
        );
    }
    Ok(ExitCode::Success)
}
