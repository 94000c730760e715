// vinrec - CDK / D2C2 VIN inventory reconciliation from the command line

mod exit_codes;
mod recon;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use exit_codes::{recon_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use vinrec_recon::ReconError;

#[derive(Parser)]
#[command(name = "vinrec")]
#[command(about = "Reconcile CDK and D2C2 vehicle inventory exports by VIN")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace). RUST_LOG is honoured when absent.
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress the summary and all log output except errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a reconciliation described by a TOML config file
    #[command(after_help = "\
Examples:
  vinrec run month-end.recon.toml
  vinrec run month-end.recon.toml --json
  vinrec run month-end.recon.toml --output report.json")]
    Run {
        /// Path to the .recon.toml config file
        config: PathBuf,

        /// Print the JSON report to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON report to file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Reconcile three export files directly
    #[command(after_help = "\
Examples:
  vinrec reconcile --cdk cdk.csv --d2c2 d2c2.csv --removed removed.csv
  vinrec reconcile --cdk cdk.csv --d2c2 d2c2.csv --removed removed.csv -o - | head
  vinrec reconcile --cdk cdk.csv --d2c2 d2c2.csv --removed removed.csv --duplicates fan_out
  vinrec reconcile --cdk cdk.csv --d2c2 d2c2.csv --removed removed.csv --json-output report.json")]
    Reconcile(recon::ReconcileArgs),

    /// Check a config file and the column structure of its inputs without running
    #[command(after_help = "\
Examples:
  vinrec validate month-end.recon.toml")]
    Validate {
        /// Path to the .recon.toml config file
        config: PathBuf,
    },

    /// Print the columns each input file must contain
    Columns,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("VINREC_GIT_HASH"), ")",
        "\nengine:  vinrec-recon ", env!("CARGO_PKG_VERSION"),
    )
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level).format_timestamp(None).format_target(false);
    if !quiet && verbose == 0 {
        builder.parse_default_env();
    }
    builder.init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run { config, json, output } => recon::cmd_run(config, json, output, cli.quiet),
        Commands::Reconcile(args) => recon::cmd_reconcile(args, cli.quiet),
        Commands::Validate { config } => recon::cmd_validate(config, cli.quiet),
        Commands::Columns => recon::cmd_columns(),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingColumns { .. } => {
                Some("run `vinrec columns` to see the expected headers".to_string())
            }
            ReconError::DuplicateKeys(_) => {
                Some("use --duplicates first_wins or fan_out (or [join] duplicates) to continue".to_string())
            }
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}
