//! `vinrec run|reconcile|validate|columns`: file handling around the engine.

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};

use vinrec_recon::export::{to_json, write_csv};
use vinrec_recon::schema::validate_inputs;
use vinrec_recon::table::{decode_bytes, parse_csv};
use vinrec_recon::{
    DuplicatePolicy, JoinOptions, KeyTransform, RawTable, ReconConfig, ReconInput, ReconOptions,
    ReconReport, SourceKind,
};

use crate::CliError;

pub const DEFAULT_CSV_OUTPUT: &str = "merged_vin_data.csv";

#[derive(Clone, Copy, ValueEnum)]
pub enum DuplicatesArg {
    /// Fail, listing every duplicated key
    Reject,
    /// Keep the first row per key
    #[value(name = "first_wins")]
    FirstWins,
    /// Emit one row per combination
    #[value(name = "fan_out")]
    FanOut,
}

impl From<DuplicatesArg> for DuplicatePolicy {
    fn from(arg: DuplicatesArg) -> Self {
        match arg {
            DuplicatesArg::Reject => DuplicatePolicy::Reject,
            DuplicatesArg::FirstWins => DuplicatePolicy::FirstWins,
            DuplicatesArg::FanOut => DuplicatePolicy::FanOut,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KeyTransformArg {
    /// Compare keys exactly as exported
    None,
    /// Ignore leading and trailing whitespace
    Trim,
}

impl From<KeyTransformArg> for KeyTransform {
    fn from(arg: KeyTransformArg) -> Self {
        match arg {
            KeyTransformArg::None => KeyTransform::None,
            KeyTransformArg::Trim => KeyTransform::Trim,
        }
    }
}

#[derive(Args)]
pub struct ReconcileArgs {
    /// CDK inventory export (CSV)
    #[arg(long)]
    cdk: PathBuf,

    /// D2C2 inventory export (CSV)
    #[arg(long)]
    d2c2: PathBuf,

    /// Removed Vehicles list (CSV)
    #[arg(long)]
    removed: PathBuf,

    /// CSV report path ("-" for stdout)
    #[arg(long, short = 'o', default_value = DEFAULT_CSV_OUTPUT)]
    output: PathBuf,

    /// Write the JSON report to file
    #[arg(long)]
    json_output: Option<PathBuf>,

    /// Print the JSON report to stdout
    #[arg(long)]
    json: bool,

    /// What to do when a VIN or removed-list stock number repeats
    #[arg(long, value_enum, default_value = "reject")]
    duplicates: DuplicatesArg,

    /// Normalization applied to keys before comparing
    #[arg(long, value_enum, default_value = "none")]
    key_transform: KeyTransformArg,
}

fn is_stdout(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Read one export file, decoding non-UTF-8 bytes as Windows-1252.
fn load_table(kind: SourceKind, path: &Path) -> Result<RawTable, CliError> {
    let bytes = std::fs::read(path)
        .map_err(|e| CliError::io(format!("cannot read {} file {}: {e}", kind, path.display())))?;
    let table = parse_csv(&kind.to_string(), &decode_bytes(bytes))?;
    log::debug!("{kind}: {} row(s), {} column(s) from {}", table.len(), table.headers.len(), path.display());
    Ok(table)
}

fn load_input(cdk: &Path, d2c2: &Path, removed: &Path) -> Result<ReconInput, CliError> {
    Ok(ReconInput {
        cdk: load_table(SourceKind::Cdk, cdk)?,
        d2c2: load_table(SourceKind::D2c2, d2c2)?,
        removed: load_table(SourceKind::Removed, removed)?,
    })
}

fn read_config(config_path: &Path) -> Result<ReconConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", config_path.display())))?;
    Ok(ReconConfig::from_toml(&config_str)?)
}

/// Input files named by `config`, resolved relative to the config file's directory.
fn config_input(config_path: &Path, config: &ReconConfig) -> Result<ReconInput, CliError> {
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    load_input(
        &base_dir.join(&config.inputs.cdk),
        &base_dir.join(&config.inputs.d2c2),
        &base_dir.join(&config.inputs.removed),
    )
}

fn write_file(path: &Path, contents: &str, quiet: bool) -> Result<(), CliError> {
    std::fs::write(path, contents)
        .map_err(|e| CliError::io(format!("cannot write {}: {e}", path.display())))?;
    if !quiet {
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}

fn print_summary(report: &ReconReport) {
    let s = &report.summary;
    eprintln!(
        "reconciled '{}': {} row(s), {} in both sources, {} CDK only, {} D2C2 only",
        report.meta.name, s.total_records, s.both, s.cdk_only, s.d2c2_only,
    );
    eprintln!(
        "criteria: {} meet all, {} expected in both sources",
        s.meets_all_criteria, s.expected_in_both_sources,
    );
    if s.d2c2_only > 0 {
        eprintln!(
            "removed list: {} match and G, {} match but not G, {} no match",
            s.removed_match_and_g, s.removed_match_not_g, s.removed_no_match,
        );
    }
    if s.balance_parse_errors > 0 {
        eprintln!("warning: {} balance value(s) could not be parsed and count as $0", s.balance_parse_errors);
    }
}

pub fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let input = config_input(&config_path, &config)?;
    let report = vinrec_recon::run(&config.name, &input, &config.options())?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    if let Some(ref csv_path) = config.output.csv {
        write_file(&base_dir.join(csv_path), &write_csv(&report)?, quiet)?;
    }

    let json_str = to_json(&report)?;
    if let Some(ref json_path) = config.output.json {
        write_file(&base_dir.join(json_path), &json_str, quiet)?;
    }
    if let Some(ref path) = output_file {
        write_file(path, &json_str, quiet)?;
    }
    if json_output {
        println!("{json_str}");
    }

    if !quiet {
        print_summary(&report);
    }
    Ok(())
}

pub fn cmd_reconcile(args: ReconcileArgs, quiet: bool) -> Result<(), CliError> {
    if args.json && is_stdout(&args.output) {
        return Err(CliError::usage("--json and -o - both write to stdout")
            .with_hint("send the CSV to a file with -o, or use --json-output for the JSON report"));
    }

    let input = load_input(&args.cdk, &args.d2c2, &args.removed)?;
    let options = ReconOptions {
        join: JoinOptions {
            duplicates: args.duplicates.into(),
            key_transform: args.key_transform.into(),
        },
        ..Default::default()
    };
    let report = vinrec_recon::run("reconcile", &input, &options)?;

    let csv = write_csv(&report)?;
    if is_stdout(&args.output) {
        print!("{csv}");
    } else {
        write_file(&args.output, &csv, quiet)?;
    }

    if args.json || args.json_output.is_some() {
        let json_str = to_json(&report)?;
        if let Some(ref path) = args.json_output {
            write_file(path, &json_str, quiet)?;
        }
        if args.json {
            println!("{json_str}");
        }
    }

    if !quiet {
        print_summary(&report);
    }
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf, quiet: bool) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    let input = config_input(&config_path, &config)?;
    validate_inputs(&input)?;

    if !quiet {
        eprintln!(
            "valid: '{}' with {} CDK, {} D2C2, {} removed row(s); duplicates = {}",
            config.name,
            input.cdk.len(),
            input.d2c2.len(),
            input.removed.len(),
            config.join.duplicates,
        );
    }
    Ok(())
}

pub fn cmd_columns() -> Result<(), CliError> {
    for kind in SourceKind::ALL {
        let columns: Vec<String> = kind.required_columns().iter().map(|c| format!("{c:?}")).collect();
        println!("{kind}: {}", columns.join(", "));
    }
    Ok(())
}
