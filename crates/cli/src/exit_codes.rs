//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `vinrec` exit codes.
//! Exit codes are part of the shell contract: scheduled jobs and scripts
//! branch on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error (bad arguments, invalid config values)   |
//! | 3    | Input schema error (required columns missing)        |
//! | 4    | Duplicate join keys under the `reject` policy        |
//! | 5    | Parse error (malformed CSV, TOML, JSON encoding)     |
//! | 6    | I/O error (cannot read an input or write an output)  |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant below
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Map it in [`recon_exit_code`] if an engine error produces it

use vinrec_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
#[allow(dead_code)]
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, config that parses but fails validation.
pub const EXIT_USAGE: u8 = 2;

/// An input file lacks one or more required columns.
pub const EXIT_SCHEMA: u8 = 3;

/// A VIN (or removed-list stock number) occurs more than once and the
/// duplicate policy is `reject`.
pub const EXIT_DUPLICATE: u8 = 4;

/// Malformed CSV or TOML input, or a report that cannot be encoded.
pub const EXIT_PARSE: u8 = 5;

/// Cannot read an input file or write an output file.
pub const EXIT_IO: u8 = 6;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigValidation(_) => EXIT_USAGE,
        ReconError::MissingColumns { .. } => EXIT_SCHEMA,
        ReconError::DuplicateKeys(_) => EXIT_DUPLICATE,
        ReconError::ConfigParse(_) | ReconError::Csv { .. } | ReconError::Json(_) => EXIT_PARSE,
    }
}
