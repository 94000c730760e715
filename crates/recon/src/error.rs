use std::fmt;

use crate::schema::SourceKind;

/// A key that occurs more than once within a single source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    pub source: SourceKind,
    pub key: String,
    pub count: usize,
}

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty name, empty rule list, etc.).
    ConfigValidation(String),
    /// Input is missing one or more required columns.
    MissingColumns { source: SourceKind, columns: Vec<String> },
    /// Duplicate join keys under the `reject` policy.
    DuplicateKeys(Vec<DuplicateKey>),
    /// Delimited text could not be read or written.
    Csv { source: String, message: String },
    /// JSON serialization error.
    Json(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingColumns { source, columns } => write!(
                f,
                "The uploaded {source} file is missing the following columns: {}",
                columns.join(", ")
            ),
            Self::DuplicateKeys(dups) => {
                write!(f, "duplicate keys found:")?;
                for dup in dups {
                    write!(
                        f,
                        "\n  {} {} {:?} appears {} times",
                        dup.source,
                        dup.source.key_name(),
                        dup.key,
                        dup.count
                    )?;
                }
                Ok(())
            }
            Self::Csv { source, message } => write!(f, "{source}: CSV error: {message}"),
            Self::Json(msg) => write!(f, "JSON serialization error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
