//! Required input columns and the pre-run schema check.
//!
//! Header comparison here is exact: a CDK export with `Stock Type` (single
//! space) instead of `Stock  Type` is reported as missing the column.

use serde::Serialize;

use crate::error::ReconError;
use crate::model::{RawTable, ReconInput};

pub const CDK_COLUMNS: [&str; 6] = ["VIN", "Stock #", "Stock  Type", "Status", "Deal  No.", "Balance"];
pub const D2C2_COLUMNS: [&str; 3] = ["VIN", "Stock #", "Status"];
pub const REMOVED_COLUMNS: [&str; 2] = ["STOCK-NO.", "STATUS"];

/// Which of the three inputs a table or record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Cdk,
    D2c2,
    Removed,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::Cdk, SourceKind::D2c2, SourceKind::Removed];

    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Cdk => &CDK_COLUMNS,
            Self::D2c2 => &D2C2_COLUMNS,
            Self::Removed => &REMOVED_COLUMNS,
        }
    }

    /// Name of the join key for this source, used in diagnostics.
    pub fn key_name(&self) -> &'static str {
        match self {
            Self::Cdk | Self::D2c2 => "VIN",
            Self::Removed => "stock number",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cdk => write!(f, "CDK"),
            Self::D2c2 => write!(f, "D2C2"),
            Self::Removed => write!(f, "Removed Vehicles"),
        }
    }
}

/// Required columns absent from `table`, in required order.
pub fn missing_columns(kind: SourceKind, table: &RawTable) -> Vec<String> {
    kind.required_columns()
        .iter()
        .filter(|col| !table.headers.iter().any(|h| h == *col))
        .map(|col| col.to_string())
        .collect()
}

pub fn validate_schema(kind: SourceKind, table: &RawTable) -> Result<(), ReconError> {
    let columns = missing_columns(kind, table);
    if columns.is_empty() {
        Ok(())
    } else {
        Err(ReconError::MissingColumns { source: kind, columns })
    }
}

/// Check all three inputs; reports the first source that fails.
pub fn validate_inputs(input: &ReconInput) -> Result<(), ReconError> {
    validate_schema(SourceKind::Cdk, &input.cdk)?;
    validate_schema(SourceKind::D2c2, &input.d2c2)?;
    validate_schema(SourceKind::Removed, &input.removed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str]) -> RawTable {
        RawTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: vec![],
        }
    }

    #[test]
    fn complete_cdk_schema_passes() {
        assert!(validate_schema(SourceKind::Cdk, &table(&CDK_COLUMNS)).is_ok());
    }

    #[test]
    fn extra_columns_are_fine() {
        let t = table(&["Make", "VIN", "Stock #", "Status", "Model"]);
        assert!(validate_schema(SourceKind::D2c2, &t).is_ok());
    }

    #[test]
    fn header_match_is_whitespace_sensitive() {
        let t = table(&["VIN", "Stock #", "Stock Type", "Status", "Deal No.", "Balance"]);
        let missing = missing_columns(SourceKind::Cdk, &t);
        assert_eq!(missing, vec!["Stock  Type", "Deal  No."]);
    }

    #[test]
    fn header_match_is_case_sensitive() {
        let t = table(&["stock-no.", "STATUS"]);
        match validate_schema(SourceKind::Removed, &t) {
            Err(ReconError::MissingColumns { source, columns }) => {
                assert_eq!(source, SourceKind::Removed);
                assert_eq!(columns, vec!["STOCK-NO."]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn validate_inputs_reports_first_failing_source() {
        let input = ReconInput {
            cdk: table(&CDK_COLUMNS),
            d2c2: table(&["VIN"]),
            removed: table(&[]),
        };
        let err = validate_inputs(&input).unwrap_err();
        assert!(err.to_string().starts_with("The uploaded D2C2 file"));
        assert!(err.to_string().ends_with("Stock #, Status"));
    }
}
