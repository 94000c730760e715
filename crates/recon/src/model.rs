use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::config::DuplicatePolicy;
use crate::currency::Balance;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One parsed delimited file: header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The three pre-loaded inputs of one run.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub cdk: RawTable,
    pub d2c2: RawTable,
    pub removed: RawTable,
}

/// Columns outside the required schema, kept per record and echoed to output.
pub type ExtraFields = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Normalized source records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CdkRecord {
    pub vin: Option<String>,
    pub stock_number: Option<String>,
    pub stock_type: Option<String>,
    pub status: Option<String>,
    pub deal_number: Option<String>,
    pub balance: Balance,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct D2c2Record {
    pub vin: Option<String>,
    pub stock_number: Option<String>,
    pub status: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RemovedRecord {
    pub stock_number: Option<String>,
    pub status: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraFields,
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceDesignation {
    Both,
    CdkOnly,
    D2c2Only,
    Unknown,
}

impl SourceDesignation {
    /// Report text for the `Source Designation` column.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Both => "Appearing in both sources",
            Self::CdkOnly => "Appearing only in CDK",
            Self::D2c2Only => "Appearing only in D2C2",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for SourceDesignation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovedMatchStatus {
    MatchAndG,
    MatchButNotG,
    NoMatch,
}

impl RemovedMatchStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::MatchAndG => "Match and G",
            Self::MatchButNotG => "Match but not G",
            Self::NoMatch => "No Match",
        }
    }
}

impl std::fmt::Display for RemovedMatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// The five business-validity conditions, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    StockType,
    Status,
    DealNumberNotEmpty,
    BalancePositive,
    D2c2InTransit,
}

impl Criterion {
    pub const ALL: [Criterion; 5] = [
        Criterion::StockType,
        Criterion::Status,
        Criterion::DealNumberNotEmpty,
        Criterion::BalancePositive,
        Criterion::D2c2InTransit,
    ];

    /// Label written into `Criteria Check` when this condition fails.
    pub fn label(&self) -> &'static str {
        match self {
            Self::StockType => "Stock Type",
            Self::Status => "Status",
            Self::DealNumberNotEmpty => "Deal No. is not empty",
            Self::BalancePositive => "Balance > $0",
            Self::D2c2InTransit => "D2C2 Status InTransit",
        }
    }
}

pub const MEETS_ALL_CRITERIA: &str = "Meets all criteria";
pub const G_STATUS_IN_CDK: &str = "G Status in CDK";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CriteriaCheck {
    MeetsAll,
    /// Failed conditions, in `Criterion::ALL` order. Never empty.
    Unmet(Vec<Criterion>),
    /// Removed-list override for D2C2-only vehicles carrying status G.
    GStatusInCdk,
}

impl CriteriaCheck {
    pub fn from_failures(failed: Vec<Criterion>) -> Self {
        if failed.is_empty() {
            Self::MeetsAll
        } else {
            Self::Unmet(failed)
        }
    }

    pub fn is_met(&self) -> bool {
        matches!(self, Self::MeetsAll)
    }

    pub fn failures(&self) -> &[Criterion] {
        match self {
            Self::Unmet(failed) => failed,
            _ => &[],
        }
    }
}

impl std::fmt::Display for CriteriaCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MeetsAll => f.write_str(MEETS_ALL_CRITERIA),
            Self::GStatusInCdk => f.write_str(G_STATUS_IN_CDK),
            Self::Unmet(failed) => {
                for (i, c) in failed.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    f.write_str(c.label())?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for CriteriaCheck {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CriteriaResult {
    pub criteria_check: CriteriaCheck,
    pub expected_in_both_sources: bool,
}

// ---------------------------------------------------------------------------
// Joined / merged records
// ---------------------------------------------------------------------------

/// One row of the CDK ↔ D2C2 outer join, before criteria evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRecord {
    pub vin: Option<String>,
    pub cdk: Option<CdkRecord>,
    pub d2c2: Option<D2c2Record>,
    pub designation: SourceDesignation,
}

/// Outcome of the removed-list pass for one D2C2-only record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemovalMatch {
    pub stock_number: Option<String>,
    pub status: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: ExtraFields,
    pub match_status: RemovedMatchStatus,
}

impl RemovalMatch {
    pub fn no_match() -> Self {
        Self {
            stock_number: None,
            status: None,
            extra: ExtraFields::new(),
            match_status: RemovedMatchStatus::NoMatch,
        }
    }
}

/// A row of the final report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRecord {
    pub vin: Option<String>,
    pub cdk: Option<CdkRecord>,
    pub d2c2: Option<D2c2Record>,
    pub designation: SourceDesignation,
    #[serde(flatten)]
    pub criteria: CriteriaResult,
    /// Present only on rows that went through the removed-list pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removal: Option<RemovalMatch>,
}

impl MergedRecord {
    pub fn from_joined(joined: JoinedRecord, criteria: CriteriaResult) -> Self {
        Self {
            vin: joined.vin,
            cdk: joined.cdk,
            d2c2: joined.d2c2,
            designation: joined.designation,
            criteria,
            removal: None,
        }
    }

    pub fn expected_in_both_sources(&self) -> bool {
        self.criteria.expected_in_both_sources
    }

    pub fn d2c2_stock_number(&self) -> Option<&str> {
        self.d2c2.as_ref().and_then(|r| r.stock_number.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconSummary {
    pub total_records: usize,
    pub both: usize,
    pub cdk_only: usize,
    pub d2c2_only: usize,
    pub unknown: usize,
    pub meets_all_criteria: usize,
    pub expected_in_both_sources: usize,
    pub removed_match_and_g: usize,
    pub removed_match_not_g: usize,
    pub removed_no_match: usize,
    pub balance_parse_errors: usize,
    /// Failure count per criterion label.
    pub criterion_failures: BTreeMap<String, usize>,
}

/// Non-schema column names per source, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtraColumns {
    pub cdk: Vec<String>,
    pub d2c2: Vec<String>,
    pub removed: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub name: String,
    pub engine_version: String,
    pub run_at: String,
    pub duplicates: DuplicatePolicy,
    pub input_rows: InputRowCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InputRowCounts {
    pub cdk: usize,
    pub d2c2: usize,
    pub removed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub extra_columns: ExtraColumns,
    pub records: Vec<MergedRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn criteria_check_text() {
        assert_eq!(CriteriaCheck::MeetsAll.to_string(), "Meets all criteria");
        assert_eq!(CriteriaCheck::GStatusInCdk.to_string(), "G Status in CDK");
        let unmet = CriteriaCheck::Unmet(vec![
            Criterion::StockType,
            Criterion::BalancePositive,
            Criterion::D2c2InTransit,
        ]);
        assert_eq!(unmet.to_string(), "Stock Type; Balance > $0; D2C2 Status InTransit");
    }

    #[test]
    fn from_failures_empty_is_met() {
        assert!(CriteriaCheck::from_failures(vec![]).is_met());
        let check = CriteriaCheck::from_failures(vec![Criterion::Status]);
        assert!(!check.is_met());
        assert_eq!(check.failures(), &[Criterion::Status]);
    }

    #[test]
    fn criteria_check_serializes_as_text() {
        let json = serde_json::to_string(&CriteriaCheck::Unmet(vec![Criterion::DealNumberNotEmpty])).unwrap();
        assert_eq!(json, "\"Deal No. is not empty\"");
    }

    #[test]
    fn labels() {
        assert_eq!(SourceDesignation::D2c2Only.label(), "Appearing only in D2C2");
        assert_eq!(RemovedMatchStatus::MatchButNotG.to_string(), "Match but not G");
    }
}
