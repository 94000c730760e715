//! Report encoding: the downloadable CSV and the JSON document.

use std::collections::HashSet;

use crate::error::ReconError;
use crate::model::{ExtraColumns, MergedRecord, ReconReport};
use crate::normalize::unique_name;

pub const CDK_HEADERS: [&str; 6] = ["VIN", "Stock # CDK", "Stock Type", "Status_CDK", "Deal No.", "Balance"];
pub const D2C2_HEADERS: [&str; 2] = ["Stock # D2C2", "Status_D2C2"];
pub const DERIVED_HEADERS: [&str; 3] = ["Source Designation", "Criteria Check", "Expected in Both Sources"];
pub const REMOVED_HEADERS: [&str; 2] = ["Stock # Removed", "Status_Removed"];
pub const MATCH_STATUS_HEADER: &str = "Removed Match Status";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Vin,
    CdkStock,
    StockType,
    CdkStatus,
    DealNumber,
    Balance,
    CdkExtra(usize),
    D2c2Stock,
    D2c2Status,
    D2c2Extra(usize),
    Designation,
    Criteria,
    Expected,
    RemovedStock,
    RemovedStatus,
    RemovedExtra(usize),
    MatchStatus,
}

/// Output header row and the column each header reads from.
struct Layout<'a> {
    headers: Vec<String>,
    columns: Vec<Column>,
    extra: &'a ExtraColumns,
}

impl<'a> Layout<'a> {
    fn new(extra: &'a ExtraColumns) -> Self {
        let fixed: HashSet<&str> = CDK_HEADERS
            .iter()
            .chain(D2C2_HEADERS.iter())
            .chain(DERIVED_HEADERS.iter())
            .chain(REMOVED_HEADERS.iter())
            .copied()
            .chain(std::iter::once(MATCH_STATUS_HEADER))
            .collect();

        let groups: [(&[String], &str); 3] = [
            (&extra.cdk, "_CDK"),
            (&extra.d2c2, "_D2C2"),
            (&extra.removed, "_Removed"),
        ];
        // Extra names that appear in more than one source, or shadow a fixed header.
        let collides = |name: &str, own: usize| {
            fixed.contains(name)
                || groups
                    .iter()
                    .enumerate()
                    .any(|(gi, (names, _))| gi != own && names.iter().any(|n| n == name))
        };
        let extra_header = |group: usize, name: &str| {
            if collides(name, group) {
                format!("{name}{}", groups[group].1)
            } else {
                name.to_string()
            }
        };

        let mut headers = Vec::new();
        let mut columns = Vec::new();
        let mut used: HashSet<String> = HashSet::new();
        let mut push = |h: String, c: Column| {
            let h = unique_name(&h, &used);
            used.insert(h.clone());
            headers.push(h);
            columns.push(c);
        };

        for (h, c) in CDK_HEADERS.iter().zip([
            Column::Vin,
            Column::CdkStock,
            Column::StockType,
            Column::CdkStatus,
            Column::DealNumber,
            Column::Balance,
        ]) {
            push(h.to_string(), c);
        }
        for (i, name) in extra.cdk.iter().enumerate() {
            push(extra_header(0, name), Column::CdkExtra(i));
        }
        push(D2C2_HEADERS[0].to_string(), Column::D2c2Stock);
        push(D2C2_HEADERS[1].to_string(), Column::D2c2Status);
        for (i, name) in extra.d2c2.iter().enumerate() {
            push(extra_header(1, name), Column::D2c2Extra(i));
        }
        push(DERIVED_HEADERS[0].to_string(), Column::Designation);
        push(DERIVED_HEADERS[1].to_string(), Column::Criteria);
        push(DERIVED_HEADERS[2].to_string(), Column::Expected);
        push(REMOVED_HEADERS[0].to_string(), Column::RemovedStock);
        push(REMOVED_HEADERS[1].to_string(), Column::RemovedStatus);
        for (i, name) in extra.removed.iter().enumerate() {
            push(extra_header(2, name), Column::RemovedExtra(i));
        }
        push(MATCH_STATUS_HEADER.to_string(), Column::MatchStatus);

        Self { headers, columns, extra }
    }

    fn cell(&self, r: &MergedRecord, column: Column) -> String {
        let cdk = r.cdk.as_ref();
        let d2c2 = r.d2c2.as_ref();
        let removal = r.removal.as_ref();
        let opt = |v: Option<&String>| v.cloned().unwrap_or_default();

        match column {
            Column::Vin => opt(r.vin.as_ref()),
            Column::CdkStock => opt(cdk.and_then(|c| c.stock_number.as_ref())),
            Column::StockType => opt(cdk.and_then(|c| c.stock_type.as_ref())),
            Column::CdkStatus => opt(cdk.and_then(|c| c.status.as_ref())),
            Column::DealNumber => opt(cdk.and_then(|c| c.deal_number.as_ref())),
            Column::Balance => cdk.and_then(|c| c.balance.raw()).unwrap_or_default().to_string(),
            Column::CdkExtra(i) => opt(cdk.and_then(|c| c.extra.get(&self.extra.cdk[i]))),
            Column::D2c2Stock => opt(d2c2.and_then(|d| d.stock_number.as_ref())),
            Column::D2c2Status => opt(d2c2.and_then(|d| d.status.as_ref())),
            Column::D2c2Extra(i) => opt(d2c2.and_then(|d| d.extra.get(&self.extra.d2c2[i]))),
            Column::Designation => r.designation.label().to_string(),
            Column::Criteria => r.criteria.criteria_check.to_string(),
            Column::Expected => bool_text(r.expected_in_both_sources()).to_string(),
            Column::RemovedStock => opt(removal.and_then(|m| m.stock_number.as_ref())),
            Column::RemovedStatus => opt(removal.and_then(|m| m.status.as_ref())),
            Column::RemovedExtra(i) => opt(removal.and_then(|m| m.extra.get(&self.extra.removed[i]))),
            Column::MatchStatus => removal.map(|m| m.match_status.label().to_string()).unwrap_or_default(),
        }
    }
}

fn bool_text(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

/// Encode report rows as CSV text.
pub fn write_records_csv(records: &[MergedRecord], extra: &ExtraColumns) -> Result<String, ReconError> {
    let layout = Layout::new(extra);
    let csv_err = |e: csv::Error| ReconError::Csv {
        source: "report".into(),
        message: e.to_string(),
    };

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(&layout.headers).map_err(csv_err)?;
    for r in records {
        let row: Vec<String> = layout.columns.iter().map(|c| layout.cell(r, *c)).collect();
        writer.write_record(&row).map_err(csv_err)?;
    }

    let bytes = writer.into_inner().map_err(|e| ReconError::Csv {
        source: "report".into(),
        message: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| ReconError::Csv {
        source: "report".into(),
        message: e.to_string(),
    })
}

pub fn write_csv(report: &ReconReport) -> Result<String, ReconError> {
    write_records_csv(&report.records, &report.extra_columns)
}

pub fn to_json(report: &ReconReport) -> Result<String, ReconError> {
    serde_json::to_string_pretty(report).map_err(|e| ReconError::Json(e.to_string()))
}
