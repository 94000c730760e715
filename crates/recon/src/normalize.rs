//! Source-native columns → canonical per-source fields.
//!
//! Header lookup collapses whitespace runs, so `Stock  Type` and
//! `Stock Type` resolve to the same field. Unrecognized columns are kept as
//! per-record extras.

use std::collections::HashSet;

use crate::currency::Balance;
use crate::model::{CdkRecord, D2c2Record, ExtraFields, RawTable, RemovedRecord};
use crate::schema::SourceKind;
use crate::table::is_missing;

const CDK_FIELDS: [&str; 6] = ["VIN", "Stock #", "Stock Type", "Status", "Deal No.", "Balance"];
const D2C2_FIELDS: [&str; 3] = ["VIN", "Stock #", "Status"];
const REMOVED_FIELDS: [&str; 2] = ["STOCK-NO.", "STATUS"];

fn canonical_fields(kind: SourceKind) -> &'static [&'static str] {
    match kind {
        SourceKind::Cdk => &CDK_FIELDS,
        SourceKind::D2c2 => &D2C2_FIELDS,
        SourceKind::Removed => &REMOVED_FIELDS,
    }
}

/// Header with surrounding whitespace trimmed and inner runs collapsed.
pub fn header_key(header: &str) -> String {
    header.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolved column positions for one table.
struct Columns {
    /// Position of each canonical field, in `canonical_fields` order.
    fields: Vec<Option<usize>>,
    /// (position, name) of every other column. Names are unique within the
    /// table: a repeated header becomes `Notes.1`, `Notes.2`, ...
    extra: Vec<(usize, String)>,
}

/// `header`, or `header.N` with the smallest `N` not already in `used`.
pub(crate) fn unique_name(header: &str, used: &HashSet<String>) -> String {
    if !used.contains(header) {
        return header.to_string();
    }
    (1..)
        .map(|n| format!("{header}.{n}"))
        .find(|name| !used.contains(name))
        .unwrap_or_else(|| header.to_string())
}

impl Columns {
    fn resolve(kind: SourceKind, table: &RawTable) -> Self {
        let canonical = canonical_fields(kind);
        let mut fields = vec![None; canonical.len()];
        let mut extra = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut used: HashSet<String> = table.headers.iter().cloned().collect();

        for (pos, header) in table.headers.iter().enumerate() {
            let first = seen.insert(header.as_str());
            let key = header_key(header);
            match canonical.iter().position(|f| *f == key) {
                Some(fi) if fields[fi].is_none() => fields[fi] = Some(pos),
                _ => {
                    let name = if first { header.clone() } else { unique_name(header, &used) };
                    used.insert(name.clone());
                    extra.push((pos, name));
                }
            }
        }

        Self { fields, extra }
    }

    fn cell(&self, row: &[String], field: usize) -> Option<String> {
        let pos = self.fields[field]?;
        row.get(pos).filter(|v| !is_missing(v)).cloned()
    }

    fn extras(&self, row: &[String]) -> ExtraFields {
        self.extra
            .iter()
            .filter_map(|(pos, header)| {
                row.get(*pos)
                    .filter(|v| !is_missing(v))
                    .map(|v| (header.clone(), v.clone()))
            })
            .collect()
    }
}

/// Names of the non-schema columns of `table`, in input order.
pub fn extra_columns(kind: SourceKind, table: &RawTable) -> Vec<String> {
    Columns::resolve(kind, table)
        .extra
        .into_iter()
        .map(|(_, header)| header)
        .collect()
}

pub fn normalize_cdk(table: &RawTable) -> Vec<CdkRecord> {
    let cols = Columns::resolve(SourceKind::Cdk, table);
    table
        .rows
        .iter()
        .map(|row| CdkRecord {
            vin: cols.cell(row, 0),
            stock_number: cols.cell(row, 1),
            stock_type: cols.cell(row, 2),
            status: cols.cell(row, 3),
            deal_number: cols.cell(row, 4),
            balance: Balance::from_cell(cols.cell(row, 5).as_deref()),
            extra: cols.extras(row),
        })
        .collect()
}

pub fn normalize_d2c2(table: &RawTable) -> Vec<D2c2Record> {
    let cols = Columns::resolve(SourceKind::D2c2, table);
    table
        .rows
        .iter()
        .map(|row| D2c2Record {
            vin: cols.cell(row, 0),
            stock_number: cols.cell(row, 1),
            status: cols.cell(row, 2),
            extra: cols.extras(row),
        })
        .collect()
}

pub fn normalize_removed(table: &RawTable) -> Vec<RemovedRecord> {
    let cols = Columns::resolve(SourceKind::Removed, table);
    table
        .rows
        .iter()
        .map(|row| RemovedRecord {
            stock_number: cols.cell(row, 0),
            status: cols.cell(row, 1),
            extra: cols.extras(row),
        })
        .collect()
}
