use std::cmp::Ordering;

use crate::model::MergedRecord;

/// Report order: `expected_in_both_sources` true first, then VIN ascending.
/// VIN-less rows sort after every VIN within the same flag value.
pub fn report_order(a: &MergedRecord, b: &MergedRecord) -> Ordering {
    b.expected_in_both_sources()
        .cmp(&a.expected_in_both_sources())
        .then_with(|| match (&a.vin, &b.vin) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Concatenate the untouched rows with the reconciled D2C2-only rows and sort.
/// The sort is stable, so rows with equal keys keep concatenation order.
pub fn assemble(rest: Vec<MergedRecord>, reconciled: Vec<MergedRecord>) -> Vec<MergedRecord> {
    let mut out = rest;
    out.extend(reconciled);
    out.sort_by(report_order);
    out
}
