//! Business-validity rules applied to each joined row.

use crate::config::CriteriaRules;
use crate::model::{CriteriaCheck, CriteriaResult, Criterion, JoinedRecord, MergedRecord};

fn one_of(value: Option<&str>, accepted: &[String]) -> bool {
    value.is_some_and(|v| accepted.iter().any(|a| a == v))
}

/// Whether `record` passes a single criterion.
pub fn passes(record: &JoinedRecord, criterion: Criterion, rules: &CriteriaRules) -> bool {
    let cdk = record.cdk.as_ref();
    match criterion {
        Criterion::StockType => one_of(cdk.and_then(|r| r.stock_type.as_deref()), &rules.stock_types),
        Criterion::Status => one_of(cdk.and_then(|r| r.status.as_deref()), &rules.statuses),
        Criterion::DealNumberNotEmpty => cdk.and_then(|r| r.deal_number.as_ref()).is_none(),
        Criterion::BalancePositive => cdk.is_some_and(|r| r.balance.is_positive()),
        Criterion::D2c2InTransit => record
            .d2c2
            .as_ref()
            .and_then(|r| r.status.as_deref())
            .map_or(true, |s| s != rules.in_transit_status),
    }
}

/// Evaluate all five criteria independently.
///
/// `expected_in_both_sources` additionally requires the row to carry a D2C2
/// stock number, so a CDK-only row can meet every criterion and still be
/// `false`.
pub fn evaluate(record: &JoinedRecord, rules: &CriteriaRules) -> CriteriaResult {
    let failed: Vec<Criterion> = Criterion::ALL
        .iter()
        .copied()
        .filter(|c| !passes(record, *c, rules))
        .collect();

    let in_d2c2 = record.d2c2.as_ref().is_some_and(|r| r.stock_number.is_some());
    let expected_in_both_sources = failed.is_empty() && in_d2c2;

    CriteriaResult {
        criteria_check: CriteriaCheck::from_failures(failed),
        expected_in_both_sources,
    }
}

/// Evaluate every joined row and attach the result.
pub fn evaluate_all(records: Vec<JoinedRecord>, rules: &CriteriaRules) -> Vec<MergedRecord> {
    records
        .into_iter()
        .map(|joined| {
            if let Some(raw) = joined
                .cdk
                .as_ref()
                .filter(|r| r.balance.is_invalid())
                .and_then(|r| r.balance.raw())
            {
                log::warn!(
                    "VIN {}: balance {raw:?} is not a currency amount, treating as $0",
                    joined.vin.as_deref().unwrap_or("<none>")
                );
            }
            let criteria = evaluate(&joined, rules);
            MergedRecord::from_joined(joined, criteria)
        })
        .collect()
}
