//! Removed-list pass for vehicles that only D2C2 still lists.

use crate::config::{CriteriaRules, JoinOptions};
use crate::error::ReconError;
use crate::join::{group_by_key, resolve_duplicates};
use crate::model::{CriteriaCheck, MergedRecord, RemovalMatch, RemovedMatchStatus, RemovedRecord, SourceDesignation};
use crate::schema::SourceKind;

/// Match status for a D2C2-only row given its removed-list entry, if any.
pub fn match_status(entry: Option<&RemovedRecord>, rules: &CriteriaRules) -> RemovedMatchStatus {
    match entry {
        None => RemovedMatchStatus::NoMatch,
        Some(r) if r.status.as_deref() == Some(rules.removed_status.as_str()) => {
            RemovedMatchStatus::MatchAndG
        }
        Some(_) => RemovedMatchStatus::MatchButNotG,
    }
}

fn with_removal(mut record: MergedRecord, entry: Option<&RemovedRecord>, rules: &CriteriaRules) -> MergedRecord {
    let status = match_status(entry, rules);
    if status == RemovedMatchStatus::MatchAndG {
        record.criteria.criteria_check = CriteriaCheck::GStatusInCdk;
    }
    record.removal = Some(match entry {
        Some(r) => RemovalMatch {
            stock_number: r.stock_number.clone(),
            status: r.status.clone(),
            extra: r.extra.clone(),
            match_status: status,
        },
        None => RemovalMatch::no_match(),
    });
    record
}

/// Left-join D2C2-only rows against the removed list on stock number.
///
/// Every D2C2-only row is kept; unmatched removed entries contribute
/// nothing. Rows with any other designation are returned unchanged.
/// A `MatchAndG` row has its criteria check replaced with "G Status in CDK";
/// `expected_in_both_sources` is never touched.
pub fn reconcile_removed(
    records: Vec<MergedRecord>,
    removed: Vec<RemovedRecord>,
    join: &JoinOptions,
    rules: &CriteriaRules,
) -> Result<Vec<MergedRecord>, ReconError> {
    let mut index = group_by_key(removed, join.key_transform, |r| r.stock_number.as_deref());
    let mut dups = Vec::new();
    resolve_duplicates(&mut index, SourceKind::Removed, join.duplicates, &mut dups);
    if !dups.is_empty() {
        return Err(ReconError::DuplicateKeys(dups));
    }

    let mut out = Vec::with_capacity(records.len());
    for record in records {
        if record.designation != SourceDesignation::D2c2Only {
            out.push(record);
            continue;
        }

        let entries: &[RemovedRecord] = record
            .d2c2_stock_number()
            .map(|s| join.key_transform.apply(s))
            .and_then(|key| index.keyed.get(&key))
            .map(Vec::as_slice)
            .unwrap_or_default();

        if entries.is_empty() {
            out.push(with_removal(record, None, rules));
        } else {
            for entry in entries {
                out.push(with_removal(record.clone(), Some(entry), rules));
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DuplicatePolicy, KeyTransform};
    use crate::model::{Criterion, CriteriaResult, D2c2Record};

    fn d2c2_only(vin: &str, stock: &str) -> MergedRecord {
        MergedRecord {
            vin: Some(vin.into()),
            cdk: None,
            d2c2: Some(D2c2Record {
                vin: Some(vin.into()),
                stock_number: Some(stock.into()),
                status: Some("Active".into()),
                ..Default::default()
            }),
            designation: SourceDesignation::D2c2Only,
            criteria: CriteriaResult {
                criteria_check: CriteriaCheck::Unmet(vec![
                    Criterion::StockType,
                    Criterion::Status,
                    Criterion::BalancePositive,
                ]),
                expected_in_both_sources: false,
            },
            removal: None,
        }
    }

    fn removed(stock: &str, status: &str) -> RemovedRecord {
        RemovedRecord {
            stock_number: Some(stock.into()),
            status: Some(status.into()).filter(|s: &String| !s.is_empty()),
            ..Default::default()
        }
    }

    fn run(records: Vec<MergedRecord>, list: Vec<RemovedRecord>, duplicates: DuplicatePolicy) -> Result<Vec<MergedRecord>, ReconError> {
        let join = JoinOptions { duplicates, key_transform: KeyTransform::None };
        reconcile_removed(records, list, &join, &CriteriaRules::default())
    }

    #[test]
    fn match_status_rules() {
        let rules = CriteriaRules::default();
        assert_eq!(match_status(None, &rules), RemovedMatchStatus::NoMatch);
        assert_eq!(match_status(Some(&removed("S", "G")), &rules), RemovedMatchStatus::MatchAndG);
        assert_eq!(match_status(Some(&removed("S", "X")), &rules), RemovedMatchStatus::MatchButNotG);
        assert_eq!(match_status(Some(&removed("S", "")), &rules), RemovedMatchStatus::MatchButNotG);
        assert_eq!(match_status(Some(&removed("S", "g")), &rules), RemovedMatchStatus::MatchButNotG);
    }

    #[test]
    fn match_and_g_overrides_criteria() {
        let out = run(vec![d2c2_only("2FA2", "S200")], vec![removed("S200", "G")], DuplicatePolicy::Reject).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].criteria.criteria_check.to_string(), "G Status in CDK");
        assert!(!out[0].expected_in_both_sources());
        let removal = out[0].removal.as_ref().unwrap();
        assert_eq!(removal.match_status, RemovedMatchStatus::MatchAndG);
        assert_eq!(removal.stock_number.as_deref(), Some("S200"));
        assert_eq!(removal.status.as_deref(), Some("G"));
    }

    #[test]
    fn match_but_not_g_keeps_criteria() {
        let out = run(vec![d2c2_only("2FA2", "S200")], vec![removed("S200", "R")], DuplicatePolicy::Reject).unwrap();
        assert_eq!(out[0].criteria.criteria_check.to_string(), "Stock Type; Status; Balance > $0");
        assert_eq!(out[0].removal.as_ref().unwrap().match_status, RemovedMatchStatus::MatchButNotG);
    }

    #[test]
    fn no_match_keeps_row() {
        let out = run(vec![d2c2_only("2FA2", "S200")], vec![removed("S999", "G")], DuplicatePolicy::Reject).unwrap();
        assert_eq!(out.len(), 1);
        let removal = out[0].removal.as_ref().unwrap();
        assert_eq!(removal.match_status, RemovedMatchStatus::NoMatch);
        assert!(removal.stock_number.is_none());
        assert_eq!(out[0].criteria.criteria_check.to_string(), "Stock Type; Status; Balance > $0");
    }

    #[test]
    fn joins_on_stock_number_not_vin() {
        let out = run(vec![d2c2_only("S200", "X1")], vec![removed("S200", "G")], DuplicatePolicy::Reject).unwrap();
        assert_eq!(out[0].removal.as_ref().unwrap().match_status, RemovedMatchStatus::NoMatch);
    }

    #[test]
    fn other_designations_untouched() {
        let mut both = d2c2_only("1FA1", "S100");
        both.designation = SourceDesignation::Both;
        let out = run(vec![both.clone()], vec![removed("S100", "G")], DuplicatePolicy::Reject).unwrap();
        assert_eq!(out, vec![both]);
    }

    #[test]
    fn duplicate_removed_stock_numbers() {
        let list = vec![removed("S200", "R"), removed("S200", "G")];

        let err = run(vec![d2c2_only("2FA2", "S200")], list.clone(), DuplicatePolicy::Reject).unwrap_err();
        assert!(err.to_string().contains("Removed Vehicles stock number \"S200\" appears 2 times"));

        let first = run(vec![d2c2_only("2FA2", "S200")], list.clone(), DuplicatePolicy::FirstWins).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].removal.as_ref().unwrap().match_status, RemovedMatchStatus::MatchButNotG);

        let fanned = run(vec![d2c2_only("2FA2", "S200")], list, DuplicatePolicy::FanOut).unwrap();
        let statuses: Vec<_> = fanned.iter().map(|r| r.removal.as_ref().unwrap().match_status).collect();
        assert_eq!(statuses, vec![RemovedMatchStatus::MatchButNotG, RemovedMatchStatus::MatchAndG]);
        assert_eq!(fanned[1].criteria.criteria_check, CriteriaCheck::GStatusInCdk);
    }
}
