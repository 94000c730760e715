use std::collections::{BTreeMap, BTreeSet};

use crate::config::{DuplicatePolicy, JoinOptions, KeyTransform};
use crate::error::{DuplicateKey, ReconError};
use crate::model::{CdkRecord, D2c2Record, JoinedRecord, SourceDesignation};
use crate::schema::SourceKind;

/// Records grouped by normalized join key, plus the ones with no key.
pub(crate) struct KeyedGroups<T> {
    pub keyed: BTreeMap<String, Vec<T>>,
    pub keyless: Vec<T>,
}

/// Group records by `key`, preserving input order within each group.
pub(crate) fn group_by_key<T>(
    records: Vec<T>,
    transform: KeyTransform,
    key: impl Fn(&T) -> Option<&str>,
) -> KeyedGroups<T> {
    let mut keyed: BTreeMap<String, Vec<T>> = BTreeMap::new();
    let mut keyless = Vec::new();

    for record in records {
        let normalized = key(&record).map(|k| transform.apply(k)).filter(|k| !k.is_empty());
        match normalized {
            Some(k) => keyed.entry(k).or_default().push(record),
            None => keyless.push(record),
        }
    }

    KeyedGroups { keyed, keyless }
}

/// Apply the duplicate policy to one source's groups.
///
/// Under `Reject` every duplicated key is appended to `dups` and groups are
/// left untouched; the caller turns a non-empty `dups` into an error.
pub(crate) fn resolve_duplicates<T>(
    groups: &mut KeyedGroups<T>,
    source: SourceKind,
    policy: DuplicatePolicy,
    dups: &mut Vec<DuplicateKey>,
) {
    for (key, records) in groups.keyed.iter_mut() {
        if records.len() < 2 {
            continue;
        }
        match policy {
            DuplicatePolicy::Reject => dups.push(DuplicateKey {
                source,
                key: key.clone(),
                count: records.len(),
            }),
            DuplicatePolicy::FirstWins => {
                log::warn!(
                    "{source}: {} {key:?} appears {} times, keeping the first",
                    source.key_name(),
                    records.len()
                );
                records.truncate(1);
            }
            DuplicatePolicy::FanOut => {
                log::debug!(
                    "{source}: {} {key:?} appears {} times, fanning out",
                    source.key_name(),
                    records.len()
                );
            }
        }
    }
}

/// Classify a joined row by which stock-number fields are present.
pub fn designate(cdk: Option<&CdkRecord>, d2c2: Option<&D2c2Record>) -> SourceDesignation {
    let in_cdk = cdk.is_some_and(|r| r.stock_number.is_some());
    let in_d2c2 = d2c2.is_some_and(|r| r.stock_number.is_some());
    match (in_cdk, in_d2c2) {
        (true, true) => SourceDesignation::Both,
        (true, false) => SourceDesignation::CdkOnly,
        (false, true) => SourceDesignation::D2c2Only,
        (false, false) => SourceDesignation::Unknown,
    }
}

fn joined(cdk: Option<CdkRecord>, d2c2: Option<D2c2Record>) -> JoinedRecord {
    let vin = cdk
        .as_ref()
        .and_then(|r| r.vin.clone())
        .or_else(|| d2c2.as_ref().and_then(|r| r.vin.clone()));
    let designation = designate(cdk.as_ref(), d2c2.as_ref());
    JoinedRecord { vin, cdk, d2c2, designation }
}

/// Full outer join of CDK and D2C2 on VIN.
///
/// Rows come out in VIN order, followed by VIN-less rows (CDK, then D2C2),
/// which never join to anything.
pub fn outer_join(
    cdk: Vec<CdkRecord>,
    d2c2: Vec<D2c2Record>,
    options: &JoinOptions,
) -> Result<Vec<JoinedRecord>, ReconError> {
    let mut left = group_by_key(cdk, options.key_transform, |r| r.vin.as_deref());
    let mut right = group_by_key(d2c2, options.key_transform, |r| r.vin.as_deref());

    let mut dups = Vec::new();
    resolve_duplicates(&mut left, SourceKind::Cdk, options.duplicates, &mut dups);
    resolve_duplicates(&mut right, SourceKind::D2c2, options.duplicates, &mut dups);
    if !dups.is_empty() {
        return Err(ReconError::DuplicateKeys(dups));
    }

    let keys: BTreeSet<String> = left.keyed.keys().chain(right.keyed.keys()).cloned().collect();
    let mut out = Vec::with_capacity(keys.len() + left.keyless.len() + right.keyless.len());

    for key in &keys {
        let cdk_rows = left.keyed.remove(key).unwrap_or_default();
        let d2c2_rows = right.keyed.remove(key).unwrap_or_default();

        match (cdk_rows.is_empty(), d2c2_rows.is_empty()) {
            (false, false) => {
                for c in &cdk_rows {
                    for d in &d2c2_rows {
                        out.push(joined(Some(c.clone()), Some(d.clone())));
                    }
                }
            }
            (false, true) => out.extend(cdk_rows.into_iter().map(|c| joined(Some(c), None))),
            (true, false) => out.extend(d2c2_rows.into_iter().map(|d| joined(None, Some(d)))),
            (true, true) => {}
        }
    }

    if !left.keyless.is_empty() || !right.keyless.is_empty() {
        log::warn!(
            "{} CDK and {} D2C2 row(s) have no VIN and cannot be joined",
            left.keyless.len(),
            right.keyless.len()
        );
    }
    out.extend(left.keyless.into_iter().map(|c| joined(Some(c), None)));
    out.extend(right.keyless.into_iter().map(|d| joined(None, Some(d))));

    log::debug!("outer join: {} distinct VIN(s), {} row(s)", keys.len(), out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cdk(vin: &str, stock: &str) -> CdkRecord {
        CdkRecord {
            vin: Some(vin.into()).filter(|v: &String| !v.is_empty()),
            stock_number: Some(stock.into()).filter(|s: &String| !s.is_empty()),
            ..Default::default()
        }
    }

    fn d2c2(vin: &str, stock: &str) -> D2c2Record {
        D2c2Record {
            vin: Some(vin.into()).filter(|v: &String| !v.is_empty()),
            stock_number: Some(stock.into()).filter(|s: &String| !s.is_empty()),
            ..Default::default()
        }
    }

    fn opts(duplicates: DuplicatePolicy) -> JoinOptions {
        JoinOptions { duplicates, key_transform: KeyTransform::None }
    }

    #[test]
    fn designation_from_stock_numbers() {
        let c = cdk("V", "S1");
        let d = d2c2("V", "S2");
        let c_blank = cdk("V", "");
        assert_eq!(designate(Some(&c), Some(&d)), SourceDesignation::Both);
        assert_eq!(designate(Some(&c), None), SourceDesignation::CdkOnly);
        assert_eq!(designate(None, Some(&d)), SourceDesignation::D2c2Only);
        assert_eq!(designate(Some(&c_blank), None), SourceDesignation::Unknown);
        assert_eq!(designate(Some(&c_blank), Some(&d)), SourceDesignation::D2c2Only);
    }

    #[test]
    fn full_outer_join() {
        let out = outer_join(
            vec![cdk("B2", "S2"), cdk("A1", "S1")],
            vec![d2c2("C3", "D3"), d2c2("B2", "D2")],
            &JoinOptions::default(),
        )
        .unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].vin.as_deref(), Some("A1"));
        assert_eq!(out[0].designation, SourceDesignation::CdkOnly);
        assert!(out[0].d2c2.is_none());

        assert_eq!(out[1].vin.as_deref(), Some("B2"));
        assert_eq!(out[1].designation, SourceDesignation::Both);
        assert_eq!(out[1].cdk.as_ref().unwrap().stock_number.as_deref(), Some("S2"));
        assert_eq!(out[1].d2c2.as_ref().unwrap().stock_number.as_deref(), Some("D2"));

        assert_eq!(out[2].vin.as_deref(), Some("C3"));
        assert_eq!(out[2].designation, SourceDesignation::D2c2Only);
        assert!(out[2].cdk.is_none());
    }

    #[test]
    fn empty_inputs() {
        let out = outer_join(vec![], vec![], &JoinOptions::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn vinless_rows_never_join() {
        let out = outer_join(
            vec![cdk("", "S1")],
            vec![d2c2("", "D1")],
            &JoinOptions::default(),
        )
        .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].designation, SourceDesignation::CdkOnly);
        assert_eq!(out[1].designation, SourceDesignation::D2c2Only);
        assert!(out.iter().all(|r| r.vin.is_none()));
    }

    #[test]
    fn duplicate_vins_rejected() {
        let err = outer_join(
            vec![cdk("A1", "S1"), cdk("A1", "S1b")],
            vec![d2c2("A1", "D1"), d2c2("B2", "D2"), d2c2("B2", "D2b"), d2c2("B2", "D2c")],
            &opts(DuplicatePolicy::Reject),
        )
        .unwrap_err();
        match err {
            ReconError::DuplicateKeys(dups) => {
                assert_eq!(dups.len(), 2);
                assert_eq!(dups[0], DuplicateKey { source: SourceKind::Cdk, key: "A1".into(), count: 2 });
                assert_eq!(dups[1], DuplicateKey { source: SourceKind::D2c2, key: "B2".into(), count: 3 });
            }
            other => panic!("expected DuplicateKeys, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_vins_first_wins() {
        let out = outer_join(
            vec![cdk("A1", "S1"), cdk("A1", "S1b")],
            vec![d2c2("A1", "D1")],
            &opts(DuplicatePolicy::FirstWins),
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].cdk.as_ref().unwrap().stock_number.as_deref(), Some("S1"));
    }

    #[test]
    fn duplicate_vins_fan_out() {
        let out = outer_join(
            vec![cdk("A1", "S1"), cdk("A1", "S1b")],
            vec![d2c2("A1", "D1"), d2c2("A1", "D1b")],
            &opts(DuplicatePolicy::FanOut),
        )
        .unwrap();
        assert_eq!(out.len(), 4);
        let pairs: Vec<(&str, &str)> = out
            .iter()
            .map(|r| {
                (
                    r.cdk.as_ref().unwrap().stock_number.as_deref().unwrap(),
                    r.d2c2.as_ref().unwrap().stock_number.as_deref().unwrap(),
                )
            })
            .collect();
        assert_eq!(pairs, vec![("S1", "D1"), ("S1", "D1b"), ("S1b", "D1"), ("S1b", "D1b")]);
    }

    #[test]
    fn trim_transform_joins_padded_vins() {
        let options = JoinOptions { duplicates: DuplicatePolicy::Reject, key_transform: KeyTransform::Trim };
        let out = outer_join(vec![cdk("A1 ", "S1")], vec![d2c2("A1", "D1")], &options).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].designation, SourceDesignation::Both);
        // Original CDK value is kept for display
        assert_eq!(out[0].vin.as_deref(), Some("A1 "));

        let strict = outer_join(vec![cdk("A1 ", "S1")], vec![d2c2("A1", "D1")], &JoinOptions::default()).unwrap();
        assert_eq!(strict.len(), 2);
    }
}
