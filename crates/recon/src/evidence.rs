use crate::model::{MergedRecord, ReconSummary, RemovedMatchStatus, SourceDesignation};

/// Compute summary statistics over the final report rows.
pub fn compute_summary(records: &[MergedRecord]) -> ReconSummary {
    let mut s = ReconSummary {
        total_records: records.len(),
        ..Default::default()
    };

    for r in records {
        match r.designation {
            SourceDesignation::Both => s.both += 1,
            SourceDesignation::CdkOnly => s.cdk_only += 1,
            SourceDesignation::D2c2Only => s.d2c2_only += 1,
            SourceDesignation::Unknown => s.unknown += 1,
        }

        if r.criteria.criteria_check.is_met() {
            s.meets_all_criteria += 1;
        }
        for c in r.criteria.criteria_check.failures() {
            *s.criterion_failures.entry(c.label().to_string()).or_insert(0) += 1;
        }
        if r.expected_in_both_sources() {
            s.expected_in_both_sources += 1;
        }

        if let Some(ref removal) = r.removal {
            match removal.match_status {
                RemovedMatchStatus::MatchAndG => s.removed_match_and_g += 1,
                RemovedMatchStatus::MatchButNotG => s.removed_match_not_g += 1,
                RemovedMatchStatus::NoMatch => s.removed_no_match += 1,
            }
        }

        if r.cdk.as_ref().is_some_and(|c| c.balance.is_invalid()) {
            s.balance_parse_errors += 1;
        }
    }

    s
}
