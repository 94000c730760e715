use crate::assemble::assemble;
use crate::config::ReconOptions;
use crate::criteria::evaluate_all;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::join::outer_join;
use crate::model::{
    CdkRecord, D2c2Record, ExtraColumns, InputRowCounts, MergedRecord, ReconInput, ReconMeta,
    ReconReport, RemovedRecord, SourceDesignation,
};
use crate::normalize::{extra_columns, normalize_cdk, normalize_d2c2, normalize_removed};
use crate::removal::reconcile_removed;
use crate::schema::{validate_inputs, SourceKind};

/// Reconcile normalized record sets into the ordered report rows.
///
/// Pure: no IO, no clock, same input gives the same output.
pub fn reconcile(
    cdk: Vec<CdkRecord>,
    d2c2: Vec<D2c2Record>,
    removed: Vec<RemovedRecord>,
    options: &ReconOptions,
) -> Result<Vec<MergedRecord>, ReconError> {
    let joined = outer_join(cdk, d2c2, &options.join)?;
    let merged = evaluate_all(joined, &options.rules);

    let (d2c2_only, rest): (Vec<_>, Vec<_>) = merged
        .into_iter()
        .partition(|r| r.designation == SourceDesignation::D2c2Only);
    log::debug!(
        "criteria evaluated; {} D2C2-only row(s) go to the removed-list pass",
        d2c2_only.len()
    );

    let reconciled = reconcile_removed(d2c2_only, removed, &options.join, &options.rules)?;
    Ok(assemble(rest, reconciled))
}

/// Run reconciliation: schema check, normalization, core, summary.
pub fn run(name: &str, input: &ReconInput, options: &ReconOptions) -> Result<ReconReport, ReconError> {
    validate_inputs(input)?;

    let records = reconcile(
        normalize_cdk(&input.cdk),
        normalize_d2c2(&input.d2c2),
        normalize_removed(&input.removed),
        options,
    )?;
    let summary = compute_summary(&records);

    log::info!(
        "{name}: {} row(s), {} in both, {} CDK only, {} D2C2 only, {} expected in both",
        summary.total_records,
        summary.both,
        summary.cdk_only,
        summary.d2c2_only,
        summary.expected_in_both_sources,
    );

    Ok(ReconReport {
        meta: ReconMeta {
            name: name.to_string(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            duplicates: options.join.duplicates,
            input_rows: InputRowCounts {
                cdk: input.cdk.len(),
                d2c2: input.d2c2.len(),
                removed: input.removed.len(),
            },
        },
        summary,
        extra_columns: ExtraColumns {
            cdk: extra_columns(SourceKind::Cdk, &input.cdk),
            d2c2: extra_columns(SourceKind::D2c2, &input.d2c2),
            removed: extra_columns(SourceKind::Removed, &input.removed),
        },
        records,
    })
}
