use super::*;
use shared::{
    domain::{AuditStatus, IndicatorStatus},
    protocol::AuditOverview,
};

fn result(id: i64, status: IndicatorStatus) -> IndicatorResult {
    IndicatorResult {
        id: IndicatorId(id),
        status,
        issues: Vec::new(),
        corrective_plan: Vec::new(),
    }
}

fn report(status: AuditStatus, nc_majeure: u32) -> AuditReport {
    AuditReport {
        vue_ensemble: AuditOverview {
            total_indicators: 3,
            valid: 3 - nc_majeure,
            nc_mineure: 0,
            nc_majeure,
            non_applicable: 0,
        },
        status,
        indicateurs: Vec::new(),
    }
}

fn completed(criterion_id: i64) -> AuditProgressEvent {
    AuditProgressEvent::criterion_progress(
        CriterionId(criterion_id),
        CriterionProgressStatus::Completed,
        Vec::new(),
    )
}

#[test]
fn replaces_indicator_list_instead_of_appending() {
    let mut aggregator = ProgressAggregator::new();
    aggregator.apply(AuditProgressEvent::criterion_progress(
        CriterionId(1),
        CriterionProgressStatus::InProgress,
        vec![
            result(1, IndicatorStatus::Valid),
            result(2, IndicatorStatus::Valid),
        ],
    ));
    aggregator.apply(AuditProgressEvent::criterion_progress(
        CriterionId(1),
        CriterionProgressStatus::Completed,
        vec![
            result(1, IndicatorStatus::Valid),
            result(2, IndicatorStatus::Valid),
            result(3, IndicatorStatus::NcMajeure),
        ],
    ));

    let entry = aggregator.criterion(CriterionId(1)).expect("entry");
    assert_eq!(entry.indicators.len(), 3);
    assert_eq!(entry.status, CriterionProgressStatus::Completed);
}

#[test]
fn applying_same_event_twice_is_idempotent() {
    let event = AuditProgressEvent::criterion_progress(
        CriterionId(4),
        CriterionProgressStatus::InProgress,
        vec![result(12, IndicatorStatus::NcMineure)],
    );
    let mut once = ProgressAggregator::new();
    once.apply(event.clone());
    let mut twice = ProgressAggregator::new();
    twice.apply(event.clone());
    twice.apply(event);

    assert_eq!(once.progress(), twice.progress());
}

#[test]
fn missing_status_defaults_to_pending() {
    let mut aggregator = ProgressAggregator::new();
    let mut event = completed(2);
    event.status = None;
    assert_eq!(
        aggregator.apply(event),
        Applied::CriterionUpdated(CriterionId(2))
    );
    assert_eq!(
        aggregator.criterion_status(CriterionId(2)),
        CriterionProgressStatus::Pending
    );
}

#[test]
fn progress_without_criterion_id_is_ignored() {
    let mut aggregator = ProgressAggregator::new();
    let mut event = completed(1);
    event.criterion_id = None;
    assert_eq!(
        aggregator.apply(event),
        Applied::Ignored(IgnoreReason::MissingCriterionId)
    );
    assert!(aggregator.progress().is_empty());
}

#[test]
fn progress_keys_stay_within_catalog() {
    let mut aggregator = ProgressAggregator::new();
    for id in [0, 1, 7, 8, 42, -1] {
        aggregator.apply(completed(id));
    }
    assert!(aggregator
        .progress()
        .keys()
        .all(|id| catalog::is_known_criterion(*id)));
    assert_eq!(aggregator.progress().len(), 2);
}

#[test]
fn report_is_written_once() {
    let mut aggregator = ProgressAggregator::new();
    let first = report(AuditStatus::NonPretPourAudit, 1);
    assert_eq!(
        aggregator.apply(AuditProgressEvent::audit_complete(first.clone())),
        Applied::ReportStored
    );
    assert_eq!(
        aggregator.apply(AuditProgressEvent::audit_complete(report(
            AuditStatus::PretPourAudit,
            0
        ))),
        Applied::Ignored(IgnoreReason::ReportAlreadySet)
    );
    assert_eq!(aggregator.report(), Some(&first));
}

#[test]
fn completion_without_report_is_ignored() {
    let mut aggregator = ProgressAggregator::new();
    let mut event = AuditProgressEvent::audit_complete(report(AuditStatus::PretPourAudit, 0));
    event.report = None;
    assert_eq!(
        aggregator.apply(event),
        Applied::Ignored(IgnoreReason::MissingReport)
    );
    assert!(aggregator.report().is_none());
}

#[test]
fn percentage_uses_full_catalog_as_denominator() {
    let mut aggregator = ProgressAggregator::new();
    for id in [1, 2, 3] {
        aggregator.apply(completed(id));
    }
    aggregator.apply(AuditProgressEvent::criterion_progress(
        CriterionId(4),
        CriterionProgressStatus::InProgress,
        Vec::new(),
    ));
    assert_eq!(aggregator.completed_criteria(), 3);
    assert_eq!(aggregator.progress_percent(), 43);
}

#[test]
fn percentage_bounds() {
    assert_eq!(progress_percent(0), 0);
    assert_eq!(progress_percent(1), 14);
    assert_eq!(progress_percent(TOTAL_CRITERIA), 100);
}

#[test]
fn indicator_views_follow_latest_results() {
    let mut aggregator = ProgressAggregator::new();
    aggregator.apply(AuditProgressEvent::criterion_progress(
        CriterionId(2),
        CriterionProgressStatus::InProgress,
        vec![
            result(4, IndicatorStatus::Valid),
            result(6, IndicatorStatus::NcMineure),
        ],
    ));

    let results = aggregator.indicator_results();
    assert_eq!(results.len(), 2);
    assert_eq!(
        results.get(&IndicatorId(6)).map(|r| r.status),
        Some(IndicatorStatus::NcMineure)
    );
    assert_eq!(aggregator.processed_indicator_count(CriterionId(2)), 2);
    assert_eq!(aggregator.processed_indicator_count(CriterionId(3)), 0);
    assert_eq!(aggregator.processed_indicator_count(CriterionId(99)), 0);
}

#[test]
fn clear_drops_progress_and_report() {
    let mut aggregator = ProgressAggregator::new();
    aggregator.apply(completed(1));
    aggregator.apply(AuditProgressEvent::audit_complete(report(
        AuditStatus::PretPourAudit,
        0,
    )));
    aggregator.clear();
    assert!(aggregator.progress().is_empty());
    assert!(aggregator.report().is_none());
}
