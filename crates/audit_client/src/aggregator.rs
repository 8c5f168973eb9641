//! Folds ordered progress events into per-criterion progress and a final report.

use std::collections::BTreeMap;

use serde::Serialize;
use shared::{
    catalog::{self, TOTAL_CRITERIA},
    domain::{CriterionId, CriterionProgressStatus, IndicatorId},
    protocol::{AuditEventType, AuditProgressEvent, AuditReport, IndicatorResult},
};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CriterionProgress {
    pub status: CriterionProgressStatus,
    pub indicators: Vec<IndicatorResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    MissingCriterionId,
    UnknownCriterion(CriterionId),
    MissingReport,
    ReportAlreadySet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    CriterionUpdated(CriterionId),
    ReportStored,
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Default)]
pub struct ProgressAggregator {
    progress: BTreeMap<CriterionId, CriterionProgress>,
    report: Option<AuditReport>,
}

impl ProgressAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: AuditProgressEvent) -> Applied {
        match event.event_type {
            AuditEventType::CriterionProgress => {
                let Some(criterion_id) = event.criterion_id else {
                    return Applied::Ignored(IgnoreReason::MissingCriterionId);
                };
                if !catalog::is_known_criterion(criterion_id) {
                    warn!(
                        criterion_id = criterion_id.0,
                        "audit: ignoring progress for criterion outside the catalog"
                    );
                    return Applied::Ignored(IgnoreReason::UnknownCriterion(criterion_id));
                }
                // The server sends the cumulative indicator set, so replace.
                let entry = CriterionProgress {
                    status: event.status.unwrap_or_default(),
                    indicators: event.indicators_processed,
                };
                debug!(
                    criterion_id = criterion_id.0,
                    status = ?entry.status,
                    indicators = entry.indicators.len(),
                    "audit: criterion progress"
                );
                self.progress.insert(criterion_id, entry);
                Applied::CriterionUpdated(criterion_id)
            }
            AuditEventType::AuditComplete => {
                let Some(report) = event.report else {
                    return Applied::Ignored(IgnoreReason::MissingReport);
                };
                if self.report.is_some() {
                    debug!("audit: report already stored, ignoring later report");
                    return Applied::Ignored(IgnoreReason::ReportAlreadySet);
                }
                self.report = Some(report);
                Applied::ReportStored
            }
        }
    }

    pub fn progress(&self) -> &BTreeMap<CriterionId, CriterionProgress> {
        &self.progress
    }

    pub fn criterion(&self, id: CriterionId) -> Option<&CriterionProgress> {
        self.progress.get(&id)
    }

    /// Criteria with no event yet read as pending.
    pub fn criterion_status(&self, id: CriterionId) -> CriterionProgressStatus {
        self.progress
            .get(&id)
            .map(|progress| progress.status)
            .unwrap_or_default()
    }

    pub fn report(&self) -> Option<&AuditReport> {
        self.report.as_ref()
    }

    pub fn completed_criteria(&self) -> usize {
        self.progress
            .values()
            .filter(|progress| progress.status == CriterionProgressStatus::Completed)
            .count()
    }

    /// Share of the whole catalog completed, rounded to the nearest percent.
    pub fn progress_percent(&self) -> u8 {
        progress_percent(self.completed_criteria())
    }

    /// Latest result per indicator across every criterion.
    pub fn indicator_results(&self) -> BTreeMap<IndicatorId, &IndicatorResult> {
        self.progress
            .values()
            .flat_map(|progress| progress.indicators.iter())
            .map(|result| (result.id, result))
            .collect()
    }

    /// How many of a criterion's catalog indicators already have a result.
    pub fn processed_indicator_count(&self, id: CriterionId) -> usize {
        let Some(definition) = catalog::criterion(id) else {
            return 0;
        };
        let results = self.indicator_results();
        definition
            .indicator_ids
            .iter()
            .filter(|indicator_id| results.contains_key(indicator_id))
            .count()
    }

    pub fn clear(&mut self) {
        self.progress.clear();
        self.report = None;
    }
}

pub fn progress_percent(completed: usize) -> u8 {
    let percent = (completed as f64 / TOTAL_CRITERIA as f64 * 100.0).round();
    percent.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
#[path = "tests/aggregator_tests.rs"]
mod tests;
