use serde::{Deserialize, Serialize};

use crate::domain::{
    AuditStatus, CriterionId, CriterionProgressStatus, IndicatorId, IndicatorStatus,
    QualiopiOnboardingData,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorResult {
    pub id: IndicatorId,
    pub status: IndicatorStatus,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub corrective_plan: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditOverview {
    pub total_indicators: u32,
    pub valid: u32,
    pub nc_mineure: u32,
    pub nc_majeure: u32,
    pub non_applicable: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub vue_ensemble: AuditOverview,
    pub status: AuditStatus,
    pub indicateurs: Vec<IndicatorResult>,
}

impl AuditReport {
    pub fn is_ready(&self) -> bool {
        self.status == AuditStatus::PretPourAudit
    }

    pub fn indicators_with_status(
        &self,
        status: IndicatorStatus,
    ) -> impl Iterator<Item = &IndicatorResult> + '_ {
        self.indicateurs
            .iter()
            .filter(move |result| result.status == status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    #[default]
    CriterionProgress,
    AuditComplete,
}

/// One record of the audit progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditProgressEvent {
    #[serde(default)]
    pub event_type: AuditEventType,
    #[serde(default)]
    pub criterion_id: Option<CriterionId>,
    #[serde(default)]
    pub criterion_name: Option<String>,
    #[serde(default)]
    pub status: Option<CriterionProgressStatus>,
    #[serde(default)]
    pub indicators_processed: Vec<IndicatorResult>,
    #[serde(default)]
    pub report: Option<AuditReport>,
}

impl AuditProgressEvent {
    pub fn criterion_progress(
        criterion_id: CriterionId,
        status: CriterionProgressStatus,
        indicators_processed: Vec<IndicatorResult>,
    ) -> Self {
        Self {
            event_type: AuditEventType::CriterionProgress,
            criterion_id: Some(criterion_id),
            criterion_name: None,
            status: Some(status),
            indicators_processed,
            report: None,
        }
    }

    pub fn audit_complete(report: AuditReport) -> Self {
        Self {
            event_type: AuditEventType::AuditComplete,
            criterion_id: None,
            criterion_name: None,
            status: None,
            indicators_processed: Vec::new(),
            report: Some(report),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartAuditRequest {
    pub chat_session_id: String,
    pub onboarding_data: QualiopiOnboardingData,
    pub criteria_to_audit: Option<Vec<CriterionId>>,
}
