//! Plain-text rendering of audit progress for the terminal.

use std::fmt::Write as _;

use audit_client::{AuditSnapshot, ClientEvent, SessionState};
use shared::{
    catalog::{self, CRITERIA, TOTAL_CRITERIA},
    domain::{CriterionId, CriterionProgressStatus, IndicatorId, IndicatorStatus},
    protocol::AuditReport,
};

pub fn criterion_status_label(status: CriterionProgressStatus) -> &'static str {
    match status {
        CriterionProgressStatus::Pending => "en attente",
        CriterionProgressStatus::InProgress => "en cours",
        CriterionProgressStatus::Completed => "termine",
        CriterionProgressStatus::Error => "erreur",
    }
}

pub fn indicator_status_label(status: IndicatorStatus) -> &'static str {
    match status {
        IndicatorStatus::Valid => "conforme",
        IndicatorStatus::NcMineure => "NC mineure",
        IndicatorStatus::NcMajeure => "NC majeure",
        IndicatorStatus::NonApplicable => "non applicable",
    }
}

fn criterion_name(id: CriterionId) -> &'static str {
    catalog::criterion(id)
        .map(|criterion| criterion.name)
        .unwrap_or("critere inconnu")
}

fn indicator_name(id: IndicatorId) -> &'static str {
    catalog::indicator(id)
        .map(|indicator| indicator.name)
        .unwrap_or("indicateur inconnu")
}

fn readiness_banner(report: &AuditReport) -> &'static str {
    if report.is_ready() {
        "PRET POUR L'AUDIT"
    } else {
        "NON PRET POUR L'AUDIT"
    }
}

/// One progress line per event; idle transitions print nothing.
pub fn describe_event(event: &ClientEvent) -> Option<String> {
    match event {
        ClientEvent::SessionStateChanged(state) => match state {
            SessionState::Idle => None,
            SessionState::Running => Some("Audit lance".to_string()),
            SessionState::Completed => Some("Audit termine".to_string()),
            SessionState::Cancelled => Some("Audit annule".to_string()),
            SessionState::Errored => Some("Audit interrompu par une erreur".to_string()),
            SessionState::Incomplete => {
                Some("Flux termine sans rapport final".to_string())
            }
        },
        ClientEvent::CriterionUpdated {
            criterion_id,
            progress,
        } => Some(format!(
            "Critere {criterion_id} : {} [{}] {} indicateur(s)",
            criterion_name(*criterion_id),
            criterion_status_label(progress.status),
            progress.indicators.len()
        )),
        ClientEvent::ReportReady(report) => {
            Some(format!("Rapport recu : {}", readiness_banner(report)))
        }
        ClientEvent::Error(message) => Some(format!("Erreur : {message}")),
    }
}

pub fn render_summary(snapshot: &AuditSnapshot) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Progression : {}% ({}/{} criteres)",
        snapshot.progress_percent, snapshot.completed_criteria, TOTAL_CRITERIA
    );

    for criterion in &CRITERIA {
        let status = snapshot
            .progress
            .get(&criterion.id)
            .map(|progress| progress.status)
            .unwrap_or_default();
        let processed = snapshot
            .processed_indicators
            .get(&criterion.id)
            .copied()
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "  Critere {} : {} [{}] {}/{} indicateurs",
            criterion.id,
            criterion.name,
            criterion_status_label(status),
            processed,
            criterion.indicator_ids.len()
        );
    }

    if let Some(report) = &snapshot.report {
        render_report(&mut out, report);
    }
    out
}

fn render_report(out: &mut String, report: &AuditReport) {
    let overview = &report.vue_ensemble;
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", readiness_banner(report));
    let _ = writeln!(
        out,
        "  Total {} | Conformes {} | NC mineures {} | NC majeures {} | Non applicables {}",
        overview.total_indicators,
        overview.valid,
        overview.nc_mineure,
        overview.nc_majeure,
        overview.non_applicable
    );

    for status in [IndicatorStatus::NcMajeure, IndicatorStatus::NcMineure] {
        for result in report.indicators_with_status(status) {
            let _ = writeln!(
                out,
                "  [{}] Indicateur {} : {}",
                indicator_status_label(status),
                result.id,
                indicator_name(result.id)
            );
            for issue in &result.issues {
                let _ = writeln!(out, "      - {issue}");
            }
            for action in &result.corrective_plan {
                let _ = writeln!(out, "      > {action}");
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
