use super::*;
use std::collections::BTreeMap;

use audit_client::CriterionProgress;
use shared::{
    domain::AuditStatus,
    protocol::{AuditOverview, IndicatorResult},
};

fn result(id: i64, status: IndicatorStatus) -> IndicatorResult {
    IndicatorResult {
        id: IndicatorId(id),
        status,
        issues: Vec::new(),
        corrective_plan: Vec::new(),
    }
}

fn snapshot_with(progress: BTreeMap<CriterionId, CriterionProgress>, report: Option<AuditReport>) -> AuditSnapshot {
    let processed_indicators = CRITERIA
        .iter()
        .map(|criterion| {
            let count = progress
                .get(&criterion.id)
                .map(|entry| entry.indicators.len())
                .unwrap_or_default();
            (criterion.id, count)
        })
        .collect();
    AuditSnapshot {
        generation: 1,
        state: SessionState::Running,
        cancelled: false,
        onboarding_data: None,
        progress,
        report,
        processed_indicators,
        completed_criteria: 1,
        progress_percent: 14,
    }
}

#[test]
fn describes_criterion_update_with_catalog_name() {
    let line = describe_event(&ClientEvent::CriterionUpdated {
        criterion_id: CriterionId(6),
        progress: CriterionProgress {
            status: CriterionProgressStatus::InProgress,
            indicators: vec![result(22, IndicatorStatus::Valid)],
        },
    })
    .expect("line");
    assert_eq!(
        line,
        "Critere 6 : Inscription dans l'environnement professionnel [en cours] 1 indicateur(s)"
    );
}

#[test]
fn idle_transition_prints_nothing() {
    assert!(describe_event(&ClientEvent::SessionStateChanged(SessionState::Idle)).is_none());
    assert_eq!(
        describe_event(&ClientEvent::SessionStateChanged(SessionState::Incomplete)).as_deref(),
        Some("Flux termine sans rapport final")
    );
}

#[test]
fn summary_lists_every_criterion_and_pending_defaults() {
    let progress = BTreeMap::from([(
        CriterionId(1),
        CriterionProgress {
            status: CriterionProgressStatus::Completed,
            indicators: vec![
                result(1, IndicatorStatus::Valid),
                result(2, IndicatorStatus::Valid),
            ],
        },
    )]);
    let summary = render_summary(&snapshot_with(progress, None));

    assert!(summary.starts_with("Progression : 14% (1/7 criteres)"));
    assert!(summary.contains("Critere 1 : Conditions d'information du public [termine] 2/3 indicateurs"));
    assert!(summary.contains("Critere 7 : Recueil et prise en compte des appreciations [en attente] 0/5 indicateurs"));
    assert_eq!(summary.lines().count(), 1 + TOTAL_CRITERIA);
}

#[test]
fn summary_details_non_conformities() {
    let mut major = result(3, IndicatorStatus::NcMajeure);
    major.issues = vec!["Taux non publie".to_string()];
    major.corrective_plan = vec!["Publier le taux sur le site".to_string()];
    let report = AuditReport {
        vue_ensemble: AuditOverview {
            total_indicators: 3,
            valid: 1,
            nc_mineure: 1,
            nc_majeure: 1,
            non_applicable: 0,
        },
        status: AuditStatus::NonPretPourAudit,
        indicateurs: vec![
            result(1, IndicatorStatus::Valid),
            result(2, IndicatorStatus::NcMineure),
            major,
        ],
    };
    let summary = render_summary(&snapshot_with(BTreeMap::new(), Some(report)));

    assert!(summary.contains("NON PRET POUR L'AUDIT"));
    assert!(summary.contains("[NC majeure] Indicateur 3 : Taux d'obtention des certifications"));
    assert!(summary.contains("      - Taux non publie"));
    assert!(summary.contains("      > Publier le taux sur le site"));
    assert!(summary.contains("[NC mineure] Indicateur 2 : Indicateurs de resultats"));
    let major_at = summary.find("[NC majeure]").expect("major");
    let minor_at = summary.find("[NC mineure]").expect("minor");
    assert!(major_at < minor_at);
}
