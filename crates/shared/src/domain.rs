use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(CriterionId);
id_newtype!(IndicatorId);

/// Number of characters in a declaration number (NDA).
pub const NDA_LEN: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorStatus {
    Valid,
    NcMineure,
    NcMajeure,
    NonApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    PretPourAudit,
    NonPretPourAudit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionProgressStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionCategory {
    Of,
    Cfa,
    Cbc,
    Vae,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditMode {
    Initial,
    Surveillance,
    Renouvellement,
}

/// Description of the organization being audited, supplied once before a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualiopiOnboardingData {
    pub nda: String,
    pub categorie_actions: Vec<ActionCategory>,
    pub mode_audit: AuditMode,
    pub nouveau_entrant: bool,
    #[serde(default)]
    pub site_web: Option<String>,
    #[serde(default)]
    pub sous_traitance: BTreeMap<String, bool>,
    #[serde(default)]
    pub certifications_formations: bool,
}

impl QualiopiOnboardingData {
    pub fn validate(&self) -> Result<(), DomainError> {
        let nda_len = self.nda.chars().count();
        if nda_len != NDA_LEN {
            return Err(DomainError::InvalidNdaLength {
                expected: NDA_LEN,
                actual: nda_len,
            });
        }
        if self.categorie_actions.is_empty() {
            return Err(DomainError::MissingActionCategory);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QualiopiOnboardingData {
        QualiopiOnboardingData {
            nda: "12345678901".into(),
            categorie_actions: vec![ActionCategory::Of],
            mode_audit: AuditMode::Initial,
            nouveau_entrant: false,
            site_web: Some("https://example.fr".into()),
            sous_traitance: BTreeMap::new(),
            certifications_formations: false,
        }
    }

    #[test]
    fn accepts_eleven_character_nda() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn rejects_short_nda() {
        let mut data = sample();
        data.nda = "1234".into();
        assert!(matches!(
            data.validate(),
            Err(DomainError::InvalidNdaLength {
                expected: 11,
                actual: 4
            })
        ));
    }

    #[test]
    fn rejects_empty_categories() {
        let mut data = sample();
        data.categorie_actions.clear();
        assert!(matches!(
            data.validate(),
            Err(DomainError::MissingActionCategory)
        ));
    }

    #[test]
    fn categories_use_uppercase_wire_names() {
        let value = serde_json::to_value(ActionCategory::Cfa).expect("serialize");
        assert_eq!(value, serde_json::json!("CFA"));
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let data: QualiopiOnboardingData = serde_json::from_str(
            r#"{"nda":"12345678901","categorie_actions":["OF","VAE"],"mode_audit":"surveillance","nouveau_entrant":true}"#,
        )
        .expect("decode");
        assert_eq!(data.site_web, None);
        assert!(data.sous_traitance.is_empty());
        assert!(!data.certifications_formations);
        assert_eq!(data.mode_audit, AuditMode::Surveillance);
    }
}
