//! Compiled-in Qualiopi criterion and indicator catalog.

use crate::domain::{CriterionId, IndicatorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorDefinition {
    pub id: IndicatorId,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriterionDefinition {
    pub id: CriterionId,
    pub name: &'static str,
    pub indicator_ids: &'static [IndicatorId],
}

pub const TOTAL_CRITERIA: usize = 7;
pub const TOTAL_INDICATORS: usize = 32;

macro_rules! ids {
    ($($id:literal),* $(,)?) => {
        &[$(IndicatorId($id)),*]
    };
}

macro_rules! indicator {
    ($id:literal, $name:literal) => {
        IndicatorDefinition {
            id: IndicatorId($id),
            name: $name,
        }
    };
}

pub static CRITERIA: [CriterionDefinition; TOTAL_CRITERIA] = [
    CriterionDefinition {
        id: CriterionId(1),
        name: "Conditions d'information du public",
        indicator_ids: ids![1, 2, 3],
    },
    CriterionDefinition {
        id: CriterionId(2),
        name: "Identification precise des objectifs",
        indicator_ids: ids![4, 5, 6, 7],
    },
    CriterionDefinition {
        id: CriterionId(3),
        name: "Adaptation aux publics beneficiaires",
        indicator_ids: ids![8, 9, 10, 11],
    },
    CriterionDefinition {
        id: CriterionId(4),
        name: "Adequation des moyens pedagogiques",
        indicator_ids: ids![12, 13, 14, 15, 16],
    },
    CriterionDefinition {
        id: CriterionId(5),
        name: "Qualification et developpement des competences",
        indicator_ids: ids![17, 18, 19, 20, 21],
    },
    CriterionDefinition {
        id: CriterionId(6),
        name: "Inscription dans l'environnement professionnel",
        indicator_ids: ids![22, 23, 24, 25, 26, 27],
    },
    CriterionDefinition {
        id: CriterionId(7),
        name: "Recueil et prise en compte des appreciations",
        indicator_ids: ids![28, 29, 30, 31, 32],
    },
];

pub static INDICATORS: [IndicatorDefinition; TOTAL_INDICATORS] = [
    indicator!(1, "Information accessible au public"),
    indicator!(2, "Indicateurs de resultats"),
    indicator!(3, "Taux d'obtention des certifications"),
    indicator!(4, "Analyse des besoins du beneficiaire"),
    indicator!(5, "Objectifs de la prestation et leur adequation"),
    indicator!(6, "Contenus et modalites de mise en oeuvre"),
    indicator!(7, "Adequation des contenus aux exigences de la certification"),
    indicator!(8, "Procedures de positionnement et d'evaluation des acquis"),
    indicator!(9, "Conditions de deroulement de la prestation"),
    indicator!(10, "Adaptation de la prestation aux beneficiaires"),
    indicator!(11, "Evaluation de l'atteinte des objectifs"),
    indicator!(12, "Moyens humains et techniques adaptes"),
    indicator!(13, "Coordination des intervenants"),
    indicator!(14, "Ressources pedagogiques a disposition"),
    indicator!(15, "Parcours de formation des apprentis"),
    indicator!(16, "Missions tuteur/maitre d'apprentissage"),
    indicator!(17, "Competences des intervenants"),
    indicator!(18, "Mobilisation des intervenants internes/externes"),
    indicator!(19, "Developpement des competences des salaries"),
    indicator!(20, "Formateurs occasionnels"),
    indicator!(21, "Competences et habilitations requises"),
    indicator!(22, "Veille legale et reglementaire"),
    indicator!(23, "Veille emplois, metiers, competences"),
    indicator!(24, "Veille innovations pedagogiques et technologiques"),
    indicator!(25, "Veille handicap"),
    indicator!(26, "Referent handicap et accessibilite"),
    indicator!(27, "Partenariats et reseaux"),
    indicator!(28, "Recueil des appreciations des parties prenantes"),
    indicator!(29, "Traitement des difficultes rencontrees"),
    indicator!(30, "Traitement des reclamations"),
    indicator!(31, "Prise en compte des appreciations pour l'amelioration"),
    indicator!(32, "Mesures d'amelioration continue"),
];

pub fn criterion(id: CriterionId) -> Option<&'static CriterionDefinition> {
    CRITERIA.iter().find(|criterion| criterion.id == id)
}

pub fn indicator(id: IndicatorId) -> Option<&'static IndicatorDefinition> {
    INDICATORS.iter().find(|indicator| indicator.id == id)
}

pub fn is_known_criterion(id: CriterionId) -> bool {
    criterion(id).is_some()
}

pub fn criterion_for_indicator(id: IndicatorId) -> Option<&'static CriterionDefinition> {
    CRITERIA
        .iter()
        .find(|criterion| criterion.indicator_ids.contains(&id))
}
