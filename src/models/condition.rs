use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::enums::{DurationHint, Onset, Prevalence, Progression, Severity};

/// Likelihood profile for one symptom of a condition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomWeight {
    /// Multiplier on the base presence boost (defaults to 1.0).
    #[serde(default)]
    pub weight: Option<f64>,
    /// P(symptom | condition). High values penalise a missing symptom.
    #[serde(default)]
    pub sensitivity: Option<f64>,
    /// P(no symptom | no condition). High values reward a present symptom.
    #[serde(default)]
    pub specificity: Option<f64>,
}

impl SymptomWeight {
    pub fn new(weight: f64, sensitivity: f64, specificity: f64) -> Self {
        Self {
            weight: Some(weight),
            sensitivity: Some(sensitivity),
            specificity: Some(specificity),
        }
    }
}

/// Evidence a condition is matched against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCriteria {
    #[serde(default)]
    pub locations: Vec<String>,
    /// Sensation descriptors (burning, throbbing, crushing).
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub frequency: Vec<String>,
    /// Inclusive `[min, max]` intensity band on the 0-10 scale.
    #[serde(default)]
    pub intensity: Option<[u8; 2]>,
    #[serde(default)]
    pub special_symptoms: Vec<String>,
    /// Ordered map so the reasoning trace is stable across loads.
    #[serde(default)]
    pub symptom_weights: BTreeMap<String, SymptomWeight>,
    /// Symptoms whose reported absence supports this condition.
    #[serde(default)]
    pub absent_symptoms: Vec<String>,
    #[serde(default)]
    pub duration_hint: Option<DurationHint>,
    #[serde(default)]
    pub onset: Option<Onset>,
    #[serde(default)]
    pub progression: Option<Progression>,
}

/// A knowledge-base record. Loaded once, shared read-only across calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub prevalence: Prevalence,
    /// Ids of conditions this one is commonly confused with.
    #[serde(default)]
    pub mimics: Vec<String>,
    /// Every entry must appear in the reported text or the condition is excluded.
    #[serde(default)]
    pub mandatory_symptoms: Vec<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub match_criteria: MatchCriteria,
}

impl Condition {
    pub fn new(id: &str, name: &str, locations: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            severity: Severity::default(),
            prevalence: Prevalence::default(),
            mimics: Vec::new(),
            mandatory_symptoms: Vec::new(),
            red_flags: Vec::new(),
            match_criteria: MatchCriteria {
                locations: locations.iter().map(|l| l.to_string()).collect(),
                ..MatchCriteria::default()
            },
        }
    }

    /// True when either record lists the other as a mimic.
    pub fn is_mimic_of(&self, other: &Condition) -> bool {
        self.mimics.iter().any(|m| m == &other.id) || other.mimics.iter().any(|m| m == &self.id)
    }

    pub fn has_special_symptom(&self, value: &str) -> bool {
        contains_ignore_case(&self.match_criteria.special_symptoms, value)
    }

    pub fn has_trigger(&self, value: &str) -> bool {
        contains_ignore_case(&self.match_criteria.triggers, value)
    }

    pub fn has_type(&self, value: &str) -> bool {
        contains_ignore_case(&self.match_criteria.types, value)
    }
}

fn contains_ignore_case(list: &[String], value: &str) -> bool {
    list.iter().any(|item| item.eq_ignore_ascii_case(value))
}
