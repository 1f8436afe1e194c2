use std::path::Path;

use crate::error::EngineError;
use crate::models::enums::{DurationHint, Onset, Prevalence, Severity};
use crate::models::{Condition, SymptomWeight, UserSymptomData};

use super::correlation::{builtin_patterns, SymptomPattern};
use super::types::CandidateSource;

const CONDITIONS_FILE: &str = "conditions.json";
const PATTERNS_FILE: &str = "patterns.json";

/// Read-only condition library and correlation patterns, loaded once and
/// handed to the engine.
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    pub conditions: Vec<Condition>,
    pub patterns: Vec<SymptomPattern>,
}

impl KnowledgeBase {
    /// Load `conditions.json` (required) and `patterns.json` (optional; the
    /// built-in pattern library is used when absent).
    pub fn load(resources_dir: &Path) -> Result<Self, EngineError> {
        let conditions: Vec<Condition> = read_json(&resources_dir.join(CONDITIONS_FILE), CONDITIONS_FILE)?;

        let patterns_path = resources_dir.join(PATTERNS_FILE);
        let patterns = if patterns_path.exists() {
            read_json(&patterns_path, PATTERNS_FILE)?
        } else {
            builtin_patterns()
        };

        tracing::info!(
            dir = %resources_dir.display(),
            conditions = conditions.len(),
            patterns = patterns.len(),
            "Knowledge base loaded"
        );

        Ok(Self {
            conditions,
            patterns,
        })
    }

    /// Small fixture library for tests (no file I/O).
    pub fn load_test() -> Self {
        let mut heart_attack = Condition::new("heart_attack", "Heart Attack", &["chest", "left arm", "jaw"]);
        heart_attack.severity = Severity::Critical;
        heart_attack.prevalence = Prevalence::Rare;
        heart_attack.mimics = vec!["angina".into(), "gerd".into()];
        heart_attack.red_flags = vec!["crushing chest pain".into()];
        heart_attack.match_criteria.types = vec!["crushing".into(), "pressure".into()];
        heart_attack.match_criteria.special_symptoms = vec!["sweating".into(), "nausea".into()];
        heart_attack.match_criteria.onset = Some(Onset::Sudden);
        heart_attack.match_criteria.duration_hint = Some(DurationHint::Acute);
        heart_attack
            .match_criteria
            .symptom_weights
            .insert("left arm pain".into(), SymptomWeight::new(1.3, 0.5, 0.85));

        let mut angina = Condition::new("angina", "Angina", &["chest"]);
        angina.severity = Severity::Severe;
        angina.mimics = vec!["heart_attack".into()];
        angina.match_criteria.types = vec!["pressure".into(), "tight".into()];
        angina.match_criteria.triggers = vec!["exercise".into(), "stress".into()];
        angina.match_criteria.special_symptoms = vec!["shortness of breath".into()];
        angina.match_criteria.duration_hint = Some(DurationHint::Chronic);

        let mut gerd = Condition::new("gerd", "Acid Reflux", &["chest", "throat", "stomach"]);
        gerd.severity = Severity::Mild;
        gerd.prevalence = Prevalence::Common;
        gerd.mimics = vec!["heart_attack".into()];
        gerd.match_criteria.types = vec!["burning".into()];
        gerd.match_criteria.triggers = vec!["spicy food".into(), "lying down".into()];
        gerd.match_criteria.special_symptoms = vec!["sour taste".into(), "bloating".into()];
        gerd.match_criteria.duration_hint = Some(DurationHint::Any);

        let mut migraine = Condition::new("migraine", "Migraine", &["head"]);
        migraine.severity = Severity::ModerateSevere;
        migraine.prevalence = Prevalence::Common;
        migraine.mimics = vec!["tension_headache".into()];
        migraine.match_criteria.types = vec!["throbbing".into(), "pulsating".into()];
        migraine.match_criteria.triggers = vec!["bright light".into(), "stress".into()];
        migraine.match_criteria.special_symptoms = vec![
            "nausea".into(),
            "light sensitivity".into(),
            "visual aura".into(),
        ];
        migraine.match_criteria.absent_symptoms = vec!["fever".into()];
        migraine.match_criteria.duration_hint = Some(DurationHint::Chronic);

        let mut tension = Condition::new("tension_headache", "Tension Headache", &["head", "neck"]);
        tension.severity = Severity::Mild;
        tension.prevalence = Prevalence::VeryCommon;
        tension.mimics = vec!["migraine".into()];
        tension.match_criteria.types = vec!["dull".into(), "tight".into()];
        tension.match_criteria.triggers = vec!["stress".into(), "poor posture".into()];
        tension.match_criteria.special_symptoms = vec!["neck stiffness".into()];
        tension.match_criteria.absent_symptoms = vec!["nausea".into()];
        tension.match_criteria.duration_hint = Some(DurationHint::Any);

        Self {
            conditions: vec![heart_attack, angina, gerd, migraine, tension],
            patterns: builtin_patterns(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.id == id)
    }
}

impl CandidateSource for KnowledgeBase {
    /// The whole library; the scoring gates do the filtering.
    fn candidates(&self, _symptoms: &UserSymptomData) -> Result<Vec<Condition>, EngineError> {
        Ok(self.conditions.clone())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, name: &str) -> Result<T, EngineError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| EngineError::KnowledgeBaseLoad(path.display().to_string(), e.to_string()))?;
    serde_json::from_str(&json).map_err(|e| EngineError::KnowledgeBaseParse(name.into(), e.to_string()))
}
