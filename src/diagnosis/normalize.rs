//! Evidence normalization: negation-aware safe text, synonym expansion and
//! clinical token extraction.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::UserSymptomData;

/// Negator followed by a phrase running to the next clause boundary.
static NEGATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:no|not|without|doesn't have|dont have)\s+([a-z\s]+?)(?:[.,]|$)")
        .expect("valid negation regex")
});

/// Canonical key appended when any of its colloquial forms is present.
static SYNONYMS: &[(&str, &[&str])] = &[
    ("nausea", &["vomit", "puke", "throw up", "sick", "queasy"]),
    ("fever", &["high temp", "hot", "chills"]),
    ("pain", &["hurt", "ache", "sore", "throbbing", "agony"]),
    ("stomach", &["belly", "tummy", "gut", "abdomen"]),
    ("cold", &["chilly", "freezing", "shivers"]),
    ("cough", &["coughing", "hack"]),
    ("breathing", &["breath", "gasping", "air"]),
];

/// Clinical tokens recognised in free text, in snake_case or spaced form.
static CLINICAL_VOCABULARY: &[&str] = &[
    // General
    "fever", "nausea", "vomiting", "headache", "cough", "fatigue", "sweating",
    "shortness_of_breath", "dizziness", "chills", "body_aches", "sudden_onset",
    // Cardiopulmonary
    "chest_pain", "chest_discomfort", "left_arm_pain", "jaw_pain", "back_pain",
    "productive_cough", "dry_cough", "sudden_shortness_of_breath", "sudden_dyspnea",
    "difficulty_breathing", "coughing_blood", "heart_rate_over_100", "oxygen_saturation_low",
    // Neurological
    "face_drooping", "arm_weakness", "slurred_speech", "light_sensitivity", "visual_aura",
    "stiff_neck", "focal_neurological_deficit", "altered_mental_status", "intoxicated",
    // Infectious
    "loss_of_smell", "loss_of_taste",
    // Abdominal
    "periumbilical_pain", "right_lower_quadrant_pain", "right_upper_quadrant_pain",
    "fatty_food_trigger",
    // Musculoskeletal
    "morning_stiffness", "joint_swelling", "bilateral_symptoms",
    // Allergic
    "throat_swelling", "hives", "recent_allergen_exposure",
    // Venous thromboembolism
    "leg_swelling", "leg_swelling_entire", "one_leg_swelling", "calf_tenderness", "calf_pain",
    "calf_asymmetry", "leg_pain", "deep_vein_tenderness", "pitting_edema", "superficial_veins",
    "active_cancer", "cancer", "bedridden", "paralysis", "recent_cast", "recent_surgery",
    "surgery_within_4weeks", "history_dvt", "history_pe", "alternative_diagnosis_likely",
    "hormonal_therapy", "birth_control",
    // Cardiac risk
    "high_risk_history", "moderate_risk_history", "st_depression", "t_wave_inversion",
    "nonspecific_ekg_changes", "hypertension", "hyperlipidemia", "diabetes", "smoking",
    "obesity", "family_history_cad",
    // Trauma
    "neck_injury", "neck_pain_trauma", "midline_tenderness", "painful_distracting_injury",
    "ankle_injury", "ankle_pain_trauma", "bone_tenderness",
    "bone_tenderness_posterior_lateral_malleolus", "bone_tenderness_posterior_medial_malleolus",
    "unable_to_bear_weight", "unable_to_bear_weight_immediately",
    "unable_to_bear_weight_ed_4steps",
];

/// Free text split into what the user affirmed and what they denied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedEvidence {
    /// Lowercased text with every negated phrase removed.
    pub safe_text: String,
    /// Phrases captured after a negator, kept for absent-symptom evidence.
    pub negated_terms: Vec<String>,
    /// `safe_text` with canonical synonym keys appended.
    pub expanded_text: String,
}

impl NormalizedEvidence {
    /// True when `term` was captured inside any negated phrase.
    pub fn is_negated(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.negated_terms.iter().any(|n| n.contains(&term))
    }
}

/// Normalize a single piece of free text.
pub fn normalize(text: &str) -> NormalizedEvidence {
    normalize_fields(&[text])
}

/// Normalize several input fields at once. Each negation stays inside the
/// field it was written in; the safe texts are then joined by spaces.
pub fn normalize_fields<S: AsRef<str>>(fields: &[S]) -> NormalizedEvidence {
    let mut negated_terms = Vec::new();
    let safe_text = fields
        .iter()
        .map(|field| strip_negations(&field.as_ref().to_lowercase(), &mut negated_terms))
        .collect::<Vec<_>>()
        .join(" ");

    let mut expanded_text = safe_text.clone();
    for (key, synonyms) in SYNONYMS {
        if synonyms.iter().any(|s| safe_text.contains(s)) {
            expanded_text.push(' ');
            expanded_text.push_str(key);
        }
    }

    NormalizedEvidence {
        safe_text,
        negated_terms,
        expanded_text,
    }
}

fn strip_negations(lower: &str, negated_terms: &mut Vec<String>) -> String {
    let mut safe = String::with_capacity(lower.len());
    let mut cursor = 0;
    for caps in NEGATION_PATTERN.captures_iter(lower) {
        let Some(phrase) = caps.get(1) else { continue };
        negated_terms.push(phrase.as_str().to_string());
        safe.push_str(&lower[cursor..phrase.start()]);
        cursor = phrase.end();
    }
    safe.push_str(&lower[cursor..]);
    safe
}

/// Normalize the scoring evidence fields of a symptom report.
pub fn normalize_symptoms(symptoms: &UserSymptomData) -> NormalizedEvidence {
    normalize_fields(symptoms.evidence_fields().as_slice())
}

/// Build the clinical token list used by pattern detection and decision rules.
///
/// Locations become `<location>_pain`, the pain type is kept verbatim, and the
/// clinical vocabulary is matched against the negation-safe notes and triggers.
pub fn extract_symptom_tokens(symptoms: &UserSymptomData) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut push = |token: String| {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    };

    for location in &symptoms.location {
        let location = location.trim().to_lowercase();
        if !location.is_empty() {
            push(format!("{}_pain", location.replace(' ', "_")));
        }
    }

    if let Some(pain_type) = symptoms.pain_type.as_deref() {
        let pain_type = pain_type.trim().to_lowercase();
        if !pain_type.is_empty() {
            push(pain_type);
        }
    }

    let evidence = normalize_fields(&[
        symptoms.additional_notes.as_deref().unwrap_or(""),
        symptoms.triggers.as_deref().unwrap_or(""),
    ]);
    for token in CLINICAL_VOCABULARY {
        let readable = token.replace('_', " ");
        if evidence.safe_text.contains(token) || evidence.safe_text.contains(&readable) {
            push(token.to_string());
        }
    }

    if symptoms
        .user_profile
        .as_ref()
        .and_then(|p| p.recent_surgery)
        .unwrap_or(false)
    {
        push("recent_surgery".to_string());
    }

    tokens
}
