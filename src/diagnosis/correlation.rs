//! Multi-symptom clinical pattern detection.
//!
//! A pattern is a named set of clinical tokens tied to one condition. Matching
//! is set-based over the tokens produced by the normalizer.

use std::collections::HashSet;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Share of a pattern's tokens that must be present for it to match.
pub const MATCH_RATIO_THRESHOLD: f64 = 0.75;

/// Matched patterns above this confidence for these conditions are emergencies.
pub const EMERGENCY_PATTERN_CONFIDENCE: f64 = 0.7;
pub const EMERGENCY_CONDITIONS: &[&str] = &[
    "heart_attack",
    "stroke",
    "pulmonary_embolism",
    "anaphylaxis",
    "meningitis",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomPattern {
    pub name: String,
    pub condition_id: String,
    pub symptoms: Vec<String>,
    /// Likelihood ratio applied to the condition when the pattern matches.
    pub multiplier: f64,
    pub specificity: f64,
    #[serde(default)]
    pub clinical_pearl: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedPattern {
    pub pattern: SymptomPattern,
    pub matched_symptoms: Vec<String>,
    /// `match_ratio * specificity`.
    pub confidence: f64,
}

fn pattern(
    name: &str,
    condition_id: &str,
    symptoms: &[&str],
    multiplier: f64,
    specificity: f64,
    clinical_pearl: &str,
) -> SymptomPattern {
    SymptomPattern {
        name: name.to_string(),
        condition_id: condition_id.to_string(),
        symptoms: symptoms.iter().map(|s| s.to_string()).collect(),
        multiplier,
        specificity,
        clinical_pearl: Some(clinical_pearl.to_string()),
    }
}

static CLINICAL_PATTERNS: LazyLock<Vec<SymptomPattern>> = LazyLock::new(|| {
    vec![
        // Cardiac
        pattern(
            "Typical Myocardial Infarction",
            "heart_attack",
            &["chest_pain", "left_arm_pain", "sweating", "nausea"],
            5.0,
            0.92,
            "Classic presentation of acute MI - immediate 911",
        ),
        pattern(
            "Atypical MI (Especially Women)",
            "heart_attack",
            &["jaw_pain", "back_pain", "nausea", "fatigue"],
            3.5,
            0.75,
            "Women often present atypically - don't miss this",
        ),
        // Respiratory
        pattern(
            "Bacterial Pneumonia",
            "pneumonia",
            &["fever", "productive_cough", "chest_pain", "shortness_of_breath"],
            2.5,
            0.85,
            "Classic lobar pneumonia presentation",
        ),
        pattern(
            "Pulmonary Embolism",
            "pulmonary_embolism",
            &["sudden_shortness_of_breath", "chest_pain", "cough", "leg_swelling"],
            4.0,
            0.88,
            "Wells Score + D-dimer if suspected",
        ),
        // Neurological
        pattern(
            "Migraine with Aura",
            "migraine",
            &["headache", "visual_aura", "nausea", "light_sensitivity"],
            3.0,
            0.90,
            "Aura typically precedes headache by 30-60min",
        ),
        pattern(
            "Stroke (FAST)",
            "stroke",
            &["face_drooping", "arm_weakness", "slurred_speech"],
            6.0,
            0.95,
            "Time is brain - immediate 911, note onset time",
        ),
        pattern(
            "Meningitis Classic Triad",
            "meningitis",
            &["fever", "headache", "stiff_neck"],
            4.5,
            0.87,
            "Kernig/Brudzinski signs if present",
        ),
        // Gastrointestinal
        pattern(
            "Appendicitis Migration",
            "appendicitis",
            &["periumbilical_pain", "right_lower_quadrant_pain", "nausea", "fever"],
            3.5,
            0.82,
            "Pain migrates from umbilicus to RLQ over 12-24hrs",
        ),
        pattern(
            "Cholecystitis",
            "cholecystitis",
            &["right_upper_quadrant_pain", "nausea", "vomiting", "fatty_food_trigger"],
            2.8,
            0.78,
            "Murphy's sign positive, worse after fatty meals",
        ),
        // Infectious
        pattern(
            "Influenza",
            "flu",
            &["fever", "body_aches", "headache", "dry_cough", "sudden_onset"],
            2.2,
            0.75,
            "Sudden onset distinguishes from common cold",
        ),
        pattern(
            "COVID-19 Classic",
            "covid_19",
            &["fever", "dry_cough", "fatigue", "loss_of_smell", "loss_of_taste"],
            3.0,
            0.88,
            "Anosmia/ageusia highly specific for COVID-19",
        ),
        // Musculoskeletal
        pattern(
            "Inflammatory Arthritis",
            "rheumatoid_arthritis",
            &["morning_stiffness", "joint_swelling", "bilateral_symptoms", "fatigue"],
            2.5,
            0.80,
            "Morning stiffness >1hr suggests inflammatory process",
        ),
        // Allergic
        pattern(
            "Anaphylaxis",
            "anaphylaxis",
            &["throat_swelling", "difficulty_breathing", "hives", "recent_allergen_exposure"],
            5.5,
            0.94,
            "EpiPen immediately, then 911 - biphasic reactions possible",
        ),
    ]
});

/// The built-in pattern library.
pub fn builtin_patterns() -> Vec<SymptomPattern> {
    CLINICAL_PATTERNS.clone()
}

/// Matches token sets against a pattern library.
#[derive(Debug, Clone)]
pub struct CorrelationDetector {
    patterns: Vec<SymptomPattern>,
}

impl Default for CorrelationDetector {
    fn default() -> Self {
        Self::new(builtin_patterns())
    }
}

impl CorrelationDetector {
    pub fn new(patterns: Vec<SymptomPattern>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[SymptomPattern] {
        &self.patterns
    }

    /// Every pattern with at least 75% of its tokens present, best first.
    pub fn detect(&self, symptoms: &[String]) -> Vec<DetectedPattern> {
        let present: HashSet<String> = symptoms
            .iter()
            .map(|s| s.trim().to_lowercase())
            .collect();

        let mut detected: Vec<DetectedPattern> = self
            .patterns
            .iter()
            .filter(|p| !p.symptoms.is_empty())
            .filter_map(|p| {
                let matched: Vec<String> = p
                    .symptoms
                    .iter()
                    .filter(|s| present.contains(s.as_str()))
                    .cloned()
                    .collect();
                let ratio = matched.len() as f64 / p.symptoms.len() as f64;
                (ratio >= MATCH_RATIO_THRESHOLD).then(|| DetectedPattern {
                    pattern: p.clone(),
                    matched_symptoms: matched,
                    confidence: ratio * p.specificity,
                })
            })
            .collect();

        detected.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        for d in &detected {
            tracing::debug!(
                pattern = %d.pattern.name,
                condition = %d.pattern.condition_id,
                confidence = d.confidence,
                "Clinical pattern detected"
            );
        }

        detected
    }
}

/// Highest multiplier among matched patterns for `condition_id`.
///
/// Redundant patterns for one condition do not compound; 1.0 when none match.
pub fn multiplier_for_condition(condition_id: &str, detected: &[DetectedPattern]) -> f64 {
    detected
        .iter()
        .filter(|d| d.pattern.condition_id == condition_id)
        .map(|d| d.pattern.multiplier)
        .fold(1.0, f64::max)
}

/// Best matched pattern for `condition_id`, used to label the scoring trace.
pub fn strongest_pattern_for<'a>(
    condition_id: &str,
    detected: &'a [DetectedPattern],
) -> Option<&'a DetectedPattern> {
    detected
        .iter()
        .filter(|d| d.pattern.condition_id == condition_id)
        .max_by(|a, b| a.pattern.multiplier.total_cmp(&b.pattern.multiplier))
}

pub fn has_emergency_pattern(detected: &[DetectedPattern]) -> bool {
    detected.iter().any(|d| {
        EMERGENCY_CONDITIONS.contains(&d.pattern.condition_id.as_str())
            && d.confidence > EMERGENCY_PATTERN_CONFIDENCE
    })
}

/// `"<name>: <pearl>"` for each detected pattern carrying a pearl.
pub fn clinical_insights(detected: &[DetectedPattern]) -> Vec<String> {
    detected
        .iter()
        .filter_map(|d| {
            d.pattern
                .clinical_pearl
                .as_ref()
                .map(|pearl| format!("{}: {}", d.pattern.name, pearl))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn library_has_thirteen_patterns() {
        assert_eq!(builtin_patterns().len(), 13);
    }

    #[test]
    fn full_match_confidence_equals_specificity() {
        let detector = CorrelationDetector::default();
        let detected =
            detector.detect(&tokens(&["face_drooping", "arm_weakness", "slurred_speech"]));
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].pattern.condition_id, "stroke");
        assert!((detected[0].confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn three_of_four_matches_at_threshold() {
        let detector = CorrelationDetector::default();
        let detected = detector.detect(&tokens(&["chest_pain", "sweating", "nausea"]));
        let mi = detected
            .iter()
            .find(|d| d.pattern.name == "Typical Myocardial Infarction")
            .unwrap();
        assert!((mi.confidence - 0.75 * 0.92).abs() < 1e-9);
        assert_eq!(mi.matched_symptoms, vec!["chest_pain", "sweating", "nausea"]);
    }

    #[test]
    fn two_of_three_does_not_match() {
        let detector = CorrelationDetector::default();
        let detected = detector.detect(&tokens(&["fever", "headache"]));
        assert!(detected.iter().all(|d| d.pattern.condition_id != "meningitis"));
    }

    #[test]
    fn tokens_are_normalized_before_matching() {
        let detector = CorrelationDetector::default();
        let detected = detector.detect(&tokens(&[" Fever", "HEADACHE ", "stiff_neck"]));
        assert_eq!(detected[0].pattern.condition_id, "meningitis");
    }

    #[test]
    fn results_sorted_by_confidence() {
        let detector = CorrelationDetector::default();
        let detected = detector.detect(&tokens(&[
            "fever",
            "headache",
            "stiff_neck",
            "face_drooping",
            "arm_weakness",
            "slurred_speech",
        ]));
        assert_eq!(detected.len(), 2);
        assert!(detected[0].confidence >= detected[1].confidence);
        assert_eq!(detected[0].pattern.condition_id, "stroke");
    }

    #[test]
    fn multiplier_takes_maximum_not_product() {
        let detector = CorrelationDetector::default();
        let detected = detector.detect(&tokens(&[
            "chest_pain",
            "left_arm_pain",
            "sweating",
            "nausea",
            "jaw_pain",
            "back_pain",
            "fatigue",
        ]));
        let mi_count = detected
            .iter()
            .filter(|d| d.pattern.condition_id == "heart_attack")
            .count();
        assert_eq!(mi_count, 2);
        assert_eq!(multiplier_for_condition("heart_attack", &detected), 5.0);
        assert_eq!(
            strongest_pattern_for("heart_attack", &detected)
                .unwrap()
                .pattern
                .name,
            "Typical Myocardial Infarction"
        );
        assert_eq!(multiplier_for_condition("migraine", &detected), 1.0);
    }

    #[test]
    fn emergency_pattern_requires_confidence_above_threshold() {
        let detector = CorrelationDetector::default();
        let full = detector.detect(&tokens(&["fever", "headache", "stiff_neck"]));
        assert!(has_emergency_pattern(&full));

        // 3/4 of the atypical MI pattern: 0.75 * 0.75 = 0.5625
        let partial = detector.detect(&tokens(&["jaw_pain", "back_pain", "nausea"]));
        assert!(!partial.is_empty());
        assert!(!has_emergency_pattern(&partial));
    }

    #[test]
    fn non_emergency_condition_never_flags() {
        let detector = CorrelationDetector::default();
        let detected =
            detector.detect(&tokens(&["headache", "visual_aura", "nausea", "light_sensitivity"]));
        assert_eq!(detected[0].pattern.condition_id, "migraine");
        assert!(!has_emergency_pattern(&detected));
    }

    #[test]
    fn insights_name_pattern_and_pearl() {
        let detector = CorrelationDetector::default();
        let detected =
            detector.detect(&tokens(&["face_drooping", "arm_weakness", "slurred_speech"]));
        assert_eq!(
            clinical_insights(&detected),
            vec!["Stroke (FAST): Time is brain - immediate 911, note onset time"]
        );
    }

    #[test]
    fn custom_library_is_used() {
        let detector = CorrelationDetector::new(vec![pattern(
            "Tiny",
            "x",
            &["a", "b"],
            2.0,
            0.5,
            "pearl",
        )]);
        assert!(detector.detect(&tokens(&["a"])).is_empty());
        assert_eq!(detector.detect(&tokens(&["a", "b"])).len(), 1);
    }
}
