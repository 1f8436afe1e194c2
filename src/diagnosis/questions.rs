//! Adaptive follow-up question selection.
//!
//! Every unknown attribute of the leading candidates is scored by how evenly
//! it splits their confidence mass. The most even split (after cost weighting)
//! becomes the next question, or several good symptom splits are bundled into
//! one checklist.

use std::collections::HashSet;

use crate::config::EngineConfig;
use crate::models::enums::{DurationHint, Severity};
use crate::models::{Condition, UserSymptomData};

use super::types::{ClarificationQuestion, DiagnosisResult, QuestionKind};

/// Trigger values too generic to ask about.
static TRIGGER_BLACKLIST: &[&str] = &[
    "flu", "virus", "infection", "bacteria", "disease", "sickness", "cold",
];

const TRIGGER_COST: f64 = 1.5;
const MIMIC_COST: f64 = 0.1;
const NONE_OF_THE_ABOVE: &str = "None of the above";

/// What the selector decided for this turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Ask(ClarificationQuestion),
    /// The best split is too one-sided; asking more will not separate the field.
    Plateau,
    /// No unknown attribute was available to ask about.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Attribute {
    Duration,
    Severity,
    Symptom,
    Trigger,
    PainType,
}

#[derive(Debug, Clone)]
struct Candidate {
    attribute: Attribute,
    key: String,
    /// `split * cost`; lower is better.
    score: f64,
    question: String,
    options: Vec<String>,
}

/// Pick the next question from already ranked `results`.
pub fn select_question(
    results: &[DiagnosisResult],
    symptoms: &UserSymptomData,
    config: &EngineConfig,
) -> Selection {
    let pool = &results[..results.len().min(config.question_pool_size)];
    let total: f64 = pool.iter().map(|r| r.confidence).sum();
    let known = symptoms.known_text();
    let is_unknown = |term: &str| !known.contains(&term.to_lowercase());

    let mut candidates: Vec<Candidate> = Vec::new();
    let min_coverage = total * config.min_coverage_ratio;

    // ── Duration ──
    if ["acute", "chronic", "days", "months"].iter().all(|t| is_unknown(*t)) {
        let acute = duration_mass(pool, &[DurationHint::Acute, DurationHint::Any]);
        let chronic = duration_mass(pool, &[DurationHint::Chronic, DurationHint::Any]);
        let coverage = duration_mass(
            pool,
            &[DurationHint::Acute, DurationHint::Chronic, DurationHint::Any],
        );
        if coverage >= min_coverage {
            candidates.push(Candidate {
                attribute: Attribute::Duration,
                key: "duration".into(),
                score: (acute - chronic).abs(),
                question: "How long have you been experiencing these symptoms?".into(),
                options: vec![
                    "Recently (Days/Weeks)".into(),
                    "Long time (Months/Years)".into(),
                ],
            });
        }
    }

    // ── Severity ──
    // Every condition has a severity, so coverage is the whole pool.
    if is_unknown("severe") && is_unknown("mild") && total >= min_coverage {
        let severe: f64 = pool
            .iter()
            .filter(|r| is_severe(&r.condition))
            .map(|r| r.confidence)
            .sum();
        candidates.push(Candidate {
            attribute: Attribute::Severity,
            key: "severity".into(),
            score: (severe - (total - severe)).abs(),
            question: "How would you describe the intensity?".into(),
            options: vec!["Mild / Manageable".into(), "Severe / Unbearable".into()],
        });
    }

    // ── Symptoms, triggers, pain types ──
    let mimic_pair = match pool {
        [first, second, ..] if first.condition.is_mimic_of(&second.condition) => {
            Some((&first.condition, &second.condition))
        }
        _ => None,
    };

    for (attribute, value) in collect_features(pool) {
        if attribute == Attribute::Trigger {
            let lower = value.to_lowercase();
            if TRIGGER_BLACKLIST.iter().any(|b| lower.contains(b)) {
                continue;
            }
        }
        if !is_unknown(value.as_str()) {
            continue;
        }

        let yes: f64 = pool
            .iter()
            .filter(|r| has_feature(&r.condition, attribute, &value))
            .map(|r| r.confidence)
            .sum();
        let split = (yes - (total - yes)).abs();

        let mut cost = if attribute == Attribute::Trigger {
            TRIGGER_COST
        } else {
            1.0
        };
        if let Some((first, second)) = mimic_pair {
            if has_feature(first, attribute, &value) != has_feature(second, attribute, &value) {
                cost = MIMIC_COST;
            }
        }

        let (question, options) = match attribute {
            Attribute::Trigger => (
                format!("Does it worsen with {value}?"),
                vec![format!("Yes, worsens with {value}"), "No".to_string()],
            ),
            Attribute::PainType => (
                format!("Is the sensation {value}?"),
                vec![format!("Yes, it is {value}"), "No".to_string()],
            ),
            _ => (
                format!("Do you also experience {value}?"),
                vec![format!("Yes, I have {value}"), "No".to_string()],
            ),
        };

        candidates.push(Candidate {
            attribute,
            key: value,
            score: split * cost,
            question,
            options,
        });
    }

    candidates.sort_by(|a, b| a.score.total_cmp(&b.score));

    let Some(best) = candidates.first() else {
        return Selection::Exhausted;
    };

    if best.score > total * config.plateau_ratio {
        tracing::debug!(best = %best.key, score = best.score, total, "Question plateau reached");
        return Selection::Plateau;
    }

    let related: Vec<String> = pool.iter().map(|r| r.condition.id.clone()).collect();

    let good: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.attribute == Attribute::Symptom && c.score < total * config.good_question_ratio)
        .take(config.max_bundle_size)
        .collect();

    if good.len() >= 2 {
        let tokens: Vec<String> = good.iter().map(|c| c.key.clone()).collect();
        let mut options = tokens.clone();
        options.push(NONE_OF_THE_ABOVE.to_string());
        return Selection::Ask(ClarificationQuestion {
            kind: QuestionKind::MultiChoice,
            question: "Are you experiencing any of the following?".into(),
            options,
            symptom_key: None,
            multi_select_tokens: Some(tokens),
            related_conditions: related,
        });
    }

    Selection::Ask(ClarificationQuestion {
        kind: QuestionKind::Clarification,
        question: best.question.clone(),
        options: best.options.clone(),
        symptom_key: Some(best.key.clone()),
        multi_select_tokens: None,
        related_conditions: related,
    })
}

/// Broad body-region triage question for low-confidence reports.
///
/// Each question is asked at most once: it is skipped when its key term
/// already appears in what the user has said.
pub fn region_fallback(symptoms: &UserSymptomData) -> Option<ClarificationQuestion> {
    let locations = symptoms.location_text();
    let known = symptoms.known_text();

    let (guard, question) = if locations.contains("head") || locations.contains("neck") {
        (
            "vision",
            ClarificationQuestion::clarification(
                "Is the pain accompanied by any vision changes or sensitivity to light?",
                &["Yes, vision changes/light sensitivity", "No"],
                "vision_changes",
            ),
        )
    } else if locations.contains("stomach") || locations.contains("abdomen") {
        (
            "appetite",
            ClarificationQuestion::clarification(
                "Do you notice any changes in your appetite or bowel movements?",
                &["Yes, appetite/bowel changes", "No"],
                "appetite_changes",
            ),
        )
    } else if locations.contains("chest") {
        (
            "breath",
            ClarificationQuestion::clarification(
                "Do you experience shortness of breath or palpitations?",
                &["Yes, breathlessness/palpitations", "No"],
                "breathlessness",
            ),
        )
    } else {
        return None;
    };

    (!known.contains(guard)).then_some(question)
}

fn duration_mass(pool: &[DiagnosisResult], accept: &[DurationHint]) -> f64 {
    pool.iter()
        .filter(|r| {
            r.condition
                .match_criteria
                .duration_hint
                .is_some_and(|h| accept.contains(&h))
        })
        .map(|r| r.confidence)
        .sum()
}

fn is_severe(condition: &Condition) -> bool {
    condition.severity == Severity::Severe || condition.has_type("severe")
}

fn has_feature(condition: &Condition, attribute: Attribute, value: &str) -> bool {
    match attribute {
        Attribute::Symptom => condition.has_special_symptom(value),
        Attribute::Trigger => condition.has_trigger(value),
        Attribute::PainType => condition.has_type(value),
        Attribute::Duration | Attribute::Severity => false,
    }
}

/// Distinct symptom, trigger and pain-type values across the pool, in
/// first-seen order. Values differing only in case count once.
fn collect_features(pool: &[DiagnosisResult]) -> Vec<(Attribute, String)> {
    let mut seen: HashSet<(Attribute, String)> = HashSet::new();
    let mut features = Vec::new();
    for result in pool {
        let criteria = &result.condition.match_criteria;
        let groups = [
            (Attribute::Symptom, &criteria.special_symptoms),
            (Attribute::Trigger, &criteria.triggers),
            (Attribute::PainType, &criteria.types),
        ];
        for (attribute, values) in groups {
            for value in values.iter().filter(|v| !v.trim().is_empty()) {
                if seen.insert((attribute, value.trim().to_lowercase())) {
                    features.push((attribute, value.clone()));
                }
            }
        }
    }
    features
}
