//! Per-candidate Bayesian scoring.
//!
//! Each candidate starts from the log prior of its prevalence bucket and
//! accumulates signed log-odds contributions from the reported evidence. Every
//! contribution is recorded in the reasoning trace, so the final confidence is
//! exactly `sigmoid(sum of trace impacts) * 100`.

use std::collections::HashSet;

use crate::models::enums::{Onset, Progression};
use crate::models::{Condition, UserSymptomData};

use super::correlation::{strongest_pattern_for, DetectedPattern};
use super::normalize::{normalize, normalize_symptoms, NormalizedEvidence};
use super::types::{DiagnosisResult, ReasoningStep, TraceKind};

const LOCATION_BOOST: f64 = 2.0;
const TYPE_BOOST: f64 = 2.0;
const WEIGHTED_BASE_BOOST: f64 = 3.0;
const SPECIFICITY_SCALE: f64 = 4.0;
const SENSITIVITY_GATE: f64 = 0.7;
const DENIED_SENSITIVITY_SCALE: f64 = 6.0;
const MISSING_SENSITIVITY_SCALE: f64 = 1.5;
const SPECIAL_SYMPTOM_BOOST: f64 = 3.0;
const EXTRA_MATCH_BOOST: f64 = 0.5;
const NO_MATCH_PENALTY: f64 = -0.5;
const CONFIRMED_ABSENT_BOOST: f64 = 2.5;
const TRIGGER_BOOST: f64 = 2.0;
const CONTRADICTION_PENALTY: f64 = -5.0;
const ONSET_BOOST: f64 = 2.0;
const PROGRESSION_BOOST: f64 = 1.5;
const NAME_MENTION_BOOST: f64 = 4.0;
const DOSHA_BOOST: f64 = 1.0;

/// Words too generic to count as a special-symptom match on their own.
static GENERIC_WORDS: &[&str] = &[
    "pain", "severe", "mild", "high", "low", "loss", "feeling", "sensation", "acute", "chronic",
    "chest", "head", "back", "stomach", "abdomen", "leg", "arm", "skin", "body", "limb", "area",
    "part",
];

/// Constitution keyword → condition-name keywords it aligns with.
static DOSHA_ALIGNMENT: &[(&str, &[&str])] = &[
    ("vata", &["vata", "arthritis", "anxiety"]),
    ("pitta", &["pitta", "acid", "migraine"]),
    ("kapha", &["kapha", "congestion", "diabetes"]),
];

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Everything derived from one symptom report, computed once per call and
/// shared across all candidates.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub evidence: NormalizedEvidence,
    user_locations: Vec<String>,
    location_text: String,
    mandatory_text: String,
    excluded: Vec<String>,
    triggers_text: Option<String>,
    duration_text: Option<String>,
    notes_text: Option<String>,
    prakriti: Option<String>,
}

impl ScoringContext {
    pub fn new(symptoms: &UserSymptomData) -> Self {
        let safe = |field: &Option<String>| field.as_deref().map(|v| normalize(v).safe_text);

        Self {
            evidence: normalize_symptoms(symptoms),
            user_locations: symptoms.location.iter().map(|l| l.to_lowercase()).collect(),
            location_text: symptoms.location_text(),
            mandatory_text: symptoms.mandatory_text(),
            excluded: symptoms
                .excluded_symptoms
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            triggers_text: safe(&symptoms.triggers),
            duration_text: safe(&symptoms.duration),
            notes_text: safe(&symptoms.additional_notes),
            prakriti: symptoms
                .user_profile
                .as_ref()
                .and_then(|p| p.dosha_profile.as_ref())
                .map(|d| d.prakriti.to_lowercase()),
        }
    }

    fn text(&self) -> &str {
        &self.evidence.expanded_text
    }

    fn is_denied(&self, symptom: &str) -> bool {
        self.excluded.iter().any(|ex| ex.contains(symptom)) || self.evidence.is_negated(symptom)
    }

    fn is_confirmed_absent(&self, symptom: &str) -> bool {
        self.excluded.iter().any(|ex| ex == symptom) || self.evidence.is_negated(symptom)
    }

    fn location_matches(&self, condition_location: &str) -> bool {
        let loc = condition_location.to_lowercase();
        self.location_text.contains(&loc) || self.user_locations.iter().any(|u| loc.contains(u))
    }
}

/// Accumulates the trace and matched keywords for one candidate.
struct Accumulator {
    trace: Vec<ReasoningStep>,
    keywords: Vec<String>,
}

impl Accumulator {
    fn add(&mut self, factor: impl Into<String>, impact: f64, kind: TraceKind) {
        self.trace.push(ReasoningStep::new(factor, impact, kind));
    }

    fn keyword(&mut self, keyword: impl Into<String>) {
        self.keywords.push(keyword.into());
    }
}

/// Score one candidate. `None` when a hard gate excludes it.
pub fn score_condition(
    condition: &Condition,
    ctx: &ScoringContext,
    detected: &[DetectedPattern],
) -> Option<DiagnosisResult> {
    let criteria = &condition.match_criteria;

    // Hard gate: every mandatory symptom must appear in the raw report.
    if let Some(missing) = condition
        .mandatory_symptoms
        .iter()
        .find(|m| !ctx.mandatory_text.contains(&m.to_lowercase()))
    {
        tracing::debug!(condition = %condition.id, missing = %missing, "Excluded: mandatory symptom absent");
        return None;
    }

    // Hard gate: a condition with declared locations needs one of them reported.
    if !criteria.locations.is_empty() && !criteria.locations.iter().any(|l| ctx.location_matches(l)) {
        tracing::debug!(condition = %condition.id, "Excluded: location mismatch");
        return None;
    }

    let mut acc = Accumulator {
        trace: Vec::new(),
        keywords: Vec::new(),
    };

    acc.add(
        format!("Prior ({})", condition.prevalence),
        condition.prevalence.prior().ln(),
        TraceKind::Prior,
    );

    if !criteria.locations.is_empty() {
        acc.add(
            format!("Location: {}", ctx.user_locations.join(", ")),
            LOCATION_BOOST,
            TraceKind::Location,
        );
    }

    for descriptor in non_empty(&criteria.types) {
        if ctx.text().contains(&descriptor.to_lowercase()) {
            acc.keyword(format!("Type: {descriptor}"));
            acc.add(format!("Type Match: {descriptor}"), TYPE_BOOST, TraceKind::Symptom);
        }
    }

    // Weighted symptoms: sensitivity/specificity aware.
    let mut handled: HashSet<String> = HashSet::new();
    for (symptom, config) in &criteria.symptom_weights {
        let symptom_lower = symptom.to_lowercase();
        if symptom_lower.is_empty() {
            continue;
        }

        if ctx.text().contains(&symptom_lower) {
            let specificity_bonus =
                (config.specificity.unwrap_or(0.0) - 0.5).max(0.0) * SPECIFICITY_SCALE;
            let boost = WEIGHTED_BASE_BOOST * config.weight.unwrap_or(1.0) + specificity_bonus;
            acc.keyword(symptom.clone());
            acc.add(format!("Symptom (Weighted): {symptom}"), boost, TraceKind::Symptom);
            handled.insert(symptom_lower);
            continue;
        }

        let sensitivity = config.sensitivity.unwrap_or(0.0);
        if sensitivity > SENSITIVITY_GATE {
            if ctx.is_denied(&symptom_lower) {
                acc.add(
                    format!("Absent High-Sensitivity: {symptom}"),
                    -(sensitivity - 0.5) * DENIED_SENSITIVITY_SCALE,
                    TraceKind::Absent,
                );
            } else {
                acc.add(
                    format!("Missing Expected: {symptom}"),
                    -(sensitivity - 0.5) * MISSING_SENSITIVITY_SCALE,
                    TraceKind::Symptom,
                );
            }
        }
    }

    // Unweighted special symptoms: flat boost per match.
    let special_matches: Vec<&String> = non_empty(&criteria.special_symptoms)
        .filter(|s| !handled.contains(&s.to_lowercase()))
        .filter(|s| special_symptom_matches(s, ctx.text()))
        .collect();
    for symptom in &special_matches {
        acc.keyword((*symptom).clone());
        acc.add(format!("Symptom: {symptom}"), SPECIAL_SYMPTOM_BOOST, TraceKind::Symptom);
    }
    if special_matches.len() > 1 {
        acc.add(
            format!("Multiple symptom matches ({})", special_matches.len()),
            EXTRA_MATCH_BOOST * (special_matches.len() - 1) as f64,
            TraceKind::Symptom,
        );
    }
    if special_matches.is_empty() && handled.is_empty() {
        acc.add("No characteristic symptoms matched", NO_MATCH_PENALTY, TraceKind::Symptom);
    }

    for absent in non_empty(&criteria.absent_symptoms) {
        if ctx.is_confirmed_absent(&absent.to_lowercase()) {
            acc.add(
                format!("Absent (confirms): {absent}"),
                CONFIRMED_ABSENT_BOOST,
                TraceKind::Absent,
            );
        }
    }

    if let Some(triggers) = &ctx.triggers_text {
        for trigger in non_empty(&criteria.triggers) {
            if triggers.contains(&trigger.to_lowercase()) {
                acc.keyword(format!("Trigger: {trigger}"));
                acc.add(format!("Trigger: {trigger}"), TRIGGER_BOOST, TraceKind::Trigger);
            }
        }
    }

    for symptom in non_empty(&criteria.special_symptoms) {
        if ctx.excluded.iter().any(|ex| *ex == symptom.to_lowercase()) {
            acc.add(format!("Excluded: {symptom}"), CONTRADICTION_PENALTY, TraceKind::Symptom);
        }
    }

    if let (Some(onset), Some(duration)) = (criteria.onset, &ctx.duration_text) {
        let matches = match onset {
            Onset::Sudden => duration.contains("sudden") || duration.contains("hour"),
            Onset::Gradual => {
                duration.contains("gradual") || duration.contains("month") || duration.contains("year")
            }
            Onset::Episodic => false,
        };
        if matches {
            acc.add(format!("Onset: {onset} (matches)"), ONSET_BOOST, TraceKind::Temporal);
        }
    }

    if let (Some(progression), Some(notes)) = (criteria.progression, &ctx.notes_text) {
        let matches = match progression {
            Progression::Worsening => notes.contains("worse") || notes.contains("getting bad"),
            Progression::Fluctuating => notes.contains("comes and goes") || notes.contains("episod"),
            Progression::Stable | Progression::Improving => false,
        };
        if matches {
            acc.add(
                format!("Progression: {progression}"),
                PROGRESSION_BOOST,
                TraceKind::Temporal,
            );
        }
    }

    if user_mentions(condition, ctx.text()) {
        acc.keyword(format!("User mentioned: {}", condition.name));
        acc.add(
            format!("User mentioned: {}", condition.name),
            NAME_MENTION_BOOST,
            TraceKind::Symptom,
        );
    }

    if let Some(dosha) = ctx
        .prakriti
        .as_deref()
        .and_then(|p| aligned_dosha(p, &condition.name))
    {
        acc.keyword("Prakriti Match");
        acc.add(format!("Prakriti alignment ({dosha})"), DOSHA_BOOST, TraceKind::Profile);
    }

    // Correlated patterns: one ln(multiplier) term, the strongest pattern wins.
    if let Some(best) = strongest_pattern_for(&condition.id, detected) {
        if best.pattern.multiplier > 0.0 {
            let factor = format!("Pattern: {}", best.pattern.name);
            acc.keyword(factor.clone());
            acc.add(factor, best.pattern.multiplier.ln(), TraceKind::Pattern);
        }
    }

    let log_odds: f64 = acc.trace.iter().map(|s| s.impact).sum();
    let mut result = DiagnosisResult::new(condition.clone(), sigmoid(log_odds) * 100.0);
    result.matched_keywords = acc.keywords;
    result.reasoning_trace = acc.trace;
    Some(result)
}

fn non_empty(values: &[String]) -> impl Iterator<Item = &String> {
    values.iter().filter(|v| !v.trim().is_empty())
}

/// Whole-phrase match, or any significant (long, non-generic) word of it.
fn special_symptom_matches(symptom: &str, text: &str) -> bool {
    let value = symptom.to_lowercase();
    if text.contains(&value) {
        return true;
    }
    value
        .split(' ')
        .filter(|w| w.len() > 3 && !GENERIC_WORDS.contains(w))
        .any(|w| text.contains(w))
}

fn user_mentions(condition: &Condition, text: &str) -> bool {
    let name = condition.name.to_lowercase();
    let id = condition.id.to_lowercase();
    (!name.is_empty() && text.contains(&name))
        || (!id.is_empty() && (text.contains(&id) || text.contains(&id.replace('_', " "))))
}

fn aligned_dosha(prakriti: &str, condition_name: &str) -> Option<&'static str> {
    let name = condition_name.to_lowercase();
    DOSHA_ALIGNMENT
        .iter()
        .find(|(dosha, keywords)| prakriti.contains(*dosha) && keywords.iter().any(|k| name.contains(k)))
        .map(|(dosha, _)| *dosha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::correlation::CorrelationDetector;
    use crate::diagnosis::normalize::extract_symptom_tokens;
    use crate::models::enums::Prevalence;
    use crate::models::{DoshaProfile, SymptomWeight, UserProfile};

    fn score(condition: &Condition, symptoms: &UserSymptomData) -> Option<DiagnosisResult> {
        score_condition(condition, &ScoringContext::new(symptoms), &[])
    }

    fn impact_of(result: &DiagnosisResult, factor: &str) -> Option<f64> {
        result
            .reasoning_trace
            .iter()
            .find(|s| s.factor == factor)
            .map(|s| s.impact)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn prior_only_candidate() {
        let condition = Condition::new("x", "Xyz", &[]);
        let result = score(&condition, &UserSymptomData::default()).unwrap();
        assert_eq!(result.reasoning_trace[0].kind, TraceKind::Prior);
        assert!(approx(result.reasoning_trace[0].impact, 0.01f64.ln()));
        assert_eq!(
            impact_of(&result, "No characteristic symptoms matched"),
            Some(-0.5)
        );
        assert!(approx(result.confidence, sigmoid(0.01f64.ln() - 0.5) * 100.0));
    }

    #[test]
    fn missing_mandatory_symptom_excludes() {
        let mut condition = Condition::new("gout", "Gout", &[]);
        condition.mandatory_symptoms.push("toe".into());
        let symptoms = UserSymptomData::with_location(&["knee"]).notes("swollen and red");
        assert!(score(&condition, &symptoms).is_none());

        let symptoms = UserSymptomData::with_location(&["big toe"]);
        assert!(score(&condition, &symptoms).is_some());
    }

    #[test]
    fn mandatory_check_uses_raw_text() {
        let mut condition = Condition::new("flu", "Influenza", &[]);
        condition.mandatory_symptoms.push("fever".into());
        let symptoms = UserSymptomData::default().notes("no fever");
        assert!(score(&condition, &symptoms).is_some());
    }

    #[test]
    fn disjoint_location_excludes() {
        let condition = Condition::new("migraine", "Migraine", &["head"]);
        assert!(score(&condition, &UserSymptomData::with_location(&["knee"])).is_none());
        assert!(score(&condition, &UserSymptomData::default()).is_none());
    }

    #[test]
    fn location_matches_substring_either_way() {
        let condition = Condition::new("lbp", "Low Back Pain", &["lower back"]);
        let result = score(&condition, &UserSymptomData::with_location(&["Back"])).unwrap();
        assert_eq!(impact_of(&result, "Location: back"), Some(2.0));

        let condition = Condition::new("sprain", "Sprain", &["ankle"]);
        assert!(score(&condition, &UserSymptomData::with_location(&["left ankle"])).is_some());
    }

    #[test]
    fn each_matching_type_adds_two() {
        let mut condition = Condition::new("gerd", "Acid Reflux", &["chest"]);
        condition.match_criteria.types = vec!["burning".into(), "sour".into(), "sharp".into()];
        let symptoms = UserSymptomData::with_location(&["chest"]).pain_type("burning, sour taste");
        let result = score(&condition, &symptoms).unwrap();
        assert_eq!(impact_of(&result, "Type Match: burning"), Some(2.0));
        assert_eq!(impact_of(&result, "Type Match: sour"), Some(2.0));
        assert_eq!(impact_of(&result, "Type Match: sharp"), None);
        assert!(result.matched_keywords.contains(&"Type: burning".to_string()));
    }

    #[test]
    fn weighted_symptom_boost_formula() {
        let mut condition = Condition::new("migraine", "Migraine", &[]);
        condition
            .match_criteria
            .symptom_weights
            .insert("aura".into(), SymptomWeight::new(1.2, 0.3, 0.9));
        let symptoms = UserSymptomData::default().notes("visual aura before the headache");
        let result = score(&condition, &symptoms).unwrap();
        // 3.0 * 1.2 + (0.9 - 0.5) * 4.0
        assert!(approx(impact_of(&result, "Symptom (Weighted): aura").unwrap(), 5.2));
        assert!(impact_of(&result, "No characteristic symptoms matched").is_none());
    }

    #[test]
    fn negated_weighted_symptom_is_penalised_not_boosted() {
        let mut condition = Condition::new("flu", "Influenza", &[]);
        condition
            .match_criteria
            .symptom_weights
            .insert("fever".into(), SymptomWeight::new(1.0, 0.9, 0.6));

        let denied = score(&condition, &UserSymptomData::default().notes("cough, no fever")).unwrap();
        assert!(impact_of(&denied, "Symptom (Weighted): fever").is_none());
        assert!(approx(impact_of(&denied, "Absent High-Sensitivity: fever").unwrap(), -2.4));

        let silent = score(&condition, &UserSymptomData::default().notes("cough")).unwrap();
        assert!(approx(impact_of(&silent, "Missing Expected: fever").unwrap(), -0.6));
        assert!(denied.confidence < silent.confidence);

        let excluded = score(&condition, &UserSymptomData::default().excluding("High Fever")).unwrap();
        assert!(impact_of(&excluded, "Absent High-Sensitivity: fever").is_some());
    }

    #[test]
    fn low_sensitivity_missing_symptom_is_free() {
        let mut condition = Condition::new("cluster", "Cluster Headache", &[]);
        condition
            .match_criteria
            .symptom_weights
            .insert("aura".into(), SymptomWeight::new(1.0, 0.3, 0.9));
        let result = score(&condition, &UserSymptomData::default()).unwrap();
        assert!(result
            .reasoning_trace
            .iter()
            .all(|s| !s.factor.contains("aura")));
    }

    #[test]
    fn special_symptoms_flat_boost_with_extra_matches() {
        let mut condition = Condition::new("migraine", "Migraine", &[]);
        condition.match_criteria.special_symptoms = vec![
            "nausea".into(),
            "light sensitivity".into(),
            "severe pain".into(),
        ];
        let symptoms = UserSymptomData::default().notes("sensitivity to bright light, queasy");
        let result = score(&condition, &symptoms).unwrap();
        assert_eq!(impact_of(&result, "Symptom: nausea"), Some(3.0));
        assert_eq!(impact_of(&result, "Symptom: light sensitivity"), Some(3.0));
        // "severe pain" only has generic words
        assert_eq!(impact_of(&result, "Symptom: severe pain"), None);
        assert_eq!(impact_of(&result, "Multiple symptom matches (2)"), Some(0.5));
    }

    #[test]
    fn weighted_symptom_not_double_counted_as_special() {
        let mut condition = Condition::new("vertigo", "Vertigo", &[]);
        condition.match_criteria.special_symptoms = vec!["fever".into()];
        condition
            .match_criteria
            .symptom_weights
            .insert("fever".into(), SymptomWeight::new(1.0, 0.5, 0.5));
        let result = score(&condition, &UserSymptomData::default().notes("fever")).unwrap();
        assert_eq!(impact_of(&result, "Symptom (Weighted): fever"), Some(3.0));
        assert_eq!(impact_of(&result, "Symptom: fever"), None);
    }

    #[test]
    fn confirmed_absent_symptoms_support_condition() {
        let mut condition = Condition::new("tension", "Tension Headache", &[]);
        condition.match_criteria.absent_symptoms = vec!["nausea".into(), "aura".into()];
        let symptoms = UserSymptomData::default()
            .notes("dull band, without nausea")
            .excluding("aura");
        let result = score(&condition, &symptoms).unwrap();
        assert_eq!(impact_of(&result, "Absent (confirms): nausea"), Some(2.5));
        assert_eq!(impact_of(&result, "Absent (confirms): aura"), Some(2.5));
    }

    #[test]
    fn negated_symptom_never_increases_score() {
        let mut condition = Condition::new("flu", "Influenza", &[]);
        condition.match_criteria.special_symptoms = vec!["fever".into()];
        let base = score(&condition, &UserSymptomData::default().notes("tired")).unwrap();
        let negated = score(&condition, &UserSymptomData::default().notes("tired, no fever")).unwrap();
        assert!(negated.confidence <= base.confidence);
        assert!(negated.matched_keywords.is_empty());
    }

    #[test]
    fn trailing_negator_in_triggers_does_not_reach_notes() {
        let mut condition = Condition::new("acs", "Acute Coronary Syndrome", &["chest"]);
        condition.match_criteria.special_symptoms = vec!["sweating".into()];
        let base = UserSymptomData::with_location(&["chest"]).notes("sweating, left arm pain");
        let unsure = base.clone().triggers("not sure");

        let base = score(&condition, &base).unwrap();
        let unsure = score(&condition, &unsure).unwrap();
        assert_eq!(impact_of(&unsure, "Symptom: sweating"), Some(3.0));
        assert!(unsure.matched_keywords.contains(&"sweating".to_string()));
        assert!(approx(unsure.confidence, base.confidence));
    }

    #[test]
    fn trigger_matches_and_denied_trigger_does_not() {
        let mut condition = Condition::new("asthma", "Asthma", &[]);
        condition.match_criteria.triggers = vec!["exercise".into(), "cold air".into()];
        let symptoms = UserSymptomData::default().triggers("Exercise and cold air");
        let result = score(&condition, &symptoms).unwrap();
        assert_eq!(impact_of(&result, "Trigger: exercise"), Some(2.0));
        assert_eq!(impact_of(&result, "Trigger: cold air"), Some(2.0));

        let symptoms = UserSymptomData::default().triggers("not exercise");
        let result = score(&condition, &symptoms).unwrap();
        assert_eq!(impact_of(&result, "Trigger: exercise"), None);
    }

    #[test]
    fn explicitly_excluded_special_symptom_is_contradiction() {
        let mut condition = Condition::new("strep", "Strep Throat", &[]);
        condition.match_criteria.special_symptoms = vec!["fever".into(), "swollen glands".into()];
        let result = score(&condition, &UserSymptomData::default().excluding("Fever")).unwrap();
        assert_eq!(impact_of(&result, "Excluded: fever"), Some(-5.0));
    }

    #[test]
    fn onset_and_progression() {
        let mut condition = Condition::new("vertigo", "Vertigo", &[]);
        condition.match_criteria.onset = Some(Onset::Sudden);
        condition.match_criteria.progression = Some(Progression::Fluctuating);
        let symptoms = UserSymptomData::default()
            .duration("Started a few hours ago")
            .notes("it comes and goes");
        let result = score(&condition, &symptoms).unwrap();
        assert_eq!(impact_of(&result, "Onset: sudden (matches)"), Some(2.0));
        assert_eq!(impact_of(&result, "Progression: fluctuating"), Some(1.5));

        condition.match_criteria.onset = Some(Onset::Gradual);
        condition.match_criteria.progression = Some(Progression::Worsening);
        let symptoms = UserSymptomData::default()
            .duration("over several months")
            .notes("steadily getting worse");
        let result = score(&condition, &symptoms).unwrap();
        assert_eq!(impact_of(&result, "Onset: gradual (matches)"), Some(2.0));
        assert_eq!(impact_of(&result, "Progression: worsening"), Some(1.5));
    }

    #[test]
    fn naming_the_condition_adds_four() {
        let condition = Condition::new("migraine", "Migraine", &[]);
        let symptoms = UserSymptomData::default().notes("I think it's a migraine again");
        let result = score(&condition, &symptoms).unwrap();
        assert_eq!(impact_of(&result, "User mentioned: Migraine"), Some(4.0));
    }

    #[test]
    fn dosha_alignment_adds_one() {
        let condition = Condition::new("acid", "Acid Reflux", &[]);
        let symptoms = UserSymptomData::default().profile(UserProfile {
            dosha_profile: Some(DoshaProfile {
                prakriti: "Pitta-Kapha".into(),
            }),
            ..UserProfile::default()
        });
        let result = score(&condition, &symptoms).unwrap();
        assert_eq!(impact_of(&result, "Prakriti alignment (pitta)"), Some(1.0));

        let unrelated = Condition::new("sprain", "Ankle Sprain", &[]);
        let result = score(&unrelated, &symptoms).unwrap();
        assert!(result.reasoning_trace.iter().all(|s| s.kind != TraceKind::Profile));
    }

    #[test]
    fn strongest_pattern_contributes_log_multiplier_once() {
        let mut condition = Condition::new("heart_attack", "Heart Attack", &["chest"]);
        condition.prevalence = Prevalence::Rare;
        let symptoms = UserSymptomData::with_location(&["chest"])
            .notes("left arm pain, sweating, nausea, jaw pain, back pain, fatigue");
        let tokens = extract_symptom_tokens(&symptoms);
        let detected = CorrelationDetector::default().detect(&tokens);
        let result =
            score_condition(&condition, &ScoringContext::new(&symptoms), &detected).unwrap();
        let patterns: Vec<_> = result
            .reasoning_trace
            .iter()
            .filter(|s| s.kind == TraceKind::Pattern)
            .collect();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].factor, "Pattern: Typical Myocardial Infarction");
        assert!(approx(patterns[0].impact, 5.0f64.ln()));
    }

    #[test]
    fn confidence_reconstructs_from_trace() {
        let mut condition = Condition::new("gerd", "Acid Reflux", &["chest"]);
        condition.prevalence = Prevalence::Common;
        condition.match_criteria.types = vec!["burning".into()];
        condition.match_criteria.special_symptoms = vec!["sour taste".into()];
        condition.match_criteria.triggers = vec!["spicy food".into()];
        let symptoms = UserSymptomData::with_location(&["chest"])
            .pain_type("burning")
            .triggers("spicy food")
            .notes("sour taste in mouth");
        let result = score(&condition, &symptoms).unwrap();
        assert!(approx(result.confidence, sigmoid(result.log_odds()) * 100.0));
        assert!(result.confidence > 50.0);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        const WORDS: &[&str] = &[
            "fever", "no", "not", "nausea", "pain", "head", "chest", "burning", "sudden",
            "worse", "cough", "rash", "without", ",", ".", "migraine", "aura", "hours",
        ];

        fn fixture() -> Condition {
            let mut condition = Condition::new("migraine", "Migraine", &["head"]);
            condition.match_criteria.types = vec!["throbbing".into(), "burning".into()];
            condition.match_criteria.special_symptoms = vec!["nausea".into(), "aura".into()];
            condition.match_criteria.absent_symptoms = vec!["fever".into()];
            condition.match_criteria.onset = Some(Onset::Sudden);
            condition
                .match_criteria
                .symptom_weights
                .insert("rash".into(), SymptomWeight::new(1.0, 0.9, 0.8));
            condition
        }

        proptest! {
            #[test]
            fn confidence_bounded_and_traceable(
                words in proptest::collection::vec(prop::sample::select(WORDS), 0..12),
            ) {
                let symptoms = UserSymptomData::with_location(&["head"])
                    .notes(&words.join(" "))
                    .duration(&words.join(" "));
                if let Some(result) = score(&fixture(), &symptoms) {
                    prop_assert!(result.confidence >= 0.0 && result.confidence <= 100.0);
                    prop_assert!((result.confidence - sigmoid(result.log_odds()) * 100.0).abs() < 1e-9);
                }
            }

            #[test]
            fn wrong_location_always_excluded(
                words in proptest::collection::vec(prop::sample::select(WORDS), 0..12),
            ) {
                let symptoms = UserSymptomData::with_location(&["knee"]).notes(&words.join(" "));
                prop_assert!(score(&fixture(), &symptoms).is_none());
            }
        }
    }
}
