use std::time::Instant;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::models::{Condition, UserSymptomData};

use super::correlation::{
    clinical_insights, has_emergency_pattern, CorrelationDetector, DetectedPattern, SymptomPattern,
};
use super::emergency::scan_red_flags;
use super::normalize::extract_symptom_tokens;
use super::questions::{region_fallback, select_question, Selection};
use super::reference::KnowledgeBase;
use super::rules::{apply_rules, Demographics};
use super::scoring::{score_condition, ScoringContext};
use super::types::{CandidateSource, ClarificationQuestion, DiagnosisResponse, DiagnosisResult};
use super::uncertainty::{quantify, EvidenceQualityMetrics, TemporalClarity};

/// Stateless diagnostic engine.
///
/// Holds only read-only configuration and the pattern library; every call is
/// an independent function of its inputs. Conversational state lives with the
/// caller, who re-submits the accumulated report after each answer.
#[derive(Debug, Clone)]
pub struct DiagnosisEngine {
    config: EngineConfig,
    detector: CorrelationDetector,
}

impl Default for DiagnosisEngine {
    fn default() -> Self {
        Self {
            config: EngineConfig::default(),
            detector: CorrelationDetector::default(),
        }
    }
}

impl DiagnosisEngine {
    pub fn new(config: EngineConfig, patterns: Vec<SymptomPattern>) -> Self {
        Self {
            config,
            detector: CorrelationDetector::new(patterns),
        }
    }

    pub fn from_knowledge_base(config: EngineConfig, knowledge: &KnowledgeBase) -> Self {
        Self::new(config, knowledge.patterns.clone())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Retrieve candidates from `source`, then diagnose.
    pub fn diagnose_with(
        &self,
        source: &dyn CandidateSource,
        symptoms: &UserSymptomData,
    ) -> Result<DiagnosisResponse, EngineError> {
        let candidates = source.candidates(symptoms)?;
        Ok(self.diagnose(symptoms, &candidates))
    }

    /// Score, rank and triage `candidates` against one symptom report.
    ///
    /// The emergency scan and clinical rules always run, whatever the
    /// candidates score. An empty candidate list yields empty results.
    pub fn diagnose(&self, symptoms: &UserSymptomData, candidates: &[Condition]) -> DiagnosisResponse {
        let start = Instant::now();

        let mut alerts = scan_red_flags(symptoms);

        let tokens = extract_symptom_tokens(symptoms);
        let detected = self.detector.detect(&tokens);
        let demographics = Demographics::from_profile(symptoms.user_profile.as_ref());
        let clinical_rules = apply_rules(&tokens, &demographics);
        let metrics = evidence_metrics(symptoms, &tokens, &detected);

        let results = self.rank(symptoms, candidates, &detected, &metrics);

        let question = self.next_question(&results, symptoms);

        alerts.extend(
            clinical_rules
                .iter()
                .filter(|r| r.confidence > self.config.rule_alert_threshold)
                .map(|r| r.alert_text()),
        );

        let response = DiagnosisResponse {
            uncertainty: results.first().and_then(|r| r.uncertainty.clone()),
            clinical_insights: clinical_insights(&detected),
            emergency_pattern: has_emergency_pattern(&detected),
            results,
            question,
            alerts,
            clinical_rules,
        };

        tracing::info!(
            candidates = candidates.len(),
            results = response.results.len(),
            alerts = response.alerts.len(),
            question = ?response.question.as_ref().map(|q| q.kind),
            processing_ms = start.elapsed().as_millis() as u64,
            "Diagnosis complete"
        );

        response
    }

    /// Score every candidate, prune, sort and attach uncertainty.
    fn rank(
        &self,
        symptoms: &UserSymptomData,
        candidates: &[Condition],
        detected: &[DetectedPattern],
        metrics: &EvidenceQualityMetrics,
    ) -> Vec<DiagnosisResult> {
        let ctx = ScoringContext::new(symptoms);
        let floor = self.config.pruning_threshold * 100.0;

        let mut results: Vec<DiagnosisResult> = candidates
            .iter()
            .filter_map(|c| score_condition(c, &ctx, detected))
            .filter(|r| r.confidence > floor)
            .collect();

        results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        if results.len() > self.config.aggressive_prune_threshold {
            tracing::debug!(
                survivors = results.len(),
                kept = self.config.max_candidates,
                "Aggressive pruning applied"
            );
            results.truncate(self.config.max_candidates);
        }

        for result in &mut results {
            result.confidence = result.confidence.min(100.0);
            result.uncertainty = Some(quantify(result.confidence, metrics));
        }

        if let [first, second, ..] = results.as_mut_slice() {
            if first.confidence - second.confidence < self.config.uncertainty_gap {
                first.uncertainty_flag = Some(true);
                second.uncertainty_flag = Some(true);
            }
        }

        results
    }

    fn next_question(
        &self,
        results: &[DiagnosisResult],
        symptoms: &UserSymptomData,
    ) -> Option<ClarificationQuestion> {
        let top = results.first().map_or(0.0, |r| r.confidence);

        if results.len() >= 2 && top < self.config.early_exit_confidence {
            match select_question(results, symptoms, &self.config) {
                Selection::Ask(question) => return Some(question),
                Selection::Plateau => return None,
                Selection::Exhausted => {}
            }
        }

        if top < self.config.low_confidence_fallback {
            return region_fallback(symptoms);
        }
        None
    }
}

/// Evidence-quality inputs derived from the report and detected patterns.
fn evidence_metrics(
    symptoms: &UserSymptomData,
    tokens: &[String],
    detected: &[DetectedPattern],
) -> EvidenceQualityMetrics {
    EvidenceQualityMetrics {
        symptom_count: tokens.len(),
        specificity_of_symptoms: detected
            .iter()
            .map(|d| d.pattern.specificity)
            .reduce(f64::max)
            .unwrap_or(0.5),
        has_lab_results: symptoms
            .user_profile
            .as_ref()
            .is_some_and(|p| p.troponin_level.is_some()),
        has_physical_exam: false,
        temporal_clarity: if symptoms.duration.is_some() {
            TemporalClarity::Clear
        } else {
            TemporalClarity::Vague
        },
        symptom_correlation: detected.first().map_or(0.0, |d| d.confidence),
    }
}
