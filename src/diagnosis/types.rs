use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{Condition, UserSymptomData};

use super::rules::RuleResult;
use super::uncertainty::UncertaintyEstimate;

// ---------------------------------------------------------------------------
// Reasoning trace
// ---------------------------------------------------------------------------

/// Which kind of evidence a trace step came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Prior,
    Location,
    Symptom,
    Absent,
    Trigger,
    Temporal,
    Profile,
    Pattern,
}

/// One signed log-odds contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub factor: String,
    pub impact: f64,
    #[serde(rename = "type")]
    pub kind: TraceKind,
}

impl ReasoningStep {
    pub fn new(factor: impl Into<String>, impact: f64, kind: TraceKind) -> Self {
        Self {
            factor: factor.into(),
            impact,
            kind,
        }
    }
}

// ---------------------------------------------------------------------------
// DiagnosisResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub condition: Condition,
    /// 0-100, `min(sigmoid(sum of trace impacts) * 100, 100)`. Not rounded:
    /// ranking and the trace both use full precision, so display layers round.
    pub confidence: f64,
    pub matched_keywords: Vec<String>,
    /// Every contribution in application order; `sigmoid(sum) * 100 == confidence`.
    pub reasoning_trace: Vec<ReasoningStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<UncertaintyEstimate>,
    /// Set on the top two results when they are within the configured gap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty_flag: Option<bool>,
}

impl DiagnosisResult {
    pub fn new(condition: Condition, confidence: f64) -> Self {
        Self {
            condition,
            confidence,
            matched_keywords: Vec::new(),
            reasoning_trace: Vec::new(),
            uncertainty: None,
            uncertainty_flag: None,
        }
    }

    /// Sum of all trace impacts (the final log-odds).
    pub fn log_odds(&self) -> f64 {
        self.reasoning_trace.iter().map(|s| s.impact).sum()
    }
}

// ---------------------------------------------------------------------------
// Follow-up questions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Yes/no question answered through `symptom_key`.
    Clarification,
    /// Bundled checklist answered through `multi_select_tokens`.
    MultiChoice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarificationQuestion {
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub question: String,
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptom_key: Option<String>,
    /// One token per option, excluding the "None of the above" sentinel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_select_tokens: Option<Vec<String>>,
    #[serde(default)]
    pub related_conditions: Vec<String>,
}

impl ClarificationQuestion {
    pub fn clarification(question: impl Into<String>, options: &[&str], symptom_key: &str) -> Self {
        Self {
            kind: QuestionKind::Clarification,
            question: question.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            symptom_key: Some(symptom_key.to_string()),
            multi_select_tokens: None,
            related_conditions: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// Everything one `diagnose` call returns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResponse {
    pub results: Vec<DiagnosisResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<ClarificationQuestion>,
    pub alerts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<UncertaintyEstimate>,
    pub clinical_rules: Vec<RuleResult>,
    pub clinical_insights: Vec<String>,
    pub emergency_pattern: bool,
}

// ---------------------------------------------------------------------------
// Candidate retrieval seam
// ---------------------------------------------------------------------------

/// Supplies the candidate conditions for a report. Search and indexing live
/// behind this trait; the engine only scores what it is given.
pub trait CandidateSource {
    fn candidates(&self, symptoms: &UserSymptomData) -> Result<Vec<Condition>, EngineError>;
}
