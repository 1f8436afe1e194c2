use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Application-level constants
pub const APP_NAME: &str = "symptom-engine";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "symptom_engine=info,warn"
}

/// Bundled knowledge base shipped with the crate (`resources/`).
pub fn bundled_resources_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("resources")
}

// ═══════════════════════════════════════════════════════════
// Engine tunables
// ═══════════════════════════════════════════════════════════

/// Every threshold the orchestrator and question selector consult.
///
/// Confidences are on the 0-100 scale; ratios are fractions of the total
/// confidence mass of the considered candidate set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Candidates must exceed `pruning_threshold * 100` to survive.
    pub pruning_threshold: f64,
    /// Survivor cap applied once the list exceeds `aggressive_prune_threshold`.
    pub max_candidates: usize,
    pub aggressive_prune_threshold: usize,
    /// At or above this top confidence no question is asked.
    pub early_exit_confidence: f64,
    /// Duration/severity questions need this share of mass with a known value.
    pub min_coverage_ratio: f64,
    /// Best split above this share of mass means nothing can separate the field.
    pub plateau_ratio: f64,
    /// Symptom questions below this share of mass are bundle-worthy.
    pub good_question_ratio: f64,
    /// How many top candidates the question selector considers.
    pub question_pool_size: usize,
    pub max_bundle_size: usize,
    /// Below this top confidence the region triage question is offered.
    pub low_confidence_fallback: f64,
    /// Top-two gap under which the leader is flagged as uncertain.
    pub uncertainty_gap: f64,
    /// Rule results above this probability are folded into the alerts.
    pub rule_alert_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pruning_threshold: 0.01,
            max_candidates: 20,
            aggressive_prune_threshold: 50,
            early_exit_confidence: 90.0,
            min_coverage_ratio: 0.4,
            plateau_ratio: 0.85,
            good_question_ratio: 0.6,
            question_pool_size: 8,
            max_bundle_size: 3,
            low_confidence_fallback: 40.0,
            uncertainty_gap: 15.0,
            rule_alert_threshold: 0.5,
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Engine configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let ratios = [
            ("pruning_threshold", self.pruning_threshold),
            ("min_coverage_ratio", self.min_coverage_ratio),
            ("plateau_ratio", self.plateau_ratio),
            ("good_question_ratio", self.good_question_ratio),
            ("rule_alert_threshold", self.rule_alert_threshold),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        let confidences = [
            ("early_exit_confidence", self.early_exit_confidence),
            ("low_confidence_fallback", self.low_confidence_fallback),
            ("uncertainty_gap", self.uncertainty_gap),
        ];
        for (name, value) in confidences {
            if !(0.0..=100.0).contains(&value) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be within [0, 100], got {value}"
                )));
            }
        }

        if self.question_pool_size == 0 || self.max_bundle_size == 0 || self.max_candidates == 0 {
            return Err(EngineError::InvalidConfig(
                "question_pool_size, max_bundle_size and max_candidates must be positive".into(),
            ));
        }

        Ok(())
    }
}
