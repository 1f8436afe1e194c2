//! Turns a point confidence into an interval whose width reflects how much
//! evidence backs it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceQuality {
    Strong,
    Moderate,
    Weak,
}

impl EvidenceQuality {
    /// Full interval width before the mid-range adjustment.
    pub fn base_width(&self) -> f64 {
        match self {
            Self::Strong => 10.0,
            Self::Moderate => 15.0,
            Self::Weak => 25.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationQuality {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl CalibrationQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalClarity {
    Clear,
    Vague,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceQualityMetrics {
    pub symptom_count: usize,
    /// 0-1; specificity of the strongest detected pattern.
    pub specificity_of_symptoms: f64,
    pub has_lab_results: bool,
    pub has_physical_exam: bool,
    pub temporal_clarity: TemporalClarity,
    /// 0-1; confidence of the top detected pattern.
    pub symptom_correlation: f64,
}

impl Default for EvidenceQualityMetrics {
    fn default() -> Self {
        Self {
            symptom_count: 0,
            specificity_of_symptoms: 0.5,
            has_lab_results: false,
            has_physical_exam: false,
            temporal_clarity: TemporalClarity::Vague,
            symptom_correlation: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UncertaintyEstimate {
    pub point_estimate: f64,
    pub confidence_interval: ConfidenceInterval,
    pub calibration_quality: CalibrationQuality,
    pub evidence_quality: EvidenceQuality,
    pub explanation: String,
    pub should_request_more_info: bool,
}

impl UncertaintyEstimate {
    /// One-line rendering for display collaborators.
    pub fn summary(&self) -> String {
        format!(
            "Confidence: {:.0}% (range {:.0}%-{:.0}%). Quality: {}. {}",
            self.point_estimate,
            self.confidence_interval.lower,
            self.confidence_interval.upper,
            self.calibration_quality.as_str(),
            self.explanation
        )
    }
}

/// Additive quality score bucketed into strong (>= 8), moderate (>= 4), weak.
pub fn assess_evidence_quality(metrics: &EvidenceQualityMetrics) -> EvidenceQuality {
    let mut score = 0;

    if metrics.symptom_count >= 5 {
        score += 2;
    } else if metrics.symptom_count >= 3 {
        score += 1;
    }

    if metrics.specificity_of_symptoms >= 0.8 {
        score += 3;
    } else if metrics.specificity_of_symptoms >= 0.6 {
        score += 2;
    } else if metrics.specificity_of_symptoms >= 0.4 {
        score += 1;
    }

    if metrics.has_lab_results {
        score += 3;
    }
    if metrics.has_physical_exam {
        score += 2;
    }
    if metrics.temporal_clarity == TemporalClarity::Clear {
        score += 1;
    }
    if metrics.symptom_correlation > 0.7 {
        score += 2;
    }

    match score {
        s if s >= 8 => EvidenceQuality::Strong,
        s if s >= 4 => EvidenceQuality::Moderate,
        _ => EvidenceQuality::Weak,
    }
}

/// Scores near 50 are the least certain; widen their interval by up to 50%.
fn adjusted_width(base_width: f64, score: f64) -> f64 {
    let distance_from_mid = (score - 50.0).abs();
    base_width * (1.0 + (1.0 - distance_from_mid / 50.0) * 0.5)
}

fn calibration(quality: EvidenceQuality, width: f64) -> CalibrationQuality {
    match quality {
        EvidenceQuality::Strong if width < 15.0 => CalibrationQuality::Excellent,
        EvidenceQuality::Strong => CalibrationQuality::Good,
        EvidenceQuality::Moderate if width < 20.0 => CalibrationQuality::Good,
        EvidenceQuality::Moderate => CalibrationQuality::Moderate,
        EvidenceQuality::Weak => CalibrationQuality::Poor,
    }
}

fn explain(width: f64, metrics: &EvidenceQualityMetrics) -> String {
    if width < 10.0 {
        let reason = if metrics.has_lab_results {
            "laboratory results strongly support this diagnosis"
        } else if metrics.symptom_correlation > 0.8 {
            "symptoms form a classic clinical pattern"
        } else if metrics.specificity_of_symptoms > 0.85 {
            "highly specific symptoms present"
        } else {
            "strong evidence supports this diagnosis"
        };
        format!("High confidence - {reason}")
    } else if width < 20.0 {
        let reason = if metrics.symptom_count < 3 {
            "additional symptoms would improve accuracy"
        } else if metrics.temporal_clarity == TemporalClarity::Vague {
            "clarifying timeline would help"
        } else if metrics.specificity_of_symptoms < 0.6 {
            "symptoms are somewhat non-specific"
        } else {
            "more information would improve confidence"
        };
        format!("Moderate confidence - {reason}")
    } else if width < 30.0 {
        let reason = if metrics.symptom_count < 2 {
            "very few symptoms reported - need more detail"
        } else if !metrics.has_physical_exam && !metrics.has_lab_results {
            "no objective findings available"
        } else {
            "several conditions have similar presentations"
        };
        format!("Low confidence - {reason}")
    } else {
        let reason = if metrics.symptom_count < 2 {
            "Insufficient information to make a reliable assessment"
        } else if metrics.specificity_of_symptoms < 0.3 {
            "Symptoms are highly non-specific"
        } else {
            "Multiple conditions could explain these symptoms"
        };
        format!("Very low confidence - {reason}. Professional evaluation strongly recommended.")
    }
}

/// Interval, calibration and explanation for one point confidence (0-100).
pub fn quantify(score: f64, metrics: &EvidenceQualityMetrics) -> UncertaintyEstimate {
    let point = score.clamp(0.0, 100.0);
    let evidence_quality = assess_evidence_quality(metrics);
    let width = adjusted_width(evidence_quality.base_width(), point);

    let lower = (point - width / 2.0).max(0.0);
    let upper = (point + width / 2.0).min(100.0);
    let clamped_width = upper - lower;

    UncertaintyEstimate {
        point_estimate: point,
        confidence_interval: ConfidenceInterval {
            lower,
            upper,
            width: clamped_width,
        },
        calibration_quality: calibration(evidence_quality, width),
        evidence_quality,
        explanation: explain(clamped_width, metrics),
        should_request_more_info: clamped_width > 25.0
            || evidence_quality == EvidenceQuality::Weak
            || metrics.symptom_count < 3,
    }
}
