//! Validated clinical decision rules (Wells DVT, PERC, HEART, NEXUS, Ottawa).
//!
//! Each rule is a pure scoring function registered with the tokens that make
//! it applicable. A result's `confidence` is the published post-test
//! probability for the score band, never blended into candidate scoring.

use serde::{Deserialize, Serialize};

use crate::models::UserProfile;

/// Age assumed when the profile gives none or it cannot be parsed.
pub const DEFAULT_AGE: u32 = 30;

/// Demographic inputs consumed by the rules. Absent data stays conservative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Demographics {
    pub age: u32,
    pub cancer_treatment_recent: bool,
    pub hormonal_therapy: bool,
    pub birth_control: bool,
    /// Troponin as a multiple of the upper reference limit.
    pub troponin_level: Option<f64>,
}

impl Default for Demographics {
    fn default() -> Self {
        Self {
            age: DEFAULT_AGE,
            cancer_treatment_recent: false,
            hormonal_therapy: false,
            birth_control: false,
            troponin_level: None,
        }
    }
}

impl Demographics {
    pub fn from_profile(profile: Option<&UserProfile>) -> Self {
        let Some(profile) = profile else {
            return Self::default();
        };

        let medications = profile
            .medications
            .as_deref()
            .unwrap_or("")
            .to_lowercase();

        Self {
            age: profile
                .age
                .as_deref()
                .and_then(parse_leading_age)
                .unwrap_or(DEFAULT_AGE),
            cancer_treatment_recent: profile.cancer_treatment_recent.unwrap_or(false),
            hormonal_therapy: profile.hormonal_therapy.unwrap_or(false)
                || medications.contains("hormone")
                || medications.contains("estrogen"),
            birth_control: medications.contains("birth control")
                || medications.contains("contraceptive"),
            troponin_level: profile.troponin_level,
        }
    }
}

/// Leading digits of a free-text age ("60", "60 years", "45+").
fn parse_leading_age(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    pub rule: String,
    pub score: i32,
    pub interpretation: String,
    pub recommendation: String,
    /// Literature-derived probability for this score band.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_note: Option<String>,
}

impl RuleResult {
    /// Plain-language line folded into the response alerts.
    pub fn alert_text(&self) -> String {
        format!(
            "MEDICAL RULE ({}): {}. {}",
            self.rule, self.interpretation, self.recommendation
        )
    }
}

// ── Rule registry ───────────────────────────────────────────

struct ClinicalRule {
    id: &'static str,
    /// Any of these tokens makes the rule applicable.
    triggers: &'static [&'static str],
    evaluate: fn(&Tokens<'_>, &Demographics) -> RuleResult,
}

static RULES: &[ClinicalRule] = &[
    ClinicalRule {
        id: "wells_dvt",
        triggers: &["leg_swelling", "calf_pain", "leg_pain"],
        evaluate: wells_dvt,
    },
    ClinicalRule {
        id: "perc_pe",
        triggers: &["shortness_of_breath", "chest_pain", "sudden_dyspnea"],
        evaluate: perc_pe,
    },
    ClinicalRule {
        id: "heart_score",
        triggers: &["chest_pain", "chest_discomfort"],
        evaluate: heart_score,
    },
    ClinicalRule {
        id: "nexus_c_spine",
        triggers: &["neck_injury", "neck_pain_trauma"],
        evaluate: nexus_c_spine,
    },
    ClinicalRule {
        id: "ottawa_ankle",
        triggers: &["ankle_injury", "ankle_pain_trauma"],
        evaluate: ottawa_ankle,
    },
];

/// Token lookup shared by every rule.
struct Tokens<'a>(&'a [String]);

impl Tokens<'_> {
    fn has(&self, token: &str) -> bool {
        self.0.iter().any(|t| t == token)
    }

    fn any(&self, tokens: &[&str]) -> bool {
        tokens.iter().any(|t| self.has(t))
    }
}

/// Run every rule whose trigger tokens are present, in registry order.
pub fn apply_rules(symptoms: &[String], demographics: &Demographics) -> Vec<RuleResult> {
    let tokens = Tokens(symptoms);
    RULES
        .iter()
        .filter(|rule| tokens.any(rule.triggers))
        .map(|rule| {
            let result = (rule.evaluate)(&tokens, demographics);
            tracing::debug!(
                rule_id = rule.id,
                score = result.score,
                confidence = result.confidence,
                "Clinical decision rule applied"
            );
            result
        })
        .collect()
}

// ── Wells DVT ───────────────────────────────────────────────

fn wells_dvt(tokens: &Tokens<'_>, demographics: &Demographics) -> RuleResult {
    let criteria: [(bool, i32, &str); 9] = [
        (
            tokens.any(&["active_cancer", "cancer"]) || demographics.cancer_treatment_recent,
            1,
            "Active cancer (+1)",
        ),
        (
            tokens.any(&["paralysis", "recent_cast"]),
            1,
            "Immobilization (+1)",
        ),
        (
            tokens.any(&["bedridden", "recent_surgery"]),
            1,
            "Recent immobilization/surgery (+1)",
        ),
        (
            tokens.any(&["calf_tenderness", "deep_vein_tenderness"]),
            1,
            "Localized tenderness (+1)",
        ),
        (tokens.has("leg_swelling_entire"), 1, "Entire leg swollen (+1)"),
        (tokens.has("calf_asymmetry"), 1, "Calf asymmetry (+1)"),
        (tokens.has("pitting_edema"), 1, "Pitting edema (+1)"),
        (tokens.has("superficial_veins"), 1, "Collateral veins (+1)"),
        (
            tokens.has("alternative_diagnosis_likely"),
            -2,
            "Alternative diagnosis likely (-2)",
        ),
    ];

    let mut score = 0;
    let mut findings = Vec::new();
    for (present, points, finding) in criteria {
        if present {
            score += points;
            findings.push(finding);
        }
    }

    let (interpretation, recommendation, confidence) = if score >= 3 {
        (
            "DVT likely (high probability)",
            "Compression ultrasonography recommended. If negative, consider D-dimer or serial ultrasounds.",
            0.75,
        )
    } else if score >= 1 {
        (
            "DVT possible (moderate probability)",
            "D-dimer test recommended. If positive, proceed to ultrasound.",
            0.17,
        )
    } else {
        (
            "DVT unlikely (low probability)",
            "D-dimer test. If negative, DVT essentially ruled out (NPV 96%).",
            0.05,
        )
    };

    RuleResult {
        rule: "Wells Score for DVT".into(),
        score,
        interpretation: interpretation.into(),
        recommendation: recommendation.into(),
        confidence,
        clinical_note: Some(findings.join(", ")),
    }
}

// ── PERC ────────────────────────────────────────────────────

fn perc_pe(tokens: &Tokens<'_>, demographics: &Demographics) -> RuleResult {
    let criteria = [
        ("age_over_50", demographics.age > 50),
        ("hr_over_100", tokens.has("heart_rate_over_100")),
        ("spo2_under_95", tokens.has("oxygen_saturation_low")),
        ("hemoptysis", tokens.has("coughing_blood")),
        (
            "estrogen_use",
            demographics.hormonal_therapy
                || demographics.birth_control
                || tokens.any(&["hormonal_therapy", "birth_control"]),
        ),
        ("prior_dvt_pe", tokens.any(&["history_dvt", "history_pe"])),
        ("recent_surgery", tokens.has("surgery_within_4weeks")),
        ("unilateral_leg_swelling", tokens.has("one_leg_swelling")),
    ];

    let failed: Vec<&str> = criteria
        .iter()
        .filter(|(_, positive)| *positive)
        .map(|(name, _)| *name)
        .collect();

    if failed.is_empty() {
        RuleResult {
            rule: "PERC Rule for PE".into(),
            score: 0,
            interpretation: "PERC negative - PE extremely unlikely".into(),
            recommendation: "No further testing needed. PE ruled out with 99.6% NPV.".into(),
            confidence: 0.004,
            clinical_note: Some("All 8 PERC criteria negative".into()),
        }
    } else {
        RuleResult {
            rule: "PERC Rule for PE".into(),
            score: failed.len() as i32,
            interpretation: "PERC positive - Cannot rule out PE".into(),
            recommendation: format!("D-dimer recommended. Failed criteria: {}", failed.join(", ")),
            confidence: 0.15,
            clinical_note: Some(format!("{}/8 criteria positive", failed.len())),
        }
    }
}

// ── HEART ───────────────────────────────────────────────────

fn heart_score(tokens: &Tokens<'_>, demographics: &Demographics) -> RuleResult {
    let mut score = 0;
    let mut details = Vec::new();

    if tokens.has("high_risk_history") {
        score += 2;
        details.push("High-risk history (+2)");
    } else if tokens.has("moderate_risk_history") {
        score += 1;
        details.push("Moderate-risk history (+1)");
    } else {
        details.push("Low-risk history (0)");
    }

    // No EKG is available; reported findings stand in for it.
    if tokens.any(&["st_depression", "t_wave_inversion"]) {
        score += 2;
        details.push("EKG abnormalities (+2)");
    } else if tokens.has("nonspecific_ekg_changes") {
        score += 1;
        details.push("Non-specific EKG changes (+1)");
    }

    if demographics.age >= 65 {
        score += 2;
        details.push("Age ≥65 (+2)");
    } else if demographics.age >= 45 {
        score += 1;
        details.push("Age 45-64 (+1)");
    }

    let risk_factors = [
        "hypertension",
        "hyperlipidemia",
        "diabetes",
        "smoking",
        "obesity",
        "family_history_cad",
    ]
    .iter()
    .filter(|f| tokens.has(f))
    .count();
    if risk_factors >= 3 {
        score += 2;
        details.push("≥3 risk factors (+2)");
    } else if risk_factors >= 1 {
        score += 1;
        details.push("1-2 risk factors (+1)");
    }

    if let Some(troponin) = demographics.troponin_level {
        if troponin >= 3.0 {
            score += 2;
            details.push("Troponin ≥3x normal (+2)");
        } else if troponin >= 1.0 {
            score += 1;
            details.push("Troponin 1-3x normal (+1)");
        }
    }

    let (interpretation, recommendation, confidence) = if score >= 7 {
        (
            "High risk (50-65% MACE at 6 weeks)",
            "Admit for cardiology evaluation. Early invasive strategy.",
            0.57,
        )
    } else if score >= 4 {
        (
            "Moderate risk (12-17% MACE at 6 weeks)",
            "Observation unit. Serial troponins and stress test.",
            0.145,
        )
    } else {
        (
            "Low risk (1.7% MACE at 6 weeks)",
            "Safe for early discharge with outpatient follow-up.",
            0.017,
        )
    };

    RuleResult {
        rule: "HEART Score".into(),
        score,
        interpretation: interpretation.into(),
        recommendation: recommendation.into(),
        confidence,
        clinical_note: Some(details.join("; ")),
    }
}

// ── NEXUS ───────────────────────────────────────────────────

fn nexus_c_spine(tokens: &Tokens<'_>, _demographics: &Demographics) -> RuleResult {
    let criteria = [
        ("no_midline_tenderness", "midline_tenderness"),
        ("no_focal_deficit", "focal_neurological_deficit"),
        ("normal_alertness", "altered_mental_status"),
        ("no_intoxication", "intoxicated"),
        ("no_distracting_injury", "painful_distracting_injury"),
    ];
    let failed: Vec<&str> = criteria
        .iter()
        .filter(|(_, finding)| tokens.has(finding))
        .map(|(name, _)| *name)
        .collect();

    if failed.is_empty() {
        RuleResult {
            rule: "NEXUS C-Spine Criteria".into(),
            score: 5,
            interpretation: "C-spine injury extremely unlikely".into(),
            recommendation:
                "C-spine imaging NOT needed (99.6% NPV). Safe to clear C-spine clinically.".into(),
            confidence: 0.004,
            clinical_note: Some("All 5 NEXUS criteria met".into()),
        }
    } else {
        RuleResult {
            rule: "NEXUS C-Spine Criteria".into(),
            score: failed.len() as i32,
            interpretation: "Cannot rule out C-spine injury".into(),
            recommendation: format!("C-spine imaging recommended. Failed: {}", failed.join(", ")),
            confidence: 0.05,
            clinical_note: Some(format!("{} criteria not met", failed.len())),
        }
    }
}

// ── Ottawa ankle ────────────────────────────────────────────

fn ottawa_ankle(tokens: &Tokens<'_>, demographics: &Demographics) -> RuleResult {
    let needs_xray = demographics.age >= 55
        || tokens.any(&[
            "bone_tenderness_posterior_lateral_malleolus",
            "bone_tenderness_posterior_medial_malleolus",
            "unable_to_bear_weight_immediately",
            "unable_to_bear_weight_ed_4steps",
        ]);

    if needs_xray {
        RuleResult {
            rule: "Ottawa Ankle Rules".into(),
            score: 1,
            interpretation: "Ankle X-ray indicated".into(),
            recommendation: "Obtain ankle radiographs to rule out fracture".into(),
            confidence: 0.15,
            clinical_note: Some("One or more Ottawa criteria met".into()),
        }
    } else {
        RuleResult {
            rule: "Ottawa Ankle Rules".into(),
            score: 0,
            interpretation: "Ankle fracture highly unlikely".into(),
            recommendation: "X-ray not needed (98.5% NPV). Treat as soft tissue injury.".into(),
            confidence: 0.015,
            clinical_note: Some("No Ottawa criteria met - fracture ruled out".into()),
        }
    }
}
