//! Emergency pattern scanner.
//!
//! Runs on every call, before and independently of candidate scoring, so a
//! life-threatening presentation is reported even when no candidate survives.
//! Rules are co-occurrence checks over the raw lowercased report; several may
//! fire for the same text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::UserSymptomData;

/// Clinical area an emergency rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyCategory {
    Cardiac,
    Neurological,
    Respiratory,
    Allergic,
    Trauma,
    Abdominal,
    /// Routed to crisis resources rather than emergency services.
    MentalHealth,
    Metabolic,
}

/// One fired rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmergencyAlert {
    pub rule_id: &'static str,
    pub category: EmergencyCategory,
    pub message: &'static str,
}

/// Every group must contain at least one keyword present in the text.
type Clause = &'static [&'static [&'static str]];

enum EmergencyCondition {
    /// Fires when any clause is fully satisfied.
    CoOccurrence(&'static [Clause]),
    /// Self-harm language.
    Crisis,
}

struct EmergencyRule {
    id: &'static str,
    category: EmergencyCategory,
    condition: EmergencyCondition,
    message: &'static str,
}

static CRISIS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)suicid|kill myself|end my life|want to die|self.?harm|cutting myself|hurt myself|no reason to live|better off dead",
    )
    .expect("valid crisis regex")
});

// ── Rule registry ───────────────────────────────────────────

static RULES: &[EmergencyRule] = &[
    EmergencyRule {
        id: "CARD-001",
        category: EmergencyCategory::Cardiac,
        condition: EmergencyCondition::CoOccurrence(&[&[
            &["chest"],
            &["sweat", "arm", "crushing", "pressure"],
        ]]),
        message: "CARDIAC EMERGENCY: Potential heart attack. Call 911 immediately. Do not drive yourself.",
    },
    EmergencyRule {
        id: "CARD-002",
        category: EmergencyCategory::Cardiac,
        condition: EmergencyCondition::CoOccurrence(&[&[
            &["jaw", "back"],
            &["pain"],
            &["nausea", "sweat", "short of breath"],
        ]]),
        message: "CARDIAC EMERGENCY: Atypical heart attack symptoms. Call 911 immediately.",
    },
    EmergencyRule {
        id: "CARD-003",
        category: EmergencyCategory::Cardiac,
        condition: EmergencyCondition::CoOccurrence(&[&[
            &["chest"],
            &["back"],
            &["tearing", "ripping", "worst pain"],
        ]]),
        message: "CARDIAC EMERGENCY: Possible aortic dissection. Call 911 immediately. This is life-threatening.",
    },
    EmergencyRule {
        id: "NEURO-001",
        category: EmergencyCategory::Neurological,
        condition: EmergencyCondition::CoOccurrence(&[
            &[&["face"], &["droop", "numb"]],
            &[&["arm"], &["weak"]],
            &[&["speech"], &["slur", "confused"]],
        ]),
        message: "STROKE WARNING: Time is critical. Call 911 immediately. Note the time symptoms started.",
    },
    EmergencyRule {
        id: "NEURO-002",
        category: EmergencyCategory::Neurological,
        condition: EmergencyCondition::CoOccurrence(&[&[&["head"], &["neck"], &["stiff", "severe"]]]),
        message: "MENINGITIS RISK: Potential meningitis. Seek emergency care immediately.",
    },
    EmergencyRule {
        id: "NEURO-003",
        category: EmergencyCategory::Neurological,
        condition: EmergencyCondition::CoOccurrence(&[&[&[
            "worst headache",
            "thunderclap",
            "sudden severe headache",
        ]]]),
        message: "NEUROLOGICAL EMERGENCY: Sudden severe headache may indicate brain bleed. Call 911 immediately.",
    },
    EmergencyRule {
        id: "NEURO-004",
        category: EmergencyCategory::Neurological,
        condition: EmergencyCondition::CoOccurrence(&[&[&["seizure", "convulsion", "fitting"]]]),
        message: "SEIZURE DETECTED: If this is a first-time seizure or lasts >5 minutes, call 911.",
    },
    EmergencyRule {
        id: "RESP-001",
        category: EmergencyCategory::Respiratory,
        condition: EmergencyCondition::CoOccurrence(&[&[
            &["breath"],
            &["can't", "unable", "fail", "blue", "gasping"],
        ]]),
        message: "RESPIRATORY EMERGENCY: Severe breathing difficulty. Call 911 immediately.",
    },
    EmergencyRule {
        id: "RESP-002",
        category: EmergencyCategory::Respiratory,
        condition: EmergencyCondition::CoOccurrence(&[&[&[
            "choking",
            "can't swallow",
            "throat closing",
        ]]]),
        message: "CHOKING EMERGENCY: If unable to speak or breathe, perform Heimlich maneuver. Call 911.",
    },
    EmergencyRule {
        id: "RESP-003",
        category: EmergencyCategory::Respiratory,
        condition: EmergencyCondition::CoOccurrence(&[&[
            &["asthma"],
            &["severe", "not responding", "blue lips"],
        ]]),
        message: "SEVERE ASTHMA: Use rescue inhaler immediately. If no relief, call 911.",
    },
    EmergencyRule {
        id: "ALLERGY-001",
        category: EmergencyCategory::Allergic,
        condition: EmergencyCondition::CoOccurrence(&[&[
            &["allergic", "allergy"],
            &["throat", "swelling", "can't breathe", "hives"],
        ]]),
        message: "ANAPHYLAXIS RISK: Severe allergic reaction. Use EpiPen if available. Call 911 immediately.",
    },
    EmergencyRule {
        id: "ALLERGY-002",
        category: EmergencyCategory::Allergic,
        condition: EmergencyCondition::CoOccurrence(&[&[&["throat"], &["swelling"]]]),
        message: "AIRWAY EMERGENCY: Throat swelling can be life-threatening. Call 911 immediately.",
    },
    EmergencyRule {
        id: "TRAUMA-001",
        category: EmergencyCategory::Trauma,
        condition: EmergencyCondition::CoOccurrence(&[
            &[&["deformity", "deformed"]],
            &[&["bone"], &["poking", "protruding", "sticking out"]],
        ]),
        message: "SEVERE FRACTURE: Compound fracture suspected. Do not move. Call 911 immediately.",
    },
    EmergencyRule {
        id: "TRAUMA-002",
        category: EmergencyCategory::Trauma,
        condition: EmergencyCondition::CoOccurrence(&[&[
            &["head"],
            &["injury"],
            &["unconscious", "vomiting", "confused", "clear fluid"],
        ]]),
        message: "HEAD INJURY: Signs of serious head trauma. Call 911. Do not move patient.",
    },
    EmergencyRule {
        id: "TRAUMA-003",
        category: EmergencyCategory::Trauma,
        condition: EmergencyCondition::CoOccurrence(&[&[
            &["bleeding", "blood"],
            &["won't stop", "severe", "spurting"],
        ]]),
        message: "SEVERE BLEEDING: Apply firm pressure. Elevate if possible. Call 911 immediately.",
    },
    EmergencyRule {
        id: "TRAUMA-004",
        category: EmergencyCategory::Trauma,
        condition: EmergencyCondition::CoOccurrence(&[&[
            &["fall", "impact", "trauma"],
            &["unable to bear weight", "can't walk", "cannot walk"],
        ]]),
        message: "TRAUMA: Inability to bear weight after injury suggests fracture or ligament tear. Seek immediate care.",
    },
    EmergencyRule {
        id: "ABD-001",
        category: EmergencyCategory::Abdominal,
        condition: EmergencyCondition::CoOccurrence(&[&[&["abdomen"], &["rigid"], &["severe"]]]),
        message: "ABDOMINAL EMERGENCY: Rigid abdomen suggests peritonitis. Call 911 immediately.",
    },
    EmergencyRule {
        id: "ABD-002",
        category: EmergencyCategory::Abdominal,
        condition: EmergencyCondition::CoOccurrence(&[&[
            &["pregnant", "missed period"],
            &["abdomen"],
            &["severe pain"],
        ]]),
        message: "ECTOPIC PREGNANCY RISK: Severe abdominal pain during pregnancy requires immediate care. Call 911.",
    },
    EmergencyRule {
        id: "CRISIS-001",
        category: EmergencyCategory::MentalHealth,
        condition: EmergencyCondition::Crisis,
        message: "CRISIS SUPPORT: Please reach out now:\n- National Suicide Prevention: 988\n- Crisis Text Line: Text HOME to 741741\n- You are not alone. These feelings can get better with support.",
    },
    EmergencyRule {
        id: "METAB-001",
        category: EmergencyCategory::Metabolic,
        condition: EmergencyCondition::CoOccurrence(&[&[
            &["diabetic", "diabetes"],
            &["confused", "unconscious", "fruity breath"],
        ]]),
        message: "DIABETIC EMERGENCY: Possible diabetic crisis. If unconscious, call 911. If conscious, check blood sugar.",
    },
    EmergencyRule {
        id: "METAB-002",
        category: EmergencyCategory::Metabolic,
        condition: EmergencyCondition::CoOccurrence(&[
            &[&["overdose", "poisoning"]],
            &[&["pills"], &["too many"]],
        ]),
        message: "OVERDOSE/POISONING: Call Poison Control (1-800-222-1222) or 911 immediately.",
    },
];

// ── Matching logic ──────────────────────────────────────────

impl EmergencyCondition {
    fn matches(&self, text_lower: &str) -> bool {
        match self {
            Self::CoOccurrence(clauses) => clauses.iter().any(|clause| {
                clause
                    .iter()
                    .all(|group| group.iter().any(|kw| text_lower.contains(kw)))
            }),
            Self::Crisis => CRISIS_PATTERN.is_match(text_lower),
        }
    }
}

/// Run every rule against free text, in registry order.
pub fn scan_text(text: &str) -> Vec<EmergencyAlert> {
    let text_lower = text.to_lowercase();

    RULES
        .iter()
        .filter(|rule| rule.condition.matches(&text_lower))
        .map(|rule| {
            tracing::warn!(
                rule_id = rule.id,
                category = ?rule.category,
                "Emergency rule fired"
            );
            EmergencyAlert {
                rule_id: rule.id,
                category: rule.category,
                message: rule.message,
            }
        })
        .collect()
}

/// Alert strings for a symptom report (locations, pain type, notes, triggers).
pub fn scan_red_flags(symptoms: &UserSymptomData) -> Vec<String> {
    scan_text(&symptoms.scan_text())
        .into_iter()
        .map(|alert| alert.message.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fired(text: &str) -> Vec<&'static str> {
        scan_text(text).into_iter().map(|a| a.rule_id).collect()
    }

    #[test]
    fn crushing_chest_pain_with_sweating_is_cardiac() {
        let symptoms = UserSymptomData::with_location(&["chest"])
            .pain_type("crushing")
            .notes("sweating, left arm pain");
        let alerts = scan_red_flags(&symptoms);
        assert!(alerts[0].starts_with("CARDIAC EMERGENCY: Potential heart attack"));
    }

    #[test]
    fn chest_alone_does_not_fire() {
        assert!(fired("chest tightness when running").is_empty());
    }

    #[test]
    fn atypical_mi_needs_all_three_groups() {
        assert_eq!(fired("jaw pain with nausea"), vec!["CARD-002"]);
        assert!(fired("jaw pain").is_empty());
    }

    #[test]
    fn aortic_dissection_needs_chest_and_back() {
        let ids = fired("tearing chest pain going to my back");
        assert!(ids.contains(&"CARD-003"));
        assert!(!ids.contains(&"CARD-001"));
    }

    #[test]
    fn stroke_fires_on_any_fast_sign() {
        assert_eq!(fired("face drooping on one side"), vec!["NEURO-001"]);
        assert_eq!(fired("speech is slurred"), vec!["NEURO-001"]);
        assert!(fired("my arm is weak").contains(&"NEURO-001"));
    }

    #[test]
    fn meningitis_and_thunderclap() {
        assert!(fired("head pain and stiff neck").contains(&"NEURO-002"));
        assert!(fired("worst headache of my life").contains(&"NEURO-003"));
    }

    #[test]
    fn respiratory_rules() {
        assert!(fired("i can't catch my breath").contains(&"RESP-001"));
        assert!(fired("he is choking").contains(&"RESP-002"));
        assert!(fired("asthma attack, inhaler not responding").contains(&"RESP-003"));
    }

    #[test]
    fn allergic_throat_swelling_fires_both_rules() {
        let ids = fired("allergic reaction, throat swelling");
        assert_eq!(ids, vec!["ALLERGY-001", "ALLERGY-002"]);
    }

    #[test]
    fn trauma_rules() {
        assert!(fired("bone sticking out of shin").contains(&"TRAUMA-001"));
        assert!(fired("head injury and now confused").contains(&"TRAUMA-002"));
        assert!(fired("bleeding won't stop").contains(&"TRAUMA-003"));
        assert!(fired("after a fall i cannot walk").contains(&"TRAUMA-004"));
    }

    #[test]
    fn abdominal_rules() {
        assert!(fired("abdomen is rigid and severe").contains(&"ABD-001"));
        assert!(fired("missed period, abdomen severe pain").contains(&"ABD-002"));
    }

    #[test]
    fn crisis_language_routes_to_support_lines() {
        let alerts = scan_text("I feel like I want to die");
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category, EmergencyCategory::MentalHealth);
        assert!(alerts[0].message.contains("988"));
        assert!(fired("thoughts of SELF-HARM").contains(&"CRISIS-001"));
    }

    #[test]
    fn metabolic_rules() {
        assert!(fired("diabetic and confused").contains(&"METAB-001"));
        assert!(fired("took too many pills").contains(&"METAB-002"));
        assert!(fired("possible poisoning").contains(&"METAB-002"));
    }

    #[test]
    fn scan_is_case_insensitive() {
        assert_eq!(fired("SEIZURE"), vec!["NEURO-004"]);
    }

    #[test]
    fn benign_text_yields_nothing() {
        assert!(fired("mild itchy rash on forearm").is_empty());
        assert!(scan_red_flags(&UserSymptomData::default()).is_empty());
    }
}
