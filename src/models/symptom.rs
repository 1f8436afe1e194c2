use serde::{Deserialize, Deserializer, Serialize};

/// Read-only constitution profile supplied by the profiling collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoshaProfile {
    /// Free-text constitution, e.g. "vata-pitta".
    pub prakriti: String,
}

/// Demographics and history the caller may attach to a consultation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Accepts either `"60"` or `60` on the wire.
    #[serde(default, deserialize_with = "string_or_number")]
    pub age: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub medications: Option<String>,
    #[serde(default)]
    pub smoking: Option<String>,
    #[serde(default)]
    pub pregnant: Option<bool>,
    #[serde(default)]
    pub recent_surgery: Option<bool>,
    #[serde(default)]
    pub family_history: Vec<String>,
    #[serde(default)]
    pub cancer_treatment_recent: Option<bool>,
    #[serde(default)]
    pub hormonal_therapy: Option<bool>,
    /// Troponin as a multiple of the upper reference limit, when a lab value exists.
    #[serde(default)]
    pub troponin_level: Option<f64>,
    #[serde(default, alias = "ayurvedicProfile")]
    pub dosha_profile: Option<DoshaProfile>,
}

/// Everything the user has reported so far.
///
/// The caller accumulates this across conversational turns and re-submits the
/// whole value on every call; the engine keeps no session state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSymptomData {
    #[serde(default)]
    pub location: Vec<String>,
    #[serde(default)]
    pub pain_type: Option<String>,
    /// 0-10 self-reported intensity.
    #[serde(default)]
    pub intensity: Option<u8>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub triggers: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub additional_notes: Option<String>,
    /// Symptoms the user explicitly denied.
    #[serde(default)]
    pub excluded_symptoms: Vec<String>,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
}

impl UserSymptomData {
    pub fn with_location(locations: &[&str]) -> Self {
        Self {
            location: locations.iter().map(|l| l.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn notes(mut self, notes: &str) -> Self {
        self.additional_notes = Some(notes.to_string());
        self
    }

    pub fn pain_type(mut self, pain_type: &str) -> Self {
        self.pain_type = Some(pain_type.to_string());
        self
    }

    pub fn duration(mut self, duration: &str) -> Self {
        self.duration = Some(duration.to_string());
        self
    }

    pub fn triggers(mut self, triggers: &str) -> Self {
        self.triggers = Some(triggers.to_string());
        self
    }

    pub fn excluding(mut self, symptom: &str) -> Self {
        self.excluded_symptoms.push(symptom.to_string());
        self
    }

    pub fn profile(mut self, profile: UserProfile) -> Self {
        self.user_profile = Some(profile);
        self
    }

    /// Reported locations joined by spaces, lowercased.
    pub fn location_text(&self) -> String {
        self.location.join(" ").to_lowercase()
    }

    /// Text the emergency scanner reads: locations, pain type, notes, triggers.
    pub fn scan_text(&self) -> String {
        join_lower(&[
            Some(self.location.join(" ").as_str()),
            self.pain_type.as_deref(),
            self.additional_notes.as_deref(),
            self.triggers.as_deref(),
        ])
    }

    /// Text mandatory symptoms are checked against (raw, negations included).
    pub fn mandatory_text(&self) -> String {
        join_lower(&[
            Some(self.location.join(" ").as_str()),
            self.pain_type.as_deref(),
            self.triggers.as_deref(),
            self.additional_notes.as_deref(),
        ])
    }

    /// Fields evidence is matched against, one entry per field so negation
    /// can be scoped to the field it was written in.
    pub fn evidence_fields(&self) -> Vec<String> {
        [
            Some(self.location.join(" ").as_str()),
            self.pain_type.as_deref(),
            self.triggers.as_deref(),
            self.frequency.as_deref(),
            self.additional_notes.as_deref(),
        ]
        .iter()
        .map(|p| p.unwrap_or("").to_lowercase())
        .collect()
    }

    /// Every value the user has supplied, used to avoid re-asking known facts.
    pub fn known_text(&self) -> String {
        let intensity = self.intensity.map(|i| i.to_string());
        let location = self.location.join(" ");
        let mut parts: Vec<&str> = vec![&location];
        for field in [
            &self.pain_type,
            &self.duration,
            &self.triggers,
            &self.frequency,
            &self.additional_notes,
            &intensity,
        ] {
            if let Some(value) = field {
                parts.push(value);
            }
        }
        let excluded = self.excluded_symptoms.join(" ");
        parts.push(&excluded);
        let mut text = parts.join(" ");
        if let Some(profile) = &self.user_profile {
            text.push(' ');
            text.push_str(&profile.conditions.join(" "));
            text.push(' ');
            text.push_str(&profile.family_history.join(" "));
            if let Some(meds) = &profile.medications {
                text.push(' ');
                text.push_str(meds);
            }
        }
        text.to_lowercase()
    }
}

fn join_lower(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .map(|p| p.unwrap_or(""))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
