//! Analysis result types - the structured intelligence a model extracts.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Perceived urgency of a content item.
///
/// Serialized with the human-readable labels the destinations store, so
/// model output parses directly into this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Urgency {
    #[serde(rename = "High Urgency")]
    High,
    #[serde(rename = "Moderate Urgency")]
    Moderate,
    #[serde(rename = "Low Urgency")]
    Low,
}

impl Urgency {
    /// Destination label text.
    pub fn label(&self) -> &'static str {
        match self {
            Urgency::High => "High Urgency",
            Urgency::Moderate => "Moderate Urgency",
            Urgency::Low => "Low Urgency",
        }
    }

    /// Incident severity level derived from urgency (1..=3).
    pub fn severity(&self) -> u8 {
        match self {
            Urgency::High => 3,
            Urgency::Moderate => 2,
            Urgency::Low => 1,
        }
    }
}

/// A named entity mentioned in the content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// A reported incident (crime, disaster, protest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    /// Date the incident occurred, as the model reported it (loose format)
    #[serde(default, rename = "date")]
    pub occurred_at: Option<String>,
    /// Severity 1 (low) to 3 (critical)
    #[serde(default = "default_severity")]
    pub severity: u8,
}

fn default_severity() -> u8 {
    1
}

/// A person of interest (suspect, official, victim, missing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

/// An organization, company, or government body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub details: Option<String>,
}

/// Structured intelligence extracted from one content item.
///
/// Either fully populated from a successful model parse, or the empty
/// failure sentinel (`AnalysisResult::empty()`). Never partially built by
/// hand: the pipeline only routes results for which `is_empty()` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Perceived urgency; `None` only in the empty sentinel
    #[serde(default)]
    pub sentiment: Option<Urgency>,

    /// Free-text thematic category ("Crime", "Politics", ...)
    #[serde(default)]
    pub category: Option<String>,

    /// Controlled-vocabulary niche tag, lowercase; "general" when the model
    /// could not be more specific
    #[serde(default, rename = "detected_niche")]
    pub niche: Option<String>,

    /// One-paragraph summary
    #[serde(default)]
    pub summary: Option<String>,

    /// General location mentioned
    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub entities: Vec<Entity>,

    #[serde(default)]
    pub incidents: Vec<Incident>,

    #[serde(default)]
    pub people: Vec<Person>,

    #[serde(default)]
    pub organizations: Vec<Organization>,

    /// Niche-specific key-value payload (tickers, parties, vehicle specs...)
    #[serde(default)]
    pub niche_data: HashMap<String, Value>,
}

impl AnalysisResult {
    /// The empty failure sentinel returned when every provider/model failed
    /// or the input was under the minimum length threshold.
    pub fn empty() -> Self {
        Self {
            sentiment: None,
            category: None,
            niche: None,
            summary: None,
            location: None,
            entities: Vec::new(),
            incidents: Vec::new(),
            people: Vec::new(),
            organizations: Vec::new(),
            niche_data: HashMap::new(),
        }
    }

    /// Whether this is the failure sentinel. A real result always carries
    /// at least sentiment and category.
    pub fn is_empty(&self) -> bool {
        self.sentiment.is_none() || self.category.is_none()
    }

    /// Niche tag normalized to lowercase, defaulting to "general".
    pub fn niche_tag(&self) -> String {
        self.niche
            .as_deref()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "general".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_labels_round_trip() {
        let json = serde_json::to_string(&Urgency::High).unwrap();
        assert_eq!(json, "\"High Urgency\"");
        let back: Urgency = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Urgency::High);
    }

    #[test]
    fn test_empty_sentinel() {
        assert!(AnalysisResult::empty().is_empty());
    }

    #[test]
    fn test_parse_full_result() {
        let json = r#"{
            "sentiment": "Moderate Urgency",
            "category": "Politics",
            "detected_niche": "politics",
            "summary": "Budget announced.",
            "entities": [{"name": "City Council", "type": "GovernmentBody"}],
            "incidents": [],
            "people": [{"name": "Jane Mayor", "role": "Official"}],
            "organizations": [],
            "niche_data": {"municipality": "City X"}
        }"#;

        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert!(!result.is_empty());
        assert_eq!(result.sentiment, Some(Urgency::Moderate));
        assert_eq!(result.niche_tag(), "politics");
        assert_eq!(result.people.len(), 1);
    }

    #[test]
    fn test_missing_fields_default() {
        // Models occasionally omit optional lists entirely.
        let json = r#"{"sentiment": "Low Urgency", "category": "General"}"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert!(!result.is_empty());
        assert!(result.incidents.is_empty());
        assert_eq!(result.niche_tag(), "general");
    }

    #[test]
    fn test_results_compare_by_value() {
        let json = r#"{"sentiment": "Low Urgency", "category": "General",
                       "people": [{"name": "Jane Mayor", "role": "Official"}]}"#;
        let a: AnalysisResult = serde_json::from_str(json).unwrap();
        let b: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, AnalysisResult::empty());
    }

    #[test]
    fn test_unknown_sentiment_is_parse_error() {
        let json = r#"{"sentiment": "Panic", "category": "General"}"#;
        assert!(serde_json::from_str::<AnalysisResult>(json).is_err());
    }
}
