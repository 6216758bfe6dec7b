//! Per-collection payload adaptation.
//!
//! Destination collections share most of their shape but disagree on
//! details: the key column name, whether the summary column is `summary`
//! or `ai_summary`, whether loose fields live in `data`, `metadata` or
//! `snippet_sources`. One base row plus a small per-collection rewrite
//! keeps those quirks in one file. The column sets are pre-existing table
//! contracts; a field a table has no column for is dropped, never an error.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::types::analysis::{AnalysisResult, Incident, Organization, Person};
use crate::types::item::ContentItem;
use crate::types::route::RouteTarget;

/// Categories the BRICS table's check constraint accepts.
const BRICS_CATEGORIES: &[&str] = &[
    "diplomacy",
    "summit",
    "economy",
    "trade",
    "energy",
    "defense",
    "sanctions",
    "technology",
    "health",
    "education",
    "infrastructure",
    "governance",
    "other",
];

/// Everything persistence needs for one story.
#[derive(Debug, Clone)]
pub struct StoryRecord {
    /// The seed item
    pub item: ContentItem,

    /// The extracted analysis
    pub analysis: AnalysisResult,

    /// Resolved lead image, if any
    pub image_url: Option<String>,

    /// Best-known publish time
    pub published_at: Option<DateTime<Utc>>,
}

/// Build the main-row payload for a destination.
pub fn adapt_row(target: &RouteTarget, record: &StoryRecord) -> Value {
    let analysis = &record.analysis;
    let mut row = Map::new();

    row.insert(
        target.conflict.column().to_string(),
        json!(record.item.url),
    );
    row.insert("title".to_string(), json!(record.item.title));
    row.insert("source".to_string(), json!(record.item.source));
    row.insert(
        "published_at".to_string(),
        json!(record.published_at.map(|dt| dt.to_rfc3339())),
    );
    row.insert("category".to_string(), json!(analysis.category));
    row.insert("summary".to_string(), json!(analysis.summary));
    row.insert(
        "sentiment_label".to_string(),
        json!(analysis.sentiment.map(|s| s.label())),
    );
    if let Some(image_url) = &record.image_url {
        row.insert("image_url".to_string(), json!(image_url));
    }

    match target.collection {
        // Entries uses `published`, and mirrors loose fields into `data`.
        "entries" => {
            if let Some(published) = row.remove("published_at") {
                row.insert("published".to_string(), published);
            }
            let mut data = Map::new();
            if !analysis.niche_data.is_empty() {
                data.insert("niche_data".to_string(), json!(analysis.niche_data));
            }
            if let Some(image_url) = &record.image_url {
                data.insert("image_url".to_string(), json!(image_url));
            }
            if !data.is_empty() {
                row.insert("data".to_string(), Value::Object(data));
            }
        }
        // Election rows have no category column.
        "election_news" => {
            row.remove("category");
        }
        // Legacy naming plus a category check constraint in the BRICS table.
        "brics_news_events" => {
            if let Some(summary) = row.remove("summary") {
                row.insert("ai_summary".to_string(), summary);
            }
            row.insert("location_text".to_string(), json!(analysis.location));
            if !analysis.entities.is_empty() {
                row.insert("entities".to_string(), json!(analysis.entities));
            }
            if !analysis.niche_data.is_empty() {
                row.insert("metadata".to_string(), json!(analysis.niche_data));
                if let Some(topic) = analysis.niche_data.get("topic") {
                    row.insert("topic".to_string(), topic.clone());
                }
            }
            row.insert(
                "category".to_string(),
                json!(brics_category(analysis.category.as_deref())),
            );
        }
        // The niche tables keep their loose fields in `snippet_sources`.
        "motoring" | "energy" | "nuclear_energy" => {
            if !analysis.niche_data.is_empty() {
                row.insert("snippet_sources".to_string(), json!(analysis.niche_data));
            }
        }
        _ => {}
    }

    Value::Object(row)
}

/// Clamp a free-text category to the BRICS enum, falling back to "other".
fn brics_category(category: Option<&str>) -> String {
    match category {
        Some(c) => {
            let lowered = c.to_lowercase();
            if BRICS_CATEGORIES.contains(&lowered.as_str()) {
                lowered
            } else {
                "other".to_string()
            }
        }
        None => "other".to_string(),
    }
}

/// Incident row for `crime_intelligence.incidents`, keyed on the story URL.
pub fn adapt_incident(record: &StoryRecord, incident: &Incident) -> Value {
    let published = record.published_at.map(|dt| dt.to_rfc3339());
    json!({
        "source_url": record.item.url,
        "title": record.item.title,
        "description": incident.description,
        "type": incident.kind,
        "severity_level": incident.severity,
        "occurred_at": incident.occurred_at.clone().or_else(|| published.clone()),
        "location": incident.location.clone().or_else(|| record.analysis.location.clone()),
        "published_at": published,
        "image_url": record.image_url,
        "status": "reported",
    })
}

/// Master-identity row for `people_intelligence.master_identities`.
pub fn adapt_person(person: &Person) -> Value {
    json!({
        "full_name": person.name,
        "type": person.role,
        "contact_verified": false,
        "data_sources_count": 1,
        "last_seen_at": Utc::now().to_rfc3339(),
    })
}

/// Organization row for `business_intelligence.organizations`.
pub fn adapt_organization(org: &Organization) -> Value {
    json!({
        "registered_name": org.name,
        "type": org.kind,
        "details": org.details,
    })
}

/// Syndicate row for `crime_intelligence.syndicates`.
pub fn adapt_syndicate(org: &Organization) -> Value {
    json!({
        "name": org.name,
        "type": org.kind,
        "metadata": {"details": org.details},
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::analysis::Urgency;
    use crate::types::route::RouteTarget;

    fn record() -> StoryRecord {
        let analysis = AnalysisResult {
            sentiment: Some(Urgency::Moderate),
            category: Some("budget".to_string()),
            niche: Some("politics".to_string()),
            summary: Some("The mayor presented a draft budget.".to_string()),
            location: Some("Springfield".to_string()),
            ..AnalysisResult::empty()
        };
        StoryRecord {
            item: ContentItem::new("Mayor unveils budget", "https://e.com/budget")
                .with_source("Example News"),
            analysis,
            image_url: Some("https://cdn.e.com/a.jpg".to_string()),
            published_at: None,
        }
    }

    #[test]
    fn test_entries_row_dialect() {
        let target = RouteTarget::probed("ai_intelligence", "entries", "canonical_url");
        let row = adapt_row(&target, &record());
        assert_eq!(row["canonical_url"], "https://e.com/budget");
        assert_eq!(row["sentiment_label"], "Moderate Urgency");
        assert_eq!(row["category"], "budget");
        // Entries stores `published`, never `published_at`.
        assert!(row.get("published_at").is_none());
        assert!(row.as_object().unwrap().contains_key("published"));
        // Image is both a column and mirrored into the data blob.
        assert_eq!(row["image_url"], "https://cdn.e.com/a.jpg");
        assert_eq!(row["data"]["image_url"], "https://cdn.e.com/a.jpg");
    }

    #[test]
    fn test_entries_nests_niche_data() {
        let mut rec = record();
        rec.analysis
            .niche_data
            .insert("policy_area".to_string(), json!("transit"));
        let target = RouteTarget::probed("ai_intelligence", "entries", "canonical_url");
        let row = adapt_row(&target, &rec);
        assert_eq!(row["data"]["niche_data"]["policy_area"], "transit");
    }

    #[test]
    fn test_election_row_drops_category() {
        let target = RouteTarget::upsert("gov_intelligence", "election_news", "url");
        let row = adapt_row(&target, &record());
        assert_eq!(row["url"], "https://e.com/budget");
        assert!(row.get("category").is_none());
        assert_eq!(row["sentiment_label"], "Moderate Urgency");
    }

    #[test]
    fn test_brics_row_renames_and_clamps() {
        let mut rec = record();
        rec.analysis.entities.push(crate::types::analysis::Entity {
            name: "Development Bank".to_string(),
            kind: "organization".to_string(),
        });
        let target = RouteTarget::upsert("ai_intelligence", "brics_news_events", "url");
        let row = adapt_row(&target, &rec);
        assert_eq!(row["ai_summary"], "The mayor presented a draft budget.");
        assert!(row.get("summary").is_none());
        assert_eq!(row["location_text"], "Springfield");
        assert_eq!(row["entities"][0]["name"], "Development Bank");
        // "budget" is not in the table's category enum.
        assert_eq!(row["category"], "other");
    }

    #[test]
    fn test_brics_valid_category_lowercased() {
        let mut rec = record();
        rec.analysis.category = Some("Trade".to_string());
        let target = RouteTarget::upsert("ai_intelligence", "brics_news_events", "url");
        let row = adapt_row(&target, &rec);
        assert_eq!(row["category"], "trade");
    }

    #[test]
    fn test_niche_tables_use_snippet_sources() {
        let mut rec = record();
        rec.analysis
            .niche_data
            .insert("vehicle_types".to_string(), json!(["bakkie"]));
        let target = RouteTarget::upsert("ai_intelligence", "motoring", "url");
        let row = adapt_row(&target, &rec);
        assert_eq!(row["snippet_sources"]["vehicle_types"][0], "bakkie");
        assert!(row.get("data").is_none());
    }

    #[test]
    fn test_incident_row_contract() {
        let rec = record();
        let incident = Incident {
            kind: "robbery".to_string(),
            description: "Armed robbery at a mall.".to_string(),
            location: None,
            occurred_at: None,
            severity: 2,
        };
        let row = adapt_incident(&rec, &incident);
        assert_eq!(row["source_url"], "https://e.com/budget");
        assert_eq!(row["type"], "robbery");
        assert_eq!(row["severity_level"], 2);
        assert_eq!(row["status"], "reported");
        // Location falls back to the analysis-level location.
        assert_eq!(row["location"], "Springfield");
    }

    #[test]
    fn test_person_row_contract() {
        let person = Person {
            name: "Jane Mayor".to_string(),
            role: "Official".to_string(),
            status: None,
            details: None,
        };
        let row = adapt_person(&person);
        assert_eq!(row["full_name"], "Jane Mayor");
        assert_eq!(row["type"], "Official");
        assert_eq!(row["contact_verified"], false);
    }

    #[test]
    fn test_organization_and_syndicate_rows() {
        let org = Organization {
            name: "Harbor Cartel".to_string(),
            kind: "Syndicate".to_string(),
            details: Some("smuggling".to_string()),
        };
        let row = adapt_organization(&org);
        assert_eq!(row["registered_name"], "Harbor Cartel");

        let row = adapt_syndicate(&org);
        assert_eq!(row["name"], "Harbor Cartel");
        assert_eq!(row["metadata"]["details"], "smuggling");
    }
}
