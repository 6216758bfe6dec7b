//! Idempotent persistence of routed stories.
//!
//! The main row follows the target's conflict strategy: a native unique
//! constraint gets one atomic upsert, everything else gets probe-then-write.
//! Probe-then-write is not atomic; it is safe here because a run processes
//! each URL exactly once and runs do not overlap.
//!
//! Sub-entities (incidents, people, organizations) go to their own
//! intelligence schemas and are best-effort: their failures are logged, not
//! propagated, so a flaky secondary table cannot lose the story itself.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::route::adapt::{
    adapt_incident, adapt_organization, adapt_person, adapt_row, adapt_syndicate, StoryRecord,
};
use crate::route::router::ContentRouter;
use crate::traits::store::Datastore;
use crate::types::route::{ConflictKey, RouteTarget};

/// What one persistence call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// New row written
    Inserted,
    /// Existing row refreshed
    Updated,
    /// Native upsert; the backend resolved insert-vs-update
    Upserted,
}

/// Outcome of persisting one story.
#[derive(Debug, Clone)]
pub struct PersistReport {
    /// Where the main row went
    pub target: RouteTarget,

    /// How the main row was written
    pub disposition: Disposition,
}

/// Routes a story and writes it exactly once.
pub struct DedupUpsertEngine {
    store: Arc<dyn Datastore>,
    router: ContentRouter,
}

impl DedupUpsertEngine {
    /// Create an engine over a datastore.
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self {
            store,
            router: ContentRouter::new(),
        }
    }

    /// Persist one story: main row, then sub-entities.
    pub async fn persist(&self, record: &StoryRecord) -> StoreResult<PersistReport> {
        let target = self.router.route(&record.analysis);
        let row = adapt_row(&target, record);

        let disposition = match &target.conflict {
            ConflictKey::Native(column) => {
                self.store
                    .upsert(target.schema, target.collection, column, &row)
                    .await?;
                Disposition::Upserted
            }
            ConflictKey::Probe(column) => {
                let existing = self
                    .store
                    .select_id_by_key(target.schema, target.collection, column, &record.item.url)
                    .await?;
                match existing {
                    Some(id) => {
                        debug!(%target, id, "existing row refreshed");
                        self.store
                            .update_by_id(target.schema, target.collection, &id, &row)
                            .await?;
                        Disposition::Updated
                    }
                    None => {
                        self.store
                            .insert(target.schema, target.collection, &row)
                            .await?;
                        Disposition::Inserted
                    }
                }
            }
        };

        self.persist_incidents(record).await;
        self.persist_people(record).await;
        self.persist_organizations(record).await;

        Ok(PersistReport {
            target,
            disposition,
        })
    }

    /// Incidents key on the story URL, so only the first incident of
    /// a multi-incident story survives. Lossy, and logged as such.
    async fn persist_incidents(&self, record: &StoryRecord) {
        let Some(first) = record.analysis.incidents.first() else {
            return;
        };
        if record.analysis.incidents.len() > 1 {
            warn!(
                url = %record.item.url,
                count = record.analysis.incidents.len(),
                "multiple incidents in one story, persisting only the first"
            );
        }

        let row = adapt_incident(record, first);
        if let Err(e) = self
            .store
            .upsert("crime_intelligence", "incidents", "source_url", &row)
            .await
        {
            warn!(url = %record.item.url, error = %e, "incident write failed");
        }
    }

    /// People become master identities; a repeat sighting only refreshes
    /// `last_seen_at`.
    async fn persist_people(&self, record: &StoryRecord) {
        for person in &record.analysis.people {
            if person.name.trim().is_empty() {
                continue;
            }
            let result = async {
                let existing = self
                    .store
                    .select_id_by_key(
                        "people_intelligence",
                        "master_identities",
                        "full_name",
                        &person.name,
                    )
                    .await?;
                match existing {
                    Some(id) => {
                        let touch = json!({
                            "last_seen_at": chrono::Utc::now().to_rfc3339(),
                        });
                        self.store
                            .update_by_id("people_intelligence", "master_identities", &id, &touch)
                            .await
                    }
                    None => {
                        self.store
                            .insert(
                                "people_intelligence",
                                "master_identities",
                                &adapt_person(person),
                            )
                            .await
                    }
                }
            }
            .await;

            if let Err(e) = result {
                warn!(name = %person.name, error = %e, "person write failed");
            }
        }
    }

    /// Syndicates and gangs have a dedicated crime table; everything else
    /// is a business organization.
    async fn persist_organizations(&self, record: &StoryRecord) {
        for org in &record.analysis.organizations {
            if org.name.trim().is_empty() {
                continue;
            }
            let kind = org.kind.to_lowercase();
            let result = if kind.contains("syndicate") || kind.contains("gang") {
                self.insert_if_absent(
                    "crime_intelligence",
                    "syndicates",
                    "name",
                    &org.name,
                    &adapt_syndicate(org),
                )
                .await
            } else {
                self.insert_if_absent(
                    "business_intelligence",
                    "organizations",
                    "registered_name",
                    &org.name,
                    &adapt_organization(org),
                )
                .await
            };

            if let Err(e) = result {
                warn!(name = %org.name, error = %e, "organization write failed");
            }
        }
    }

    async fn insert_if_absent(
        &self,
        schema: &str,
        collection: &str,
        key_column: &str,
        key_value: &str,
        row: &serde_json::Value,
    ) -> StoreResult<()> {
        match self
            .store
            .select_id_by_key(schema, collection, key_column, key_value)
            .await?
        {
            Some(_) => Ok(()),
            None => self.store.insert(schema, collection, row).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::types::analysis::{AnalysisResult, Incident, Organization, Person, Urgency};
    use crate::types::item::ContentItem;

    fn record(niche: &str, category: &str) -> StoryRecord {
        StoryRecord {
            item: ContentItem::new("Title", "https://e.com/story").with_source("Example"),
            analysis: AnalysisResult {
                sentiment: Some(Urgency::Moderate),
                category: Some(category.to_string()),
                niche: Some(niche.to_string()),
                ..AnalysisResult::empty()
            },
            image_url: None,
            published_at: None,
        }
    }

    #[tokio::test]
    async fn test_default_route_probe_insert_then_update() {
        let store = Arc::new(MemoryStore::new());
        let engine = DedupUpsertEngine::new(store.clone());
        let rec = record("general", "weather");

        let report = engine.persist(&rec).await.unwrap();
        assert_eq!(report.disposition, Disposition::Inserted);
        assert_eq!(store.len("ai_intelligence", "entries"), 1);

        // Rerun: same URL, zero new rows.
        let report = engine.persist(&rec).await.unwrap();
        assert_eq!(report.disposition, Disposition::Updated);
        assert_eq!(store.len("ai_intelligence", "entries"), 1);
    }

    #[tokio::test]
    async fn test_native_route_upserts() {
        let store = Arc::new(MemoryStore::new());
        let engine = DedupUpsertEngine::new(store.clone());
        let rec = record("sports", "football");

        let report = engine.persist(&rec).await.unwrap();
        assert_eq!(report.disposition, Disposition::Upserted);
        engine.persist(&rec).await.unwrap();
        assert_eq!(store.len("sports_intelligence", "news"), 1);
    }

    #[tokio::test]
    async fn test_only_first_incident_persisted() {
        let store = Arc::new(MemoryStore::new());
        let engine = DedupUpsertEngine::new(store.clone());

        let mut rec = record("crime", "robbery");
        rec.analysis.incidents = vec![
            Incident {
                kind: "robbery".to_string(),
                description: "first".to_string(),
                location: None,
                occurred_at: None,
                severity: 2,
            },
            Incident {
                kind: "assault".to_string(),
                description: "second".to_string(),
                location: None,
                occurred_at: None,
                severity: 3,
            },
        ];

        engine.persist(&rec).await.unwrap();
        let incidents = store.rows("crime_intelligence", "incidents");
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0]["description"], "first");
        assert_eq!(incidents[0]["type"], "robbery");
    }

    #[tokio::test]
    async fn test_people_become_master_identities() {
        let store = Arc::new(MemoryStore::new());
        let engine = DedupUpsertEngine::new(store.clone());

        let mut rec = record("crime", "robbery");
        rec.analysis.people = vec![Person {
            name: "John Doe".to_string(),
            role: "suspect".to_string(),
            status: Some("sought".to_string()),
            details: None,
        }];
        engine.persist(&rec).await.unwrap();
        engine.persist(&rec).await.unwrap();

        let people = store.rows("people_intelligence", "master_identities");
        assert_eq!(people.len(), 1);
        assert_eq!(people[0]["full_name"], "John Doe");
        assert_eq!(people[0]["type"], "suspect");
    }

    #[tokio::test]
    async fn test_syndicates_split_from_organizations() {
        let store = Arc::new(MemoryStore::new());
        let engine = DedupUpsertEngine::new(store.clone());

        let mut rec = record("crime", "smuggling");
        rec.analysis.organizations = vec![
            Organization {
                name: "Harbor Cartel".to_string(),
                kind: "Syndicate".to_string(),
                details: None,
            },
            Organization {
                name: "City Council".to_string(),
                kind: "government".to_string(),
                details: None,
            },
        ];

        engine.persist(&rec).await.unwrap();
        assert_eq!(store.len("crime_intelligence", "syndicates"), 1);
        let orgs = store.rows("business_intelligence", "organizations");
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0]["registered_name"], "City Council");
    }

    #[tokio::test]
    async fn test_crime_story_lands_in_entries_and_incidents() {
        let store = Arc::new(MemoryStore::new());
        let engine = DedupUpsertEngine::new(store.clone());

        let mut rec = record("crime", "robbery");
        rec.analysis.incidents = vec![Incident {
            kind: "robbery".to_string(),
            description: "Armed robbery.".to_string(),
            location: None,
            occurred_at: None,
            severity: 2,
        }];

        engine.persist(&rec).await.unwrap();
        assert_eq!(store.len("ai_intelligence", "entries"), 1);
        assert_eq!(store.len("crime_intelligence", "incidents"), 1);
    }
}
