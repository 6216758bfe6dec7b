//! The per-item processing loop.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::acquire::{AcquisitionChain, ImageFinder};
use crate::extract::{ExtractionOrchestrator, ExtractionOutcome};
use crate::route::adapt::StoryRecord;
use crate::store::upsert::DedupUpsertEngine;
use crate::traits::notifier::Alerter;
use crate::types::analysis::Urgency;
use crate::types::item::{parse_loose_date, ContentItem};

/// Counts for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Items taken off the feed(s)
    pub processed: usize,

    /// Stories persisted
    pub stored: usize,

    /// Items a model deliberately declared empty
    pub no_signal: usize,

    /// Items with content but no surviving extraction
    pub extraction_failed: usize,

    /// Items every acquisition step came up empty for. A normal skip,
    /// not a failure.
    pub no_content: usize,

    /// Items that failed at persistence
    pub failed: usize,

    /// Duplicate URLs dropped before processing
    pub duplicates: usize,
}

/// The full intelligence pipeline: acquire, extract, route, persist, alert.
///
/// One item failing never stops the run; every terminal state is a counter
/// in the report.
pub struct Pipeline {
    chain: AcquisitionChain,
    orchestrator: ExtractionOrchestrator,
    engine: DedupUpsertEngine,
    images: ImageFinder,
    alerter: Option<Arc<dyn Alerter>>,
}

impl Pipeline {
    /// Assemble a pipeline from its stages.
    pub fn new(
        chain: AcquisitionChain,
        orchestrator: ExtractionOrchestrator,
        engine: DedupUpsertEngine,
    ) -> Self {
        Self {
            chain,
            orchestrator,
            engine,
            images: ImageFinder::new(),
            alerter: None,
        }
    }

    /// Enable image resolution via search.
    pub fn with_image_finder(mut self, images: ImageFinder) -> Self {
        self.images = images;
        self
    }

    /// Enable high-urgency alerts.
    pub fn with_alerter(mut self, alerter: Arc<dyn Alerter>) -> Self {
        self.alerter = Some(alerter);
        self
    }

    /// Process a batch of items. URLs repeated within the batch are
    /// processed once.
    pub async fn run(&self, items: &[ContentItem]) -> RunReport {
        let mut report = RunReport::default();
        let mut seen: HashSet<&str> = HashSet::new();

        for item in items {
            if !seen.insert(item.url.as_str()) {
                debug!(url = %item.url, "duplicate URL in batch, skipping");
                report.duplicates += 1;
                continue;
            }
            report.processed += 1;
            self.process_one(item, &mut report).await;
        }

        info!(
            processed = report.processed,
            stored = report.stored,
            no_signal = report.no_signal,
            extraction_failed = report.extraction_failed,
            no_content = report.no_content,
            failed = report.failed,
            duplicates = report.duplicates,
            "pipeline run complete"
        );
        report
    }

    async fn process_one(&self, item: &ContentItem, report: &mut RunReport) {
        let Some(content) = self.chain.acquire(item).await else {
            debug!(url = %item.url, "no content from any source, skipping");
            report.no_content += 1;
            return;
        };
        debug!(url = %item.url, provenance = content.provenance.label(), "content acquired");

        let analysis = match self.orchestrator.extract(item, &content.text).await {
            Ok(ExtractionOutcome::Analyzed(analysis)) => analysis,
            Ok(ExtractionOutcome::NoSignal) | Ok(ExtractionOutcome::InputTooShort) => {
                report.no_signal += 1;
                return;
            }
            Err(e) => {
                warn!(url = %item.url, error = %e, "extraction failed on every provider");
                report.extraction_failed += 1;
                return;
            }
        };

        let image_url = self.images.resolve(item, &content).await;

        // Page metadata beats the feed's own date when both exist.
        let published_at = content
            .published
            .as_deref()
            .and_then(parse_loose_date)
            .or_else(|| item.published_at());

        let record = StoryRecord {
            item: item.clone(),
            analysis,
            image_url,
            published_at,
        };

        match self.engine.persist(&record).await {
            Ok(persisted) => {
                info!(url = %item.url, target = %persisted.target, "story stored");
                report.stored += 1;
                self.maybe_alert(&record).await;
            }
            Err(e) => {
                warn!(url = %item.url, error = %e, "persistence failed");
                report.failed += 1;
            }
        }
    }

    /// Alerts are best-effort; a webhook outage never fails the item.
    async fn maybe_alert(&self, record: &StoryRecord) {
        let Some(alerter) = &self.alerter else {
            return;
        };
        if record.analysis.sentiment != Some(Urgency::High) {
            return;
        }

        let title = format!("High urgency: {}", record.item.title);
        let summary = record
            .analysis
            .summary
            .clone()
            .unwrap_or_else(|| record.item.url.clone());
        let body = match &record.analysis.category {
            Some(category) => format!("[{category}] {summary}\n{}", record.item.url),
            None => format!("{summary}\n{}", record.item.url),
        };

        if let Err(e) = alerter.alert(&title, &body).await {
            warn!(url = %record.item.url, error = %e, "alert delivery failed");
        }
    }
}
