//! Niche-to-destination routing.
//!
//! Routing is table-driven off the analysis, not the feed: a feed tagged
//! "general" can still surface a sports story, and the detected niche is
//! what decides where it lands. The destination tables pre-exist and their
//! shapes are contracts; this table only says which one each story belongs
//! in.

use tracing::debug;

use crate::types::analysis::AnalysisResult;
use crate::types::route::RouteTarget;

/// Plain niche rows. Energy is conditional (nuclear stories have their own
/// table) and handled in code, not a row.
const ROUTES: &[(&str, fn() -> RouteTarget)] = &[
    ("politics", election_news),
    ("sports", sports_news),
    ("motoring", motoring),
    ("brics", brics_news),
];

fn election_news() -> RouteTarget {
    RouteTarget::upsert("gov_intelligence", "election_news", "url")
}

fn sports_news() -> RouteTarget {
    RouteTarget::upsert("sports_intelligence", "news", "url")
}

fn motoring() -> RouteTarget {
    RouteTarget::upsert("ai_intelligence", "motoring", "url")
}

fn brics_news() -> RouteTarget {
    RouteTarget::upsert("ai_intelligence", "brics_news_events", "url")
}

fn energy(analysis: &AnalysisResult) -> RouteTarget {
    let nuclear = analysis
        .niche_data
        .get("energy_type")
        .and_then(|v| v.as_str())
        .map_or(false, |t| t.to_lowercase().contains("nuclear"));
    if nuclear {
        RouteTarget::upsert("ai_intelligence", "nuclear_energy", "url")
    } else {
        RouteTarget::upsert("ai_intelligence", "energy", "url")
    }
}

fn default_entries() -> RouteTarget {
    RouteTarget::probed("ai_intelligence", "entries", "canonical_url")
}

/// Decides the destination collection for each analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentRouter;

impl ContentRouter {
    /// Create a router.
    pub fn new() -> Self {
        Self
    }

    /// Resolve the destination for one analysis. Always resolves; crime,
    /// business and anything unrecognized land in the general entries feed.
    pub fn route(&self, analysis: &AnalysisResult) -> RouteTarget {
        let niche = analysis.niche_tag();

        if niche == "energy" {
            let target = energy(analysis);
            debug!(%target, "routed energy story");
            return target;
        }

        for (row_niche, make) in ROUTES {
            if *row_niche == niche {
                let target = make();
                debug!(%target, niche, "routed via niche table");
                return target;
            }
        }

        default_entries()
    }
}
