//! Routing target types.

use std::fmt;

/// How a destination collection enforces idempotency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKey {
    /// The collection has a unique constraint on this column; a single
    /// atomic upsert resolves duplicates.
    Native(&'static str),

    /// No reliable unique constraint: the engine probes for an existing row
    /// by this column, then updates by internal id or inserts. Not atomic;
    /// safe only under the pipeline's single-writer-per-item assumption.
    Probe(&'static str),
}

impl ConflictKey {
    /// The column the idempotency key is matched against.
    pub fn column(&self) -> &'static str {
        match self {
            ConflictKey::Native(col) | ConflictKey::Probe(col) => col,
        }
    }
}

/// A resolved destination for one analysis result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    /// Destination schema namespace (e.g. "ai_intelligence")
    pub schema: &'static str,

    /// Destination collection (table) name
    pub collection: &'static str,

    /// How duplicates are resolved in this collection
    pub conflict: ConflictKey,
}

impl RouteTarget {
    /// Target with a native unique-column upsert.
    pub fn upsert(schema: &'static str, collection: &'static str, column: &'static str) -> Self {
        Self {
            schema,
            collection,
            conflict: ConflictKey::Native(column),
        }
    }

    /// Target requiring the probe-then-write dedup path.
    pub fn probed(schema: &'static str, collection: &'static str, column: &'static str) -> Self {
        Self {
            schema,
            collection,
            conflict: ConflictKey::Probe(column),
        }
    }
}

impl fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.collection)
    }
}
