//! Revisioned collection access
//!
//! Both sides of a reconciliation are read through [`ICollectionSource`]:
//! the local store (revision bumped on every write) and the query cache
//! (generation bumped on every fetch). A diff only needs recomputing when
//! one of the two revisions moved.

use std::sync::Arc;

use crate::domain::{Collection, EntityKind};

/// A collection together with the revision it was read at
#[derive(Debug, Clone)]
pub struct VersionedCollection {
    pub revision: u64,
    pub collection: Arc<Collection>,
}

impl VersionedCollection {
    pub fn new(revision: u64, collection: Collection) -> Self {
        Self {
            revision,
            collection: Arc::new(collection),
        }
    }
}

#[async_trait::async_trait]
pub trait ICollectionSource: Send + Sync {
    /// Reads one entity kind along with its current revision
    async fn snapshot(&self, kind: EntityKind) -> anyhow::Result<VersionedCollection>;
}
