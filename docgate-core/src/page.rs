//! Paginated result type produced by the query chain's terminal step.

use serde::{Deserialize, Serialize};

use crate::error::DocGateResult;

/// One page of documents plus the full filtered count.
///
/// `total` always reflects how many documents matched the filter,
/// independent of any `limit`/`skip` applied to `docs`, so callers can
/// derive page counts from a single result.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// The documents on this page, in query order.
    pub docs: Vec<T>,
    /// Total number of documents matching the filter across all pages.
    pub total: u64,
}

impl<T> Page<T> {
    /// Creates a page from materialized documents and the matching count.
    pub fn new(docs: Vec<T>, total: u64) -> Self {
        Self { docs, total }
    }

    /// Number of pages needed to cover `total` at `per_page` items each.
    pub fn pages(&self, per_page: u64) -> u64 {
        if per_page == 0 {
            return 0;
        }
        self.total.div_ceil(per_page)
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self { docs: Vec::new(), total: 0 }
    }
}

impl Page<bson::Document> {
    /// Decodes a page of raw documents into typed entities.
    pub fn decode<E>(self) -> DocGateResult<Page<E>>
    where
        E: serde::de::DeserializeOwned,
    {
        let docs = self
            .docs
            .into_iter()
            .map(bson::de::deserialize_from_document)
            .collect::<Result<Vec<E>, _>>()?;

        Ok(Page { docs, total: self.total })
    }
}
