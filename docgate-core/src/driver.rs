//! Store driver abstraction consumed by the facade.
//!
//! [`StoreDriver`] is the required capability surface of the underlying
//! document store: primitive single-document operations, a cursor-producing
//! `find`, counting, aggregation passthrough, and index management. The
//! facade never talks to a store except through this trait, and it never
//! implements retries, pooling, or timeouts on top of it — a suspended
//! driver call completes or fails according to the driver's own policy.
//!
//! Implementations must be thread-safe; all operations are independent
//! requests and the store is responsible for its own concurrency control.

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::{error::DocGateResult, index::IndexOptions, query::FindSpec};

/// Options for single-document lookups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneOptions {
    /// Inclusion projection applied to the returned document.
    pub projection: Option<Document>,
}

/// Options for the atomic find-and-update operation.
///
/// The default requests the document *after* the update has been applied;
/// set `return_original` to receive the pre-update state instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOneAndUpdateOptions {
    /// Return the pre-update document instead of the post-update one.
    pub return_original: bool,
    /// Insert the document when no match exists.
    pub upsert: bool,
}

/// Options for in-place updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOptions {
    /// Insert the document when no match exists.
    pub upsert: bool,
}

/// Options for document removal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoveOptions {
    /// Remove at most one matching document instead of all matches.
    pub single: bool,
}

/// Lazily-consumed result set produced by `find` and `aggregate`.
#[async_trait]
pub trait DocumentCursor: Send {
    /// Drains the cursor into an ordered sequence of documents.
    async fn materialize(self: Box<Self>) -> DocGateResult<Vec<Document>>;
}

/// Required capability surface of a document store.
///
/// Every method is a suspension point. Operations take the collection name
/// explicitly; binding a name to a facade instance happens one layer up.
#[async_trait]
pub trait StoreDriver: Send + Sync + Debug {
    /// Ensures the named collection exists and is usable. Called once by
    /// the facade during initialization; must be idempotent.
    async fn ensure_collection(&self, collection: &str) -> DocGateResult<()>;

    /// Inserts one document, returning it as persisted (including any
    /// store-assigned fields) or `None` if the store reports no document.
    ///
    /// A primary-key uniqueness violation must surface as
    /// [`FacadeError::DuplicateKey`](crate::error::FacadeError::DuplicateKey)
    /// so the facade can normalize it.
    async fn insert_one(
        &self,
        document: Document,
        collection: &str,
    ) -> DocGateResult<Option<Document>>;

    /// Finds the first document matching `filter`, or `None`.
    async fn find_one(
        &self,
        filter: Document,
        options: FindOneOptions,
        collection: &str,
    ) -> DocGateResult<Option<Document>>;

    /// Atomically applies `update` to the first match and returns the
    /// resulting document per `options`.
    async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: FindOneAndUpdateOptions,
        collection: &str,
    ) -> DocGateResult<Option<Document>>;

    /// Applies `update` to the first document matching `filter`.
    async fn update_one(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
        collection: &str,
    ) -> DocGateResult<()>;

    /// Removes matching documents and returns how many were removed.
    async fn remove(
        &self,
        filter: Document,
        options: RemoveOptions,
        collection: &str,
    ) -> DocGateResult<u64>;

    /// Counts documents matching `filter`.
    async fn count(&self, filter: Document, collection: &str) -> DocGateResult<u64>;

    /// Builds a cursor over documents matching the accumulated query state.
    async fn find(
        &self,
        spec: FindSpec,
        collection: &str,
    ) -> DocGateResult<Box<dyn DocumentCursor>>;

    /// Passes a processing pipeline through to the store. `options` is an
    /// opaque driver-specific document forwarded unchanged.
    async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        options: Option<Document>,
        collection: &str,
    ) -> DocGateResult<Box<dyn DocumentCursor>>;

    /// Whether an index with the given name exists on the collection.
    async fn index_exists(&self, name: &str, collection: &str) -> DocGateResult<bool>;

    /// Creates an index from a field→direction key document and options.
    async fn create_index(
        &self,
        keys: Document,
        options: IndexOptions,
        collection: &str,
    ) -> DocGateResult<()>;
}
