//! In-memory implementation of the store driver.
//!
//! Documents live in per-collection vectors behind async-aware read-write
//! locks, in insertion order. Filters are top-level equality matches,
//! projections are inclusion-only, and a named index registry backs the
//! facade's reconciliation pass. Intended for tests and development.

use async_trait::async_trait;
use bson::{Bson, Document};
use mea::rwlock::RwLock;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use docgate_core::{
    driver::{
        DocumentCursor, FindOneAndUpdateOptions, FindOneOptions, RemoveOptions, StoreDriver,
        UpdateOptions,
    },
    error::{DocGateResult, FacadeError},
    index::IndexOptions,
    query::FindSpec,
};

use crate::matcher::{compare, matches, project};

type CollectionVec = Vec<Document>;
type StoreMap = HashMap<String, CollectionVec>;
type IndexMap = HashMap<String, HashSet<String>>;

/// Thread-safe in-memory document store.
///
/// Cloning shares the underlying state, so a driver handed to a facade can
/// still be inspected by a test afterwards.
#[derive(Default, Clone, Debug)]
pub struct MemoryDriver {
    /// collection name -> documents in insertion order
    store: Arc<RwLock<StoreMap>>,
    /// collection name -> names of created indexes
    indexes: Arc<RwLock<IndexMap>>,
}

impl MemoryDriver {
    /// Creates a new empty driver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the indexes created on a collection, for assertions.
    pub async fn index_names(&self, collection: &str) -> Vec<String> {
        self.indexes
            .read()
            .await
            .get(collection)
            .map(|names| {
                let mut names: Vec<String> = names.iter().cloned().collect();
                names.sort();
                names
            })
            .unwrap_or_default()
    }

    /// Raw contents of a collection, for assertions.
    pub async fn documents(&self, collection: &str) -> Vec<Document> {
        self.store
            .read()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

/// Cursor over an already-materialized snapshot of matching documents.
struct MemoryCursor(Vec<Document>);

#[async_trait]
impl DocumentCursor for MemoryCursor {
    async fn materialize(self: Box<Self>) -> DocGateResult<Vec<Document>> {
        Ok(self.0)
    }
}

/// Readable text for a primary-key value in error messages.
fn id_text(id: &Bson) -> String {
    match id {
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Applies an update document in place. Operator documents support `$set`
/// and `$unset`; a bare document replaces every field except the primary
/// key.
fn apply_update(target: &mut Document, update: &Document) {
    let is_operator = update.keys().any(|key| key.starts_with('$'));

    if !is_operator {
        let id = target.get("_id").cloned();
        target.clear();
        for (field, value) in update {
            target.insert(field.clone(), value.clone());
        }
        if let Some(id) = id {
            target.insert("_id", id);
        }
        return;
    }

    if let Some(fields) = update.get("$set").and_then(Bson::as_document) {
        for (field, value) in fields {
            target.insert(field.clone(), value.clone());
        }
    }
    if let Some(fields) = update.get("$unset").and_then(Bson::as_document) {
        for (field, _) in fields {
            target.remove(field);
        }
    }
}

/// Builds the document inserted by an upsert: the filter's equality fields
/// overlaid with the update.
fn upsert_document(filter: &Document, update: &Document) -> Document {
    let mut document = filter.clone();
    apply_update(&mut document, update);
    document
}

#[async_trait]
impl StoreDriver for MemoryDriver {
    async fn ensure_collection(&self, collection: &str) -> DocGateResult<()> {
        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default();

        Ok(())
    }

    async fn insert_one(
        &self,
        document: Document,
        collection: &str,
    ) -> DocGateResult<Option<Document>> {
        let mut store = self.store.write().await;
        let docs = store.entry(collection.to_string()).or_default();

        if let Some(id) = document.get("_id") {
            if docs.iter().any(|existing| existing.get("_id") == Some(id)) {
                return Err(FacadeError::DuplicateKey {
                    key: id_text(id),
                    message: format!("E11000 duplicate key in {collection}"),
                });
            }
        }

        docs.push(document.clone());

        Ok(Some(document))
    }

    async fn find_one(
        &self,
        filter: Document,
        options: FindOneOptions,
        collection: &str,
    ) -> DocGateResult<Option<Document>> {
        let store = self.store.read().await;

        Ok(store
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| matches(doc, &filter)))
            .map(|doc| project(doc, options.projection.as_ref())))
    }

    async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: FindOneAndUpdateOptions,
        collection: &str,
    ) -> DocGateResult<Option<Document>> {
        let mut store = self.store.write().await;
        let docs = store.entry(collection.to_string()).or_default();

        match docs.iter_mut().find(|doc| matches(doc, &filter)) {
            Some(doc) => {
                let original = doc.clone();
                apply_update(doc, &update);

                Ok(Some(if options.return_original {
                    original
                } else {
                    doc.clone()
                }))
            }
            None if options.upsert => {
                let document = upsert_document(&filter, &update);
                docs.push(document.clone());

                Ok(if options.return_original {
                    None
                } else {
                    Some(document)
                })
            }
            None => Ok(None),
        }
    }

    async fn update_one(
        &self,
        filter: Document,
        update: Document,
        options: UpdateOptions,
        collection: &str,
    ) -> DocGateResult<()> {
        let mut store = self.store.write().await;
        let docs = store.entry(collection.to_string()).or_default();

        match docs.iter_mut().find(|doc| matches(doc, &filter)) {
            Some(doc) => apply_update(doc, &update),
            None if options.upsert => docs.push(upsert_document(&filter, &update)),
            None => {}
        }

        Ok(())
    }

    async fn remove(
        &self,
        filter: Document,
        options: RemoveOptions,
        collection: &str,
    ) -> DocGateResult<u64> {
        let mut store = self.store.write().await;
        let Some(docs) = store.get_mut(collection) else {
            return Ok(0);
        };

        if options.single {
            if let Some(position) = docs.iter().position(|doc| matches(doc, &filter)) {
                docs.remove(position);
                return Ok(1);
            }
            return Ok(0);
        }

        let before = docs.len();
        docs.retain(|doc| !matches(doc, &filter));

        Ok((before - docs.len()) as u64)
    }

    async fn count(&self, filter: Document, collection: &str) -> DocGateResult<u64> {
        let store = self.store.read().await;

        Ok(store
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| matches(doc, &filter)).count() as u64)
            .unwrap_or(0))
    }

    async fn find(
        &self,
        spec: FindSpec,
        collection: &str,
    ) -> DocGateResult<Box<dyn DocumentCursor>> {
        let store = self.store.read().await;
        let Some(docs) = store.get(collection) else {
            return Ok(Box::new(MemoryCursor(Vec::new())));
        };

        let mut selected: Vec<Document> = docs
            .iter()
            .filter(|doc| matches(doc, &spec.filter))
            .cloned()
            .collect();

        if let Some(sort) = &spec.sort {
            selected.sort_by(|a, b| compare(a, b, sort));
        }

        let selected = selected
            .into_iter()
            .skip(spec.skip.unwrap_or(0) as usize)
            .take(spec.limit.unwrap_or(u64::MAX) as usize)
            .map(|doc| project(&doc, spec.projection.as_ref()))
            .collect();

        Ok(Box::new(MemoryCursor(selected)))
    }

    async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        _options: Option<Document>,
        collection: &str,
    ) -> DocGateResult<Box<dyn DocumentCursor>> {
        if !pipeline.is_empty() {
            return Err(FacadeError::Backend(
                "aggregation pipelines are not supported by the memory driver".to_string(),
            ));
        }

        Ok(Box::new(MemoryCursor(self.documents(collection).await)))
    }

    async fn index_exists(&self, name: &str, collection: &str) -> DocGateResult<bool> {
        Ok(self
            .indexes
            .read()
            .await
            .get(collection)
            .is_some_and(|names| names.contains(name)))
    }

    async fn create_index(
        &self,
        _keys: Document,
        options: IndexOptions,
        collection: &str,
    ) -> DocGateResult<()> {
        self.indexes
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(options.name);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[tokio::test]
    async fn insert_detects_duplicate_primary_keys() {
        let driver = MemoryDriver::new();
        driver
            .insert_one(doc! { "_id": "a", "n": 1 }, "things")
            .await
            .unwrap();

        let err = driver
            .insert_one(doc! { "_id": "a", "n": 2 }, "things")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_KEY");
        match err {
            FacadeError::DuplicateKey { key, .. } => assert_eq!(key, "a"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn find_applies_sort_skip_limit_and_projection() {
        let driver = MemoryDriver::new();
        for n in [3_i64, 1, 2, 5, 4] {
            driver
                .insert_one(doc! { "_id": n, "n": n, "extra": "x" }, "things")
                .await
                .unwrap();
        }

        let cursor = driver
            .find(
                FindSpec {
                    filter: doc! {},
                    projection: Some(doc! { "n": 1, "_id": 0 }),
                    sort: Some(doc! { "n": 1 }),
                    limit: Some(2),
                    skip: Some(1),
                },
                "things",
            )
            .await
            .unwrap();

        let docs = cursor.materialize().await.unwrap();
        assert_eq!(docs, vec![doc! { "n": 2_i64 }, doc! { "n": 3_i64 }]);
    }

    #[tokio::test]
    async fn update_one_applies_set_and_unset() {
        let driver = MemoryDriver::new();
        driver
            .insert_one(doc! { "_id": "a", "n": 1, "old": true }, "things")
            .await
            .unwrap();

        driver
            .update_one(
                doc! { "_id": "a" },
                doc! { "$set": { "n": 2 }, "$unset": { "old": "" } },
                UpdateOptions::default(),
                "things",
            )
            .await
            .unwrap();

        let doc = driver
            .find_one(doc! { "_id": "a" }, FindOneOptions::default(), "things")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc, doc! { "_id": "a", "n": 2 });
    }

    #[tokio::test]
    async fn find_one_and_update_returns_state_per_options() {
        let driver = MemoryDriver::new();
        driver
            .insert_one(doc! { "_id": "a", "n": 1 }, "things")
            .await
            .unwrap();

        let updated = driver
            .find_one_and_update(
                doc! { "_id": "a" },
                doc! { "$set": { "n": 2 } },
                FindOneAndUpdateOptions::default(),
                "things",
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get("n"), Some(&Bson::Int32(2)));

        let original = driver
            .find_one_and_update(
                doc! { "_id": "a" },
                doc! { "$set": { "n": 3 } },
                FindOneAndUpdateOptions { return_original: true, ..Default::default() },
                "things",
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(original.get("n"), Some(&Bson::Int32(2)));
    }

    #[tokio::test]
    async fn remove_honors_the_single_option() {
        let driver = MemoryDriver::new();
        for n in 0..3_i64 {
            driver
                .insert_one(doc! { "_id": n, "kind": "t" }, "things")
                .await
                .unwrap();
        }

        let removed = driver
            .remove(
                doc! { "kind": "t" },
                RemoveOptions { single: true },
                "things",
            )
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let removed = driver
            .remove(doc! { "kind": "t" }, RemoveOptions::default(), "things")
            .await
            .unwrap();
        assert_eq!(removed, 2);
    }

    #[tokio::test]
    async fn index_registry_reports_created_indexes() {
        let driver = MemoryDriver::new();
        assert!(!driver.index_exists("email", "users").await.unwrap());

        driver
            .create_index(doc! { "email": 1 }, IndexOptions::named("email"), "users")
            .await
            .unwrap();

        assert!(driver.index_exists("email", "users").await.unwrap());
        assert_eq!(driver.index_names("users").await, vec!["email".to_string()]);
    }

    #[tokio::test]
    async fn aggregate_rejects_nonempty_pipelines() {
        let driver = MemoryDriver::new();
        let err = driver
            .aggregate(vec![doc! { "$match": {} }], None, "things")
            .await
            .map(|_| ())
            .unwrap_err();
        assert_eq!(err.code(), "BACKEND");
    }
}
