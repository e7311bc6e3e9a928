//! CRUD facade and index synchronizer.
//!
//! [`Repository`] owns one bound collection, delegates every operation to
//! the [`StoreDriver`], wraps each call in an [`OpTimer`], normalizes
//! recognized store failures, and reconciles declared indexes against the
//! live store on demand.
//!
//! Construction goes through [`RepositoryBuilder`]: the collection name and
//! index declarations are fixed up front, the instrumentation sink may be
//! injected there or installed later with
//! [`set_debugger`](Repository::set_debugger).

use bson::{Bson, Document, doc};
use futures::future::join_all;
use std::sync::Arc;

use crate::{
    driver::{
        DocumentCursor, FindOneAndUpdateOptions, FindOneOptions, RemoveOptions, StoreDriver,
        UpdateOptions,
    },
    entity::Entity,
    error::{DocGateResult, FacadeError},
    index::IndexSpec,
    instrument::{InstrumentSink, OpTimer, SharedSink},
    query::FindChain,
};

/// Record category used by every facade timer.
const CATEGORY: &str = "store";

/// Data-access facade bound to one named store collection.
///
/// All operations are independent requests; the handle is read-only after
/// [`init`](Repository::init) and may be shared across any number of
/// in-flight operations.
#[derive(Debug)]
pub struct Repository<B: StoreDriver> {
    driver: B,
    collection_name: Option<String>,
    collection: Option<String>,
    indexes: Vec<IndexSpec>,
    sink: SharedSink,
}

impl<B: StoreDriver> Repository<B> {
    /// Starts building a repository over the given driver.
    pub fn builder(driver: B) -> RepositoryBuilder<B> {
        RepositoryBuilder {
            driver,
            collection_name: None,
            indexes: Vec::new(),
            sink: None,
        }
    }

    /// Builder preconfigured with the entity type's collection name.
    pub fn for_entity<E: Entity>(driver: B) -> RepositoryBuilder<B> {
        Self::builder(driver).collection(E::collection_name())
    }

    /// Binds the collection handle using the declared name.
    ///
    /// Fails with `NO_COLLECTION_NAME` when no name was declared at
    /// construction. Idempotent when called again with the same name.
    pub async fn init(&mut self) -> DocGateResult<()> {
        let name = self
            .collection_name
            .clone()
            .ok_or(FacadeError::NoCollectionName)?;
        self.driver.ensure_collection(&name).await?;
        self.collection = Some(name);

        Ok(())
    }

    /// Installs the instrumentation sink used by every subsequently-started
    /// timer. Never calling this leaves logging a silent no-op.
    pub fn set_debugger(&mut self, sink: Arc<dyn InstrumentSink>) {
        self.sink = Some(sink);
    }

    /// Reconciles declared indexes against the live store and returns the
    /// names of the indexes it created.
    ///
    /// Phase 1 fans out one existence check per declaration and waits for
    /// every check to settle before inspecting any result. Phase 2 fans out
    /// one creation per missing declaration behind the same kind of
    /// barrier. The first failure propagates; indexes already created are
    /// not rolled back, so callers recover by invoking this again.
    pub async fn ensure_indexes(&self) -> DocGateResult<Vec<String>> {
        let collection = self.handle()?;
        if self.indexes.is_empty() {
            return Ok(Vec::new());
        }

        let mut timer = self.timer("ensureIndexes");
        timer.set_message(format!(
            "ensureIndexes [{}] on {}",
            self.indexes
                .iter()
                .map(IndexSpec::name)
                .collect::<Vec<_>>()
                .join(", "),
            collection,
        ));

        settle(timer, self.reconcile_indexes(collection).await)
    }

    async fn reconcile_indexes(&self, collection: &str) -> DocGateResult<Vec<String>> {
        // Phase 1: all existence checks issued before any is awaited, and
        // all settle before any result is inspected.
        let checks = self
            .indexes
            .iter()
            .map(|spec| self.driver.index_exists(spec.name(), collection));
        let mut present = Vec::with_capacity(self.indexes.len());
        for settled in join_all(checks).await {
            present.push(settled?);
        }

        let missing: Vec<&IndexSpec> = self
            .indexes
            .iter()
            .zip(present)
            .filter_map(|(spec, exists)| (!exists).then_some(spec))
            .collect();
        if missing.is_empty() {
            return Ok(Vec::new());
        }

        // Phase 2: one creation per missing declaration, same barrier.
        // First failure wins; partial creation is tolerated.
        let creations = missing.iter().map(|spec| {
            self.driver
                .create_index(spec.keys.clone(), spec.options.clone(), collection)
        });
        for settled in join_all(creations).await {
            settled?;
        }

        Ok(missing
            .into_iter()
            .map(|spec| spec.name().to_string())
            .collect())
    }

    /// Inserts one document and resolves with it as persisted.
    ///
    /// A caller-supplied `id` field is copied into the store's primary key
    /// before insertion. A primary-key conflict is normalized to
    /// `ALREADY_EXISTS` carrying the offending identifier; other failures
    /// pass through unchanged.
    pub async fn insert_one(&self, mut data: Document) -> DocGateResult<Option<Document>> {
        let collection = self.handle()?;
        let mut timer = self.timer("insertOne");
        timer.set_message(format!("insertOne {} into {}", data, collection));

        if let Some(id) = data.get("id").cloned() {
            data.insert("_id", id);
        }

        let result = match self.driver.insert_one(data, collection).await {
            Err(FacadeError::DuplicateKey { key, .. }) => {
                Err(FacadeError::AlreadyExists(key, collection.to_string()))
            }
            other => other,
        };

        settle(timer, result)
    }

    /// Single-document lookup; absence is not an error.
    pub async fn find_one(
        &self,
        filter: Document,
        options: FindOneOptions,
    ) -> DocGateResult<Option<Document>> {
        let collection = self.handle()?;
        let mut timer = self.timer("findOne");
        timer.set_message(format!("findOne {} in {}", filter, collection));

        settle(timer, self.driver.find_one(filter, options, collection).await)
    }

    /// Looks up a single document by its primary key.
    pub async fn find_one_by_id(
        &self,
        id: impl Into<Bson>,
        options: FindOneOptions,
    ) -> DocGateResult<Option<Document>> {
        self.find_one(doc! { "_id": id.into() }, options).await
    }

    /// Applies an update and returns the resulting document.
    ///
    /// The default options return the post-update document; callers wanting
    /// the pre-update state set `return_original`.
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: Document,
        options: FindOneAndUpdateOptions,
    ) -> DocGateResult<Option<Document>> {
        let collection = self.handle()?;
        let mut timer = self.timer("findOneAndUpdate");
        timer.set_message(format!(
            "findOneAndUpdate {} with {} in {}",
            filter, update, collection,
        ));

        settle(
            timer,
            self.driver
                .find_one_and_update(filter, update, options, collection)
                .await,
        )
    }

    /// Applies an update to the first matching document and resolves with
    /// the caller's update payload, not the store's raw result.
    pub async fn update_one(
        &self,
        filter: Document,
        data: Document,
        options: UpdateOptions,
    ) -> DocGateResult<Document> {
        let collection = self.handle()?;
        let mut timer = self.timer("updateOne");
        timer.set_message(format!(
            "updateOne {} with {} in {}",
            filter, data, collection,
        ));

        let result = self
            .driver
            .update_one(filter, data.clone(), options, collection)
            .await
            .map(|()| data);

        settle(timer, result)
    }

    /// Removes matching documents and resolves with the number removed.
    pub async fn remove_one(
        &self,
        filter: Document,
        options: RemoveOptions,
    ) -> DocGateResult<u64> {
        let collection = self.handle()?;
        let mut timer = self.timer("removeOne");
        timer.set_message(format!("removeOne {} in {}", filter, collection));

        settle(timer, self.driver.remove(filter, options, collection).await)
    }

    /// Counts documents matching `filter`.
    pub async fn count(&self, filter: Document) -> DocGateResult<u64> {
        let collection = self.handle()?;
        let mut timer = self.timer("count");
        timer.set_message(format!("count {} in {}", filter, collection));

        settle(timer, self.driver.count(filter, collection).await)
    }

    /// Passes a processing pipeline through to the store and returns its
    /// cursor directly.
    pub async fn aggregate(
        &self,
        pipeline: Vec<Document>,
        options: Option<Document>,
    ) -> DocGateResult<Box<dyn DocumentCursor>> {
        let collection = self.handle()?;
        let mut timer = self.timer("aggregate");
        timer.set_message(format!(
            "aggregate {} stage(s) on {}",
            pipeline.len(),
            collection,
        ));
        // Aggregation results are consumed lazily by the caller, so only
        // the dispatch is recorded.
        timer.stop();

        self.driver.aggregate(pipeline, options, collection).await
    }

    /// Returns a lazy query chain over the bound collection.
    ///
    /// The chain's terminal step is hooked so it runs inside this facade's
    /// timer lifecycle; the chain itself stays instrumentation-free.
    pub fn find(
        &self,
        filter: Document,
        projection: Option<Document>,
    ) -> DocGateResult<FindChain<'_>> {
        let collection = self.handle()?;
        let driver: &dyn StoreDriver = &self.driver;
        let sink = self.sink.clone();
        let message = format!("find {} in {}", filter, collection);

        Ok(
            FindChain::new(driver, collection, filter, projection).with_exec(Box::new(
                move |spec| {
                    Box::pin(async move {
                        let mut timer = OpTimer::start(CATEGORY, "find", sink);
                        timer.set_message(message);

                        match FindChain::execute(driver, collection, spec).await {
                            Ok(page) => {
                                timer.stop();
                                Ok(page)
                            }
                            Err(err) => {
                                timer.fail(err.to_string());
                                Err(err)
                            }
                        }
                    })
                },
            )),
        )
    }

    /// The declared index set, in declaration order.
    pub fn indexes(&self) -> &[IndexSpec] {
        &self.indexes
    }

    /// Direct access to the underlying driver.
    pub fn driver(&self) -> &B {
        &self.driver
    }

    fn handle(&self) -> DocGateResult<&str> {
        self.collection.as_deref().ok_or(FacadeError::NoCollectionName)
    }

    fn timer(&self, name: &str) -> OpTimer {
        OpTimer::start(CATEGORY, name, self.sink.clone())
    }
}

/// Terminates the timer according to the outcome and forwards the result.
fn settle<T>(timer: OpTimer, result: DocGateResult<T>) -> DocGateResult<T> {
    match &result {
        Ok(_) => timer.stop(),
        Err(err) => timer.fail(err.to_string()),
    }

    result
}

/// Builder fixing a repository's collection name, index declarations, and
/// optionally its instrumentation sink.
#[derive(Debug)]
pub struct RepositoryBuilder<B: StoreDriver> {
    driver: B,
    collection_name: Option<String>,
    indexes: Vec<IndexSpec>,
    sink: SharedSink,
}

impl<B: StoreDriver> RepositoryBuilder<B> {
    /// Declares the collection name bound by [`Repository::init`].
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    /// Appends one index declaration.
    pub fn index(mut self, spec: IndexSpec) -> Self {
        self.indexes.push(spec);
        self
    }

    /// Appends a sequence of index declarations in order.
    pub fn indexes(mut self, specs: impl IntoIterator<Item = IndexSpec>) -> Self {
        self.indexes.extend(specs);
        self
    }

    /// Injects the instrumentation sink at construction time.
    pub fn debugger(mut self, sink: Arc<dyn InstrumentSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds the repository. The collection handle stays unbound until
    /// [`Repository::init`] is called.
    pub fn build(self) -> Repository<B> {
        Repository {
            driver: self.driver,
            collection_name: self.collection_name,
            collection: None,
            indexes: self.indexes,
            sink: self.sink,
        }
    }
}
