//! Lazy query chain for paginated multi-document search.
//!
//! [`FindChain`] accumulates filter/projection/sort/pagination state
//! without contacting the store. The terminal [`FindChain::run`] builds a
//! driver cursor, then issues the count and the fetch concurrently and
//! combines them into a [`Page`]. The chain is single-shot: `run` consumes
//! it, and a new search requires a new chain.
//!
//! The owning facade installs an execution hook via
//! [`FindChain::with_exec`] so the terminal step runs inside the facade's
//! timer lifecycle without the chain knowing about instrumentation.

use bson::Document;
use futures::{future::BoxFuture, try_join};
use std::fmt;

use crate::{driver::StoreDriver, error::DocGateResult, page::Page};

/// Accumulated query state, consumed once by the terminal step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindSpec {
    /// Filter document matching the store's query syntax.
    pub filter: Document,
    /// Inclusion projection applied to returned documents.
    pub projection: Option<Document>,
    /// Field → direction sort document.
    pub sort: Option<Document>,
    /// Maximum number of documents to return.
    pub limit: Option<u64>,
    /// Number of matching documents to skip before returning any.
    pub skip: Option<u64>,
}

/// Strategy invoked by [`FindChain::run`] in place of direct execution.
pub type ExecHook<'a> =
    Box<dyn FnOnce(FindSpec) -> BoxFuture<'a, DocGateResult<Page<Document>>> + Send + 'a>;

/// Fluent, deferred search over one collection.
pub struct FindChain<'a> {
    driver: &'a dyn StoreDriver,
    collection: &'a str,
    spec: FindSpec,
    exec: Option<ExecHook<'a>>,
}

impl<'a> FindChain<'a> {
    /// Creates a chain over `collection` with the initial filter and
    /// projection. No store call is made until [`run`](Self::run).
    pub fn new(
        driver: &'a dyn StoreDriver,
        collection: &'a str,
        filter: Document,
        projection: Option<Document>,
    ) -> Self {
        Self {
            driver,
            collection,
            spec: FindSpec { filter, projection, ..FindSpec::default() },
            exec: None,
        }
    }

    /// Adds a field → direction sort document.
    pub fn sort(mut self, sort: Document) -> Self {
        self.spec.sort = Some(sort);
        self
    }

    /// Caps the number of returned documents. Does not affect the page's
    /// `total`.
    pub fn limit(mut self, limit: u64) -> Self {
        self.spec.limit = Some(limit);
        self
    }

    /// Skips the first `skip` matching documents.
    pub fn skip(mut self, skip: u64) -> Self {
        self.spec.skip = Some(skip);
        self
    }

    /// Installs the terminal-execution strategy. When set, [`run`](Self::run)
    /// hands the accumulated spec to the hook instead of executing directly.
    pub fn with_exec(mut self, exec: ExecHook<'a>) -> Self {
        self.exec = Some(exec);
        self
    }

    /// Read access to the accumulated state, mainly for assertions.
    pub fn spec(&self) -> &FindSpec {
        &self.spec
    }

    /// Executes the search and resolves with the page and the full
    /// filtered count.
    pub async fn run(mut self) -> DocGateResult<Page<Document>> {
        match self.exec.take() {
            Some(exec) => exec(self.spec).await,
            None => Self::execute(self.driver, self.collection, self.spec).await,
        }
    }

    /// Direct terminal step: builds the cursor, then counts and
    /// materializes concurrently. Exposed so an execution hook can wrap it.
    pub async fn execute(
        driver: &dyn StoreDriver,
        collection: &str,
        spec: FindSpec,
    ) -> DocGateResult<Page<Document>> {
        let filter = spec.filter.clone();
        let cursor = driver.find(spec, collection).await?;
        // Count runs against the bare filter so `total` stays independent
        // of limit/skip. No ordering between the two futures matters.
        let (total, docs) = try_join!(driver.count(filter, collection), cursor.materialize())?;

        Ok(Page::new(docs, total))
    }
}

impl fmt::Debug for FindChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FindChain")
            .field("collection", &self.collection)
            .field("spec", &self.spec)
            .field("has_exec", &self.exec.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{
        DocumentCursor, FindOneAndUpdateOptions, FindOneOptions, RemoveOptions, StoreDriver,
        UpdateOptions,
    };
    use crate::error::FacadeError;
    use crate::index::IndexOptions;
    use async_trait::async_trait;
    use bson::doc;
    use std::sync::Mutex;

    /// Driver stub that serves a fixed document set through `find`/`count`
    /// and records the specs it received.
    #[derive(Debug, Default)]
    struct FixtureDriver {
        docs: Vec<Document>,
        seen_specs: Mutex<Vec<FindSpec>>,
    }

    struct FixtureCursor(Vec<Document>);

    #[async_trait]
    impl DocumentCursor for FixtureCursor {
        async fn materialize(self: Box<Self>) -> DocGateResult<Vec<Document>> {
            Ok(self.0)
        }
    }

    #[async_trait]
    impl StoreDriver for FixtureDriver {
        async fn ensure_collection(&self, _collection: &str) -> DocGateResult<()> {
            Ok(())
        }

        async fn insert_one(
            &self,
            _document: Document,
            _collection: &str,
        ) -> DocGateResult<Option<Document>> {
            Err(FacadeError::Backend("not wired".into()))
        }

        async fn find_one(
            &self,
            _filter: Document,
            _options: FindOneOptions,
            _collection: &str,
        ) -> DocGateResult<Option<Document>> {
            Err(FacadeError::Backend("not wired".into()))
        }

        async fn find_one_and_update(
            &self,
            _filter: Document,
            _update: Document,
            _options: FindOneAndUpdateOptions,
            _collection: &str,
        ) -> DocGateResult<Option<Document>> {
            Err(FacadeError::Backend("not wired".into()))
        }

        async fn update_one(
            &self,
            _filter: Document,
            _update: Document,
            _options: UpdateOptions,
            _collection: &str,
        ) -> DocGateResult<()> {
            Err(FacadeError::Backend("not wired".into()))
        }

        async fn remove(
            &self,
            _filter: Document,
            _options: RemoveOptions,
            _collection: &str,
        ) -> DocGateResult<u64> {
            Err(FacadeError::Backend("not wired".into()))
        }

        async fn count(&self, _filter: Document, _collection: &str) -> DocGateResult<u64> {
            Ok(self.docs.len() as u64)
        }

        async fn find(
            &self,
            spec: FindSpec,
            _collection: &str,
        ) -> DocGateResult<Box<dyn DocumentCursor>> {
            let limit = spec.limit.unwrap_or(u64::MAX) as usize;
            let skip = spec.skip.unwrap_or(0) as usize;
            self.seen_specs.lock().unwrap().push(spec);

            Ok(Box::new(FixtureCursor(
                self.docs.iter().skip(skip).take(limit).cloned().collect(),
            )))
        }

        async fn aggregate(
            &self,
            _pipeline: Vec<Document>,
            _options: Option<Document>,
            _collection: &str,
        ) -> DocGateResult<Box<dyn DocumentCursor>> {
            Err(FacadeError::Backend("not wired".into()))
        }

        async fn index_exists(&self, _name: &str, _collection: &str) -> DocGateResult<bool> {
            Ok(false)
        }

        async fn create_index(
            &self,
            _keys: Document,
            _options: IndexOptions,
            _collection: &str,
        ) -> DocGateResult<()> {
            Ok(())
        }
    }

    fn fixture(n: usize) -> FixtureDriver {
        FixtureDriver {
            docs: (0..n).map(|i| doc! { "n": i as i64 }).collect(),
            ..FixtureDriver::default()
        }
    }

    #[test]
    fn fluent_calls_accumulate_state() {
        let driver = fixture(0);
        let chain = FindChain::new(&driver, "things", doc! { "kind": "a" }, None)
            .sort(doc! { "n": 1 })
            .limit(3)
            .skip(6);

        assert_eq!(chain.spec().filter, doc! { "kind": "a" });
        assert_eq!(chain.spec().sort, Some(doc! { "n": 1 }));
        assert_eq!(chain.spec().limit, Some(3));
        assert_eq!(chain.spec().skip, Some(6));
    }

    #[tokio::test]
    async fn total_is_independent_of_limit() {
        let driver = fixture(10);
        let page = FindChain::new(&driver, "things", doc! {}, None)
            .limit(3)
            .run()
            .await
            .unwrap();

        assert_eq!(page.docs.len(), 3);
        assert_eq!(page.total, 10);
    }

    #[tokio::test]
    async fn empty_result_is_a_page_not_an_error() {
        let driver = fixture(0);
        let page = FindChain::new(&driver, "things", doc! { "kind": "none" }, None)
            .run()
            .await
            .unwrap();

        assert_eq!(page, Page::default());
    }

    #[tokio::test]
    async fn exec_hook_receives_the_accumulated_spec() {
        let driver = fixture(0);
        let chain = FindChain::new(&driver, "things", doc! { "kind": "b" }, None)
            .limit(5)
            .with_exec(Box::new(|spec| {
                Box::pin(async move {
                    assert_eq!(spec.filter, doc! { "kind": "b" });
                    assert_eq!(spec.limit, Some(5));
                    Ok(Page::new(Vec::new(), 42))
                })
            }));

        let page = chain.run().await.unwrap();
        assert_eq!(page.total, 42);
    }
}
