//! Convenient re-exports of commonly used types from docgate.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docgate::prelude::*;
//! ```
//!
//! This provides access to:
//! - The repository facade and its builder
//! - Store driver and cursor traits with their option types
//! - Index declarations, the query chain, and page results
//! - Instrumentation records and the sink trait
//! - Error types

pub use docgate_core::{
    driver::{DocumentCursor, FindOneAndUpdateOptions, FindOneOptions, RemoveOptions, StoreDriver, UpdateOptions},
    entity::{Entity, EntityExt},
    error::{DocGateResult, FacadeError},
    index::{IndexDirection, IndexOptions, IndexSpec},
    instrument::{InstrumentRecord, InstrumentSink, OpTimer},
    page::Page,
    query::{FindChain, FindSpec},
    repo::{Repository, RepositoryBuilder},
};
