//! Operation timing and debug telemetry.
//!
//! Every facade operation is wrapped in an [`OpTimer`]: started before the
//! driver call, terminated exactly once on settlement with either
//! [`OpTimer::stop`] or [`OpTimer::fail`]. Termination builds an
//! [`InstrumentRecord`] and hands it to the installed [`InstrumentSink`],
//! fire-and-forget. With no sink installed the record is dropped silently;
//! a `tracing` debug event is emitted either way.

use serde::Serialize;
use std::{fmt::Debug, sync::Arc, time::Instant};

/// One completed or failed operation's timing and context.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InstrumentRecord {
    /// Coarse grouping, e.g. `"store"`.
    pub category: String,
    /// Operation name, e.g. `"insertOne"`.
    pub name: String,
    /// Human-readable context, typically the serialized call arguments.
    pub message: String,
    /// Elapsed wall-clock time in milliseconds.
    pub duration_ms: f64,
    /// Error text when the operation failed; `None` on success.
    pub error: Option<String>,
}

/// Destination for instrumentation records.
///
/// Implementations must not block and must not fail: delivery is
/// fire-and-forget and the facade never inspects the outcome.
pub trait InstrumentSink: Send + Sync + Debug {
    /// Receives one record. Called exactly once per settled operation.
    fn log(&self, record: InstrumentRecord);
}

/// Shared handle to an installed sink. `None` makes logging a no-op.
pub type SharedSink = Option<Arc<dyn InstrumentSink>>;

/// Measures one named operation and delivers a record on termination.
///
/// Exactly one of [`stop`](OpTimer::stop) or [`fail`](OpTimer::fail) is
/// called per timer; both consume it.
#[derive(Debug)]
pub struct OpTimer {
    category: String,
    name: String,
    message: String,
    started: Instant,
    sink: SharedSink,
}

impl OpTimer {
    /// Begins timing the named operation.
    pub fn start(category: impl Into<String>, name: impl Into<String>, sink: SharedSink) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
            message: String::new(),
            started: Instant::now(),
            sink,
        }
    }

    /// Attaches context to the eventual record. May be called any time
    /// before termination; the last value wins.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    /// Terminates the timer on success and delivers the record.
    pub fn stop(self) {
        self.finish(None);
    }

    /// Terminates the timer on failure and delivers the error variant.
    pub fn fail(self, error: impl Into<String>) {
        self.finish(Some(error.into()));
    }

    fn finish(self, error: Option<String>) {
        let duration_ms = self.started.elapsed().as_secs_f64() * 1_000.0;
        tracing::debug!(
            category = %self.category,
            name = %self.name,
            duration_ms,
            error = error.as_deref(),
            "{}",
            self.message,
        );

        if let Some(sink) = &self.sink {
            sink.log(InstrumentRecord {
                category: self.category,
                name: self.name,
                message: self.message,
                duration_ms,
                error,
            });
        }
    }
}
