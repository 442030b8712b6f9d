//! Observability
//!
//! Traces and observations in the Langfuse data model, recorded through an explicit
//! [`TraceContext`] and shipped by a [`TelemetryExporter`].

pub mod config;
pub mod context;
pub mod events;
pub mod exporters;

pub use config::{LangfuseConfig, LangfuseConfigBuilder};
pub use context::{ObserveOptions, TraceContext};
pub use events::{
    IngestionEvent, IngestionEventType, ObservationBody, ObservationLevel, ObservationType,
    ObservationUpdate, TraceBody, TraceUpdate,
};
pub use exporters::{InMemoryExporter, LangfuseExporter, NoopExporter, TelemetryExporter};
