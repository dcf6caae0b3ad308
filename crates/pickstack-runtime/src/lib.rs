//! `pickstack-runtime` – scan orchestration and task strategies.
//!
//! Drives the arm through scan viewpoints, runs the perception pipeline on
//! each capture, aggregates the results into a deduplicated object
//! registry, and executes the three task strategies against the external
//! motion and planning-scene collaborators.
//!
//! # Modules
//!
//! - [`config`] – [`PickstackConfig`][config::PickstackConfig]: every
//!   externally supplied numeric constant, loadable from TOML with
//!   `PICKSTACK_*` environment overrides.
//! - [`scan`] – [`ScanOrchestrator`][scan::ScanOrchestrator],
//!   [`ScanContext`][scan::ScanContext], and the
//!   [`ObjectRegistry`][scan::ObjectRegistry] dedupe/merge logic.
//! - [`tasks`] – [`TaskExecutor`][tasks::TaskExecutor]: fixed pick-place,
//!   detect-and-report, and same-color stacking.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console
//!   `tracing` subscriber setup.

pub mod config;
pub mod scan;
pub mod tasks;
pub mod telemetry;

pub use config::PickstackConfig;
pub use scan::{
    entire_mat_viewpoints, front_mat_viewpoints, ObjectRegistry, RegistryEntry, ScanContext,
    ScanOrchestrator, ScanRecord, ScanState, Viewpoint,
};
pub use tasks::TaskExecutor;
pub use telemetry::init_tracing;
