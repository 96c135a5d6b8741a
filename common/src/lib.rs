//! Shared building blocks for the `ionicsub` workspace.
//!
//! Everything in here is plain data plus the few helpers both the engine
//! (`ionicsub-core`) and the front-end (`ionicsub-cli`) need to agree on:
//! the scan [`target`], the run [`config`], the [`tool`] registry, the
//! per-run [`workspace`] layout and the [`error`] type steps report.

pub mod config;
pub mod error;
pub mod log;
pub mod target;
pub mod tool;
pub mod workspace;

#[doc(hidden)]
pub use tracing;
