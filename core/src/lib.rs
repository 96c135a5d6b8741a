//! Engine of `ionicsub`.
//!
//! The crate never enumerates anything itself. It installs and runs the
//! external tools, fetches the certificate-transparency feeds and stitches
//! the resulting text files together.
//!
//! **Architectural Note:**
//! Processes and HTTP go through the [`process::ProcessRunner`] and
//! [`fetch::HttpFetch`] traits. The [`pipeline::Engine`] only talks to those
//! abstractions, which is what lets the tests drive a full run without any
//! tool installed.

pub mod aggregate;
pub mod extract;
pub mod fetch;
pub mod installer;
pub mod pipeline;
pub mod process;

pub use pipeline::{Engine, RunReport, StepOutcome};
