//! Operation pipeline executor.
//!
//! # Data Flow
//! ```text
//! operation (create address, send, ...)
//!     → graph.rs (StepGraph: named steps + declared dependencies)
//!     → validate step (local checks, no I/O)
//!     → data steps (node calls, independent ones interleaved)
//!     → format step (terminal, builds the result)
//!     → error.rs (PipelineError tagged with step + code)
//! ```

pub mod error;
pub mod graph;

pub use error::{FailureClass, PipelineError, PipelineResult};
pub use graph::{StepGraph, StepInput, StepValue};
