//! Interceptor pipelines.
//!
//! The execution side of the substrate:
//! - [`Phase`]: identity-based phase markers
//! - [`Pipeline`]: phase graph with relative insertion and merging
//! - [`PipelineContext`]: per-call execution with `proceed` semantics
//! - [`phases`]: the well-known client/server phase sets

pub mod context;
pub mod phase;
#[allow(clippy::module_inception)]
pub mod pipeline;
pub mod phases;

pub use context::{Execution, Outcome, PipelineContext};
pub use phase::Phase;
pub use pipeline::{Interceptor, Pipeline};
