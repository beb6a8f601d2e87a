//! # pipenet
//!
//! The request/response processing substrate for HTTP clients and servers.
//!
//! `pipenet` provides the execution and streaming engine that client
//! send/receive paths and server call handling share: an ordered,
//! extensible interceptor pipeline driven over suspending byte channels,
//! independent of the underlying transport.
//!
//! ## Features
//!
//! - **Interceptor Pipelines**: named phases with identity semantics,
//!   relative phase insertion, and structure-preserving merge
//! - **Safe Short-Circuiting**: stopping a chain is a first-class
//!   outcome, never an error in disguise
//! - **Suspending Byte Channels**: bounded SPSC buffers with flush
//!   visibility and backpressure
//! - **Close-With-Cause**: producer failures surface to suspended
//!   consumers on other tasks, distinct from end-of-stream
//! - **Robust Cancellation**: drop-based task cancellation leaves
//!   channels and wait slots consistent
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pipenet::pipeline::{phases::request_pipeline, Interceptor, PipelineContext};
//! use pipenet::base::PipeError;
//!
//! let (mut pipeline, phases) = request_pipeline::<Request, Call>();
//! pipeline.intercept(&phases.render, RenderBody)?;
//! let execution = pipeline.execute(call, request).await?;
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error types, IO context helpers, engine registry
//! - [`channel`] - Byte channels, the suspension primitive, stream tasks
//! - [`pipeline`] - Phases, pipelines, and per-call execution
//!
//! ## Concurrency
//!
//! A call's interceptor chain runs sequentially on one task; byte
//! channels connect it to dedicated reader/writer tasks with
//! backpressure. Channel halves are single-owner, so concurrent readers
//! or writers cannot be expressed. Closing a channel with a cause is the
//! cross-task failure signal; cancellation is a distinct outcome that is
//! never reported as a failure.

pub mod base;
pub mod channel;
pub mod pipeline;
