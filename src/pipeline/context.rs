//! Per-call pipeline execution.

use crate::base::error::PipeError;
use crate::pipeline::phase::Phase;
use crate::pipeline::pipeline::Interceptor;
use std::sync::Arc;

/// One phase's interceptor list, snapshotted for a single execution.
pub(crate) struct Segment<S, C> {
    pub(crate) phase: Phase,
    pub(crate) interceptors: Vec<Arc<dyn Interceptor<S, C>>>,
}

/// How an execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Control flowed past the final interceptor via `proceed`.
    Completed,
    /// An interceptor stopped the chain without proceeding. Not an error.
    FinishedEarly,
}

/// Result of a successful (non-failed) execution.
#[derive(Debug)]
pub struct Execution<S, C> {
    pub subject: S,
    pub call: C,
    pub outcome: Outcome,
}

impl<S, C> Execution<S, C> {
    pub fn is_completed(&self) -> bool {
        self.outcome == Outcome::Completed
    }
}

/// Execution state for one call: the call object, the current subject,
/// and the cursor over the snapshotted phase/interceptor structure.
///
/// Handed to each interceptor; [`proceed`](Self::proceed) resolves to
/// running everything downstream, so an interceptor can act before and
/// after the rest of the chain, or catch the chain's failure.
pub struct PipelineContext<S, C> {
    call: C,
    subject: S,
    segments: Vec<Segment<S, C>>,
    phase_index: usize,
    interceptor_index: usize,
    exhausted: bool,
}

impl<S, C> PipelineContext<S, C> {
    pub(crate) fn new(call: C, subject: S, segments: Vec<Segment<S, C>>) -> Self {
        Self {
            call,
            subject,
            segments,
            phase_index: 0,
            interceptor_index: 0,
            exhausted: false,
        }
    }

    /// The call this execution belongs to. Opaque to the pipeline.
    pub fn call(&self) -> &C {
        &self.call
    }

    pub fn call_mut(&mut self) -> &mut C {
        &mut self.call
    }

    /// The value being threaded through the chain.
    pub fn subject(&self) -> &S {
        &self.subject
    }

    pub fn subject_mut(&mut self) -> &mut S {
        &mut self.subject
    }

    /// The phase the cursor currently sits in, if any.
    pub fn current_phase(&self) -> Option<&Phase> {
        self.segments.get(self.phase_index).map(|segment| &segment.phase)
    }

    /// Continue to the next interceptor (or the next phase's first, or
    /// completion when the chain is exhausted).
    ///
    /// Returns once everything downstream has finished; an `Err` from
    /// downstream surfaces here, giving the caller a chance to react
    /// before it propagates further up.
    pub async fn proceed(&mut self) -> Result<(), PipeError> {
        match self.advance() {
            Some((phase, interceptor)) => {
                tracing::trace!(phase = %phase, "proceeding");
                interceptor.run(self).await
            }
            None => {
                self.exhausted = true;
                Ok(())
            }
        }
    }

    /// Replace the subject seen by later interceptors, then proceed.
    pub async fn proceed_with(&mut self, subject: S) -> Result<(), PipeError> {
        self.subject = subject;
        self.proceed().await
    }

    fn advance(&mut self) -> Option<(Phase, Arc<dyn Interceptor<S, C>>)> {
        while self.phase_index < self.segments.len() {
            let segment = &self.segments[self.phase_index];
            if self.interceptor_index < segment.interceptors.len() {
                let phase = segment.phase.clone();
                let interceptor = Arc::clone(&segment.interceptors[self.interceptor_index]);
                self.interceptor_index += 1;
                return Some((phase, interceptor));
            }
            self.phase_index += 1;
            self.interceptor_index = 0;
        }
        None
    }

    pub(crate) fn into_execution(self) -> Execution<S, C> {
        let outcome = if self.exhausted {
            Outcome::Completed
        } else {
            Outcome::FinishedEarly
        };
        Execution {
            subject: self.subject,
            call: self.call,
            outcome,
        }
    }
}

impl<S, C> std::fmt::Debug for PipelineContext<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("phase_index", &self.phase_index)
            .field("interceptor_index", &self.interceptor_index)
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
