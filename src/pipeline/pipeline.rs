//! The pipeline structure: ordered phases, ordered interceptors.

use crate::base::error::PipeError;
use crate::pipeline::context::{Execution, PipelineContext, Segment};
use crate::pipeline::phase::Phase;
use async_trait::async_trait;
use std::sync::Arc;

/// A unit of logic registered into a phase.
///
/// Implementations inspect or transform the subject and decide whether to
/// continue the chain by calling
/// [`proceed`](crate::pipeline::PipelineContext::proceed); returning
/// without proceeding halts the rest of the chain (the sanctioned
/// short-circuit), and returning an error fails the execution.
#[async_trait]
pub trait Interceptor<S, C>: Send + Sync {
    async fn run(&self, cx: &mut PipelineContext<S, C>) -> Result<(), PipeError>;
}

/// How a phase was positioned when it was registered; merge re-resolves
/// absent phases through this.
#[derive(Clone)]
enum PhaseRelation {
    Last,
    Before(Phase),
    After(Phase),
}

struct PhaseContent<S, C> {
    phase: Phase,
    relation: PhaseRelation,
    interceptors: Vec<Arc<dyn Interceptor<S, C>>>,
}

impl<S, C> Clone for PhaseContent<S, C> {
    fn clone(&self) -> Self {
        Self {
            phase: self.phase.clone(),
            relation: self.relation.clone(),
            interceptors: self.interceptors.clone(),
        }
    }
}

/// An execution pipeline for asynchronous, extensible computations.
///
/// Phases execute in declared order; interceptors within a phase execute
/// in registration order. The definition is immutable during execution by
/// construction: mutation requires `&mut self`, execution only `&self`.
pub struct Pipeline<S, C> {
    phases: Vec<PhaseContent<S, C>>,
}

impl<S, C> Pipeline<S, C> {
    /// Construct a pipeline with an initial phase order.
    pub fn new(phases: impl IntoIterator<Item = Phase>) -> Self {
        let mut pipeline = Self { phases: Vec::new() };
        for phase in phases {
            pipeline.add_phase(phase);
        }
        pipeline
    }

    fn find(&self, phase: &Phase) -> Option<usize> {
        self.phases.iter().position(|content| content.phase == *phase)
    }

    /// Add `phase` to the end of this pipeline. A phase that is already
    /// present stays where it is.
    pub fn add_phase(&mut self, phase: Phase) {
        if self.find(&phase).is_some() {
            return;
        }
        self.phases.push(PhaseContent {
            phase,
            relation: PhaseRelation::Last,
            interceptors: Vec::new(),
        });
    }

    /// Insert `phase` directly after `reference`.
    pub fn insert_phase_after(&mut self, reference: &Phase, phase: Phase) -> Result<(), PipeError> {
        if self.find(&phase).is_some() {
            return Ok(());
        }
        let index = self
            .find(reference)
            .ok_or_else(|| PipeError::PhaseNotRegistered(reference.name().to_string()))?;
        self.phases.insert(
            index + 1,
            PhaseContent {
                phase,
                relation: PhaseRelation::After(reference.clone()),
                interceptors: Vec::new(),
            },
        );
        Ok(())
    }

    /// Insert `phase` directly before `reference`.
    pub fn insert_phase_before(&mut self, reference: &Phase, phase: Phase) -> Result<(), PipeError> {
        if self.find(&phase).is_some() {
            return Ok(());
        }
        let index = self
            .find(reference)
            .ok_or_else(|| PipeError::PhaseNotRegistered(reference.name().to_string()))?;
        self.phases.insert(
            index,
            PhaseContent {
                phase,
                relation: PhaseRelation::Before(reference.clone()),
                interceptors: Vec::new(),
            },
        );
        Ok(())
    }

    /// Append `interceptor` to `phase`'s list.
    pub fn intercept<I>(&mut self, phase: &Phase, interceptor: I) -> Result<(), PipeError>
    where
        I: Interceptor<S, C> + 'static,
    {
        let index = self
            .find(phase)
            .ok_or_else(|| PipeError::PhaseNotRegistered(phase.name().to_string()))?;
        self.phases[index].interceptors.push(Arc::new(interceptor));
        Ok(())
    }

    /// Current phase order.
    pub fn phases(&self) -> Vec<Phase> {
        self.phases.iter().map(|content| content.phase.clone()).collect()
    }

    /// True when no interceptors are installed, regardless of phase count.
    pub fn is_empty(&self) -> bool {
        self.phases.iter().all(|content| content.interceptors.is_empty())
    }

    /// Merge another pipeline into this one, maintaining relative phase
    /// order on both sides.
    ///
    /// Phases are unioned by identity; a phase absent here is re-inserted
    /// through the relation recorded when it was registered in `other`.
    /// Interceptors for a shared phase are concatenated, this pipeline's
    /// first.
    pub fn merge(&mut self, other: &Pipeline<S, C>) -> Result<(), PipeError> {
        for content in &other.phases {
            let index = match self.find(&content.phase) {
                Some(index) => index,
                None => {
                    match &content.relation {
                        PhaseRelation::Last => self.add_phase(content.phase.clone()),
                        PhaseRelation::Before(reference) => {
                            self.insert_phase_before(reference, content.phase.clone())?
                        }
                        PhaseRelation::After(reference) => {
                            self.insert_phase_after(reference, content.phase.clone())?
                        }
                    }
                    self.find(&content.phase).expect("phase was just inserted")
                }
            };
            self.phases[index]
                .interceptors
                .extend(content.interceptors.iter().cloned());
        }
        Ok(())
    }

    /// Execute this pipeline for one call, threading `subject` through
    /// every interceptor that proceeds.
    ///
    /// Exactly one terminal state is reached: `Ok` with
    /// [`Outcome::Completed`](crate::pipeline::Outcome::Completed) when
    /// the whole chain ran, `Ok` with
    /// [`Outcome::FinishedEarly`](crate::pipeline::Outcome::FinishedEarly)
    /// when an interceptor stopped without proceeding, or `Err` with the
    /// failure an interceptor raised.
    pub async fn execute(&self, call: C, subject: S) -> Result<Execution<S, C>, PipeError> {
        let segments: Vec<Segment<S, C>> = self
            .phases
            .iter()
            .map(|content| Segment {
                phase: content.phase.clone(),
                interceptors: content.interceptors.clone(),
            })
            .collect();
        let mut cx = PipelineContext::new(call, subject, segments);
        match cx.proceed().await {
            Ok(()) => Ok(cx.into_execution()),
            Err(e) => {
                if e.is_cancellation() {
                    tracing::trace!("pipeline execution cancelled");
                } else {
                    tracing::debug!(error = %e, "pipeline execution failed");
                }
                Err(e)
            }
        }
    }
}

impl<S, C> Clone for Pipeline<S, C> {
    fn clone(&self) -> Self {
        Self {
            phases: self.phases.clone(),
        }
    }
}

impl<S, C> Default for Pipeline<S, C> {
    fn default() -> Self {
        Self { phases: Vec::new() }
    }
}

impl<S, C> std::fmt::Debug for Pipeline<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for content in &self.phases {
            map.entry(&content.phase.name(), &content.interceptors.len());
        }
        map.finish()
    }
}
