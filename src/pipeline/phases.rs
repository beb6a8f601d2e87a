//! Well-known phase sets.
//!
//! Plugins target these by identity, so the constructors return the
//! `Phase` handles alongside the pre-populated pipeline; there is no
//! global phase state.

use crate::pipeline::phase::Phase;
use crate::pipeline::pipeline::Pipeline;

/// Phases of the client request pipeline (building and sending).
pub struct RequestPhases {
    /// Runs before everything else.
    pub before: Phase,
    /// Request state bookkeeping (attributes, deferred defaults).
    pub state: Phase,
    /// Turn the user-supplied body into wire content.
    pub transform: Phase,
    /// Render the final request message.
    pub render: Phase,
    /// Hand the request to the send machinery.
    pub send: Phase,
}

/// Build the standard client request pipeline.
pub fn request_pipeline<S, C>() -> (Pipeline<S, C>, RequestPhases) {
    let phases = RequestPhases {
        before: Phase::new("Before"),
        state: Phase::new("State"),
        transform: Phase::new("Transform"),
        render: Phase::new("Render"),
        send: Phase::new("Send"),
    };
    let pipeline = Pipeline::new([
        phases.before.clone(),
        phases.state.clone(),
        phases.transform.clone(),
        phases.render.clone(),
        phases.send.clone(),
    ]);
    (pipeline, phases)
}

/// Phases of the client response pipeline (receiving and parsing).
pub struct ResponsePhases {
    /// Raw bytes arrive from the engine.
    pub receive: Phase,
    /// Decode the wire representation.
    pub parse: Phase,
    /// Turn wire content into the requested shape.
    pub transform: Phase,
    /// Response state bookkeeping.
    pub state: Phase,
    /// Runs after everything else (logging, metrics).
    pub after: Phase,
}

/// Build the standard client response pipeline.
pub fn response_pipeline<S, C>() -> (Pipeline<S, C>, ResponsePhases) {
    let phases = ResponsePhases {
        receive: Phase::new("Receive"),
        parse: Phase::new("Parse"),
        transform: Phase::new("Transform"),
        state: Phase::new("State"),
        after: Phase::new("After"),
    };
    let pipeline = Pipeline::new([
        phases.receive.clone(),
        phases.parse.clone(),
        phases.transform.clone(),
        phases.state.clone(),
        phases.after.clone(),
    ]);
    (pipeline, phases)
}

/// Phases of the server call pipeline.
pub struct CallPhases {
    /// Prepare call processing (decorate the call object).
    pub setup: Phase,
    /// Observe calls without changing them (tracing, metrics).
    pub monitoring: Phase,
    /// Installed plugins run here by default.
    pub plugins: Phase,
    /// Routing and handlers respond to the call.
    pub call: Phase,
    /// Last-resort handling for calls nothing responded to.
    pub fallback: Phase,
}

/// Build the standard server call pipeline.
pub fn call_pipeline<S, C>() -> (Pipeline<S, C>, CallPhases) {
    let phases = CallPhases {
        setup: Phase::new("Setup"),
        monitoring: Phase::new("Monitoring"),
        plugins: Phase::new("Plugins"),
        call: Phase::new("Call"),
        fallback: Phase::new("Fallback"),
    };
    let pipeline = Pipeline::new([
        phases.setup.clone(),
        phases.monitoring.clone(),
        phases.plugins.clone(),
        phases.call.clone(),
        phases.fallback.clone(),
    ]);
    (pipeline, phases)
}
