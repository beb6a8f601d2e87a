//! Reusable suspension slot.
//!
//! A [`Suspension`] parks at most one operation at a time and hands it a
//! resume exactly once. The slot is reusable: after a delivery it returns
//! to idle and the next [`suspend`](Suspension::suspend) can park again.
//! The byte channel uses one slot per direction to implement backpressure.

use crate::base::error::PipeError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll, Waker};

enum SlotState {
    /// No one waiting, nothing deposited.
    Idle,
    /// One operation parked, waiting for a resume.
    Suspended(Waker),
    /// A resume arrived before anyone parked; consumed by the next
    /// `suspend`.
    Resumed(Result<(), PipeError>),
    /// Terminal. Every wait, pending or future, completes immediately.
    Closed(Option<PipeError>),
}

/// A single-occupancy, reusable wait slot.
pub struct Suspension {
    state: Mutex<SlotState>,
}

impl Suspension {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Idle),
        }
    }

    /// Wait until resumed.
    ///
    /// Completes immediately when a resume was already deposited
    /// (pre-resumed) or the slot is closed. A second `suspend` while one
    /// is already parked resolves to [`PipeError::SlotOccupied`] without
    /// disturbing the parked waiter.
    ///
    /// Dropping the returned future while parked returns the slot to
    /// idle, so task cancellation leaves no stray waker behind.
    pub fn suspend(&self) -> Suspend<'_> {
        Suspend {
            slot: self,
            parked: false,
        }
    }

    /// Wake the parked operation, or deposit a resume for the next
    /// `suspend`.
    pub fn resume(&self) {
        self.complete(Ok(()));
    }

    /// Wake the parked operation with `cause`, or deposit it for the next
    /// `suspend`.
    pub fn resume_with_error(&self, cause: PipeError) {
        self.complete(Err(cause));
    }

    /// Close the slot, tearing down any pending wait.
    ///
    /// A parked waiter is resumed with `cause` if `Some`, normally
    /// otherwise; the same applies to every later `suspend`. The first
    /// close wins.
    pub fn close(&self, cause: Option<PipeError>) {
        let waker = {
            let mut state = self.state.lock().unwrap();
            if matches!(*state, SlotState::Closed(_)) {
                return;
            }
            match std::mem::replace(&mut *state, SlotState::Closed(cause)) {
                SlotState::Suspended(waker) => Some(waker),
                _ => None,
            }
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    fn complete(&self, result: Result<(), PipeError>) {
        let waker = {
            let mut state = self.state.lock().unwrap();
            // First undelivered deposit wins; closed slots stay closed.
            if matches!(*state, SlotState::Closed(_) | SlotState::Resumed(_)) {
                return;
            }
            match std::mem::replace(&mut *state, SlotState::Resumed(result)) {
                SlotState::Suspended(waker) => Some(waker),
                _ => None,
            }
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

impl Default for Suspension {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Suspension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        let name = match &*state {
            SlotState::Idle => "idle",
            SlotState::Suspended(_) => "suspended",
            SlotState::Resumed(_) => "pre-resumed",
            SlotState::Closed(_) => "closed",
        };
        f.debug_struct("Suspension").field("state", &name).finish()
    }
}

/// Future returned by [`Suspension::suspend`].
pub struct Suspend<'a> {
    slot: &'a Suspension,
    parked: bool,
}

impl Future for Suspend<'_> {
    type Output = Result<(), PipeError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut state = this.slot.state.lock().unwrap();
        match &mut *state {
            SlotState::Closed(cause) => {
                this.parked = false;
                return match cause {
                    Some(cause) => Poll::Ready(Err(cause.clone())),
                    None => Poll::Ready(Ok(())),
                };
            }
            SlotState::Suspended(waker) => {
                return if this.parked {
                    // Re-poll of the parked waiter: refresh the waker.
                    *waker = cx.waker().clone();
                    Poll::Pending
                } else {
                    // Someone else is parked here; reject the double park.
                    Poll::Ready(Err(PipeError::SlotOccupied))
                };
            }
            SlotState::Idle | SlotState::Resumed(_) => {}
        }
        match std::mem::replace(&mut *state, SlotState::Idle) {
            SlotState::Resumed(result) => {
                this.parked = false;
                Poll::Ready(result)
            }
            SlotState::Idle => {
                *state = SlotState::Suspended(cx.waker().clone());
                this.parked = true;
                Poll::Pending
            }
            _ => unreachable!(),
        }
    }
}

impl Drop for Suspend<'_> {
    fn drop(&mut self) {
        if !self.parked {
            return;
        }
        let mut state = self.slot.state.lock().unwrap();
        if matches!(*state, SlotState::Suspended(_)) {
            *state = SlotState::Idle;
        }
    }
}
