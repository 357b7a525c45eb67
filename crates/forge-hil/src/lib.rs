//! Forge HIL (Human-in-the-Loop)
//!
//! Pauses pipeline execution at defined checkpoints, presents state to a
//! human, and applies the human's decision.
//!
//! # Protocol
//!
//! The pipeline builds a fresh [`HilContext`] at each pause point and calls
//! [`HilManager::pause`]. Non-interactive runs synthesize an APPROVE
//! immediately. Interactive runs await the registered [`HilHandler`] and
//! then *gate* the response: an action outside the context's
//! `available_actions`, or a handler failure, resolves to ABORT - the
//! safest outcome - rather than propagating an undefined state.
//!
//! Every (context, response) pair lands in an order-preserving history for
//! audit; history lives for the run and is cleared explicitly between runs.
//!
//! # Handlers
//!
//! The core only ever calls the [`HilHandler`] capability interface.
//! Presentation layers supply implementations: async ones directly,
//! synchronous ones through [`SyncHandler`]; [`AutoApprove`] covers
//! non-interactive use.

#![warn(missing_docs)]

mod context;
mod handler;
mod manager;

pub use context::{HilAction, HilContext, HilResponse};
pub use handler::{AutoApprove, HilHandler, SyncHandler};
pub use manager::{HilExchange, HilManager, PauseState};

use thiserror::Error;

/// Errors a handler can surface while producing a response
///
/// The manager never propagates these to the pipeline; they resolve to an
/// ABORT response and an audit entry.
#[derive(Error, Debug)]
pub enum HilError {
    /// The handler could not obtain a decision
    #[error("Handler failed: {0}")]
    Handler(String),

    /// The presentation layer went away mid-pause
    #[error("Review channel closed: {0}")]
    ChannelClosed(String),
}
