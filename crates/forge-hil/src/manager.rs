//! The pause-point manager

use crate::context::{HilAction, HilContext, HilResponse};
use crate::handler::HilHandler;
use std::sync::Arc;
use tracing::{info, warn};

/// How one pause point resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseState {
    /// A handler supplied the decision
    Completed,

    /// Non-interactive mode synthesized an APPROVE
    AutoApproved,

    /// Invalid action or handler failure forced an ABORT
    Aborted,
}

/// One audited (context, response) pair
#[derive(Debug, Clone)]
pub struct HilExchange {
    /// The context presented at the pause
    pub context: HilContext,

    /// The effective response, after gating
    pub response: HilResponse,

    /// How the pause resolved
    pub state: PauseState,
}

/// Pauses the pipeline and applies human decisions
///
/// One manager serves one run: its history is the run's audit log and is
/// cleared explicitly between runs.
pub struct HilManager {
    handler: Option<Arc<dyn HilHandler>>,
    interactive: bool,
    history: Vec<HilExchange>,
}

impl HilManager {
    /// Create a manager with the given handler
    pub fn new(handler: Arc<dyn HilHandler>, interactive: bool) -> Self {
        Self {
            handler: Some(handler),
            interactive,
            history: Vec::new(),
        }
    }

    /// Create a non-interactive manager that approves every pause
    pub fn non_interactive() -> Self {
        Self {
            handler: None,
            interactive: false,
            history: Vec::new(),
        }
    }

    /// Whether this manager will actually consult a handler
    pub fn is_interactive(&self) -> bool {
        self.interactive && self.handler.is_some()
    }

    /// Pause at a checkpoint and obtain the effective response
    ///
    /// Never fails. Non-interactive managers synthesize APPROVE without
    /// invoking any handler. Interactive managers await the handler, then
    /// gate the result: an action not offered by the context, or a handler
    /// error, resolves to ABORT rather than silently substituting an
    /// allowed action. Every exchange is recorded.
    pub async fn pause(&mut self, context: HilContext) -> HilResponse {
        let (response, state) = match (&self.handler, self.interactive) {
            (Some(handler), true) => match handler.handle(&context).await {
                Ok(response) => {
                    if context.allows(response.action) {
                        (response, PauseState::Completed)
                    } else {
                        warn!(
                            phase = %context.phase,
                            action = %response.action,
                            "Action not available at this pause point; aborting"
                        );
                        (
                            HilResponse::abort(format!(
                                "action '{}' is not available at this pause point",
                                response.action
                            )),
                            PauseState::Aborted,
                        )
                    }
                }
                Err(e) => {
                    warn!(phase = %context.phase, "Review handler failed: {}; aborting", e);
                    (
                        HilResponse::abort(format!("review handler failed: {}", e)),
                        PauseState::Aborted,
                    )
                }
            },
            _ => (HilResponse::approve(), PauseState::AutoApproved),
        };

        info!(
            phase = %context.phase,
            agent = %context.agent,
            pre_execution = context.pre_execution,
            action = %response.action,
            "Pause point resolved"
        );

        self.history.push(HilExchange {
            context,
            response: response.clone(),
            state,
        });

        response
    }

    /// The run's audit log, in pause order
    pub fn history(&self) -> &[HilExchange] {
        &self.history
    }

    /// Clear the audit log between runs
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
