//! Handler capability interface and adapters

use crate::context::{HilContext, HilResponse};
use crate::HilError;
use async_trait::async_trait;

/// The capability interface the pipeline calls at every pause point
///
/// Implementations may be fully asynchronous (a GUI bridge awaiting user
/// input) or wrap synchronous code via [`SyncHandler`]. The core never
/// branches on sync-vs-async itself.
#[async_trait]
pub trait HilHandler: Send + Sync {
    /// Produce a decision for the given pause context
    async fn handle(&self, context: &HilContext) -> Result<HilResponse, HilError>;
}

/// Handler that approves everything without looking
///
/// The non-interactive default; also useful in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl HilHandler for AutoApprove {
    async fn handle(&self, _context: &HilContext) -> Result<HilResponse, HilError> {
        Ok(HilResponse::approve())
    }
}

/// Adapter turning a synchronous closure into a [`HilHandler`]
///
/// For presentation layers that block on user input (console prompts,
/// simple dialogs). The closure runs inline on the async task - acceptable
/// because the pipeline is already suspended waiting for the human.
///
/// # Examples
///
/// ```
/// use forge_hil::{HilResponse, SyncHandler};
///
/// let handler = SyncHandler::new(|_context| Ok(HilResponse::approve()));
/// # let _ = handler;
/// ```
pub struct SyncHandler<F>
where
    F: Fn(&HilContext) -> Result<HilResponse, HilError> + Send + Sync,
{
    inner: F,
}

impl<F> SyncHandler<F>
where
    F: Fn(&HilContext) -> Result<HilResponse, HilError> + Send + Sync,
{
    /// Wrap a synchronous decision function
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<F> HilHandler for SyncHandler<F>
where
    F: Fn(&HilContext) -> Result<HilResponse, HilError> + Send + Sync,
{
    async fn handle(&self, context: &HilContext) -> Result<HilResponse, HilError> {
        (self.inner)(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HilAction;

    #[tokio::test]
    async fn test_auto_approve() {
        let handler = AutoApprove;
        let context = HilContext::post_execution("entities", "sentinel");
        let response = handler.handle(&context).await.unwrap();
        assert_eq!(response.action, HilAction::Approve);
    }

    #[tokio::test]
    async fn test_sync_handler_adapts_closures() {
        let handler = SyncHandler::new(|context: &HilContext| {
            if context.phase == "entities" {
                Ok(HilResponse::action(HilAction::Skip))
            } else {
                Ok(HilResponse::approve())
            }
        });

        let entities = HilContext::post_execution("entities", "sentinel");
        let other = HilContext::post_execution("relationships", "sentinel");

        assert_eq!(handler.handle(&entities).await.unwrap().action, HilAction::Skip);
        assert_eq!(handler.handle(&other).await.unwrap().action, HilAction::Approve);
    }

    #[tokio::test]
    async fn test_sync_handler_propagates_errors() {
        let handler =
            SyncHandler::new(|_: &HilContext| Err(HilError::Handler("no terminal".to_string())));
        let context = HilContext::post_execution("entities", "sentinel");
        assert!(handler.handle(&context).await.is_err());
    }
}
