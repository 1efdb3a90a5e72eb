use std::sync::Arc;

use tracing::warn;

use super::Policy;
use crate::ActionExecutor;
use crate::ChangeEvent;
use crate::EventHandler;
use crate::Result;

/// Bridges the dispatcher to a policy: evaluates the event, then executes
/// every decision of the resulting plan.
pub struct PolicyHandler<P: Policy> {
    policy: Arc<P>,
    executor: Arc<ActionExecutor>,
}

impl<P: Policy> PolicyHandler<P> {
    pub fn new(
        policy: Arc<P>,
        executor: Arc<ActionExecutor>,
    ) -> Self {
        Self { policy, executor }
    }
}

#[async_trait::async_trait]
impl<P: Policy> EventHandler for PolicyHandler<P> {
    /// Every decision is attempted even when an earlier one fails; the first
    /// failure is returned.
    async fn handle(
        &self,
        event: &ChangeEvent,
    ) -> Result<()> {
        let plan = self.policy.evaluate(event);
        let mut first_error = None;
        for remediation in plan.into_vec() {
            if let Err(e) = self.executor.execute(&remediation).await {
                warn!("{} failed: {}", remediation, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
