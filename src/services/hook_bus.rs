//! In-process `HookBus` implementation (spec §4.7): invokes every handler
//! registered for a hook point in registration order, short-circuiting on
//! the first `Block`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::ports::hook::{HookBus, HookContext, HookDecision, HookHandler, HookPoint};

#[derive(Default)]
pub struct InMemoryHookBus {
    handlers: HashMap<HookPoint, Vec<Arc<dyn HookHandler>>>,
}

impl InMemoryHookBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HookBus for InMemoryHookBus {
    fn register(&mut self, point: HookPoint, handler: Arc<dyn HookHandler>) {
        self.handlers.entry(point).or_default().push(handler);
    }

    async fn fire(&self, point: HookPoint, ctx: &HookContext) -> DomainResult<HookDecision> {
        let Some(handlers) = self.handlers.get(&point) else {
            return Ok(HookDecision::Proceed);
        };

        for handler in handlers {
            match handler.handle(point, ctx).await {
                Ok(HookDecision::Block(reason)) => {
                    tracing::warn!(handler = handler.name(), reason = %reason, "hook blocked phase");
                    return Ok(HookDecision::Block(reason));
                }
                Ok(HookDecision::Proceed) => {}
                Err(e) => {
                    tracing::warn!(handler = handler.name(), error = %e, "hook handler failed, continuing");
                }
            }
        }

        Ok(HookDecision::Proceed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHandler {
        name: &'static str,
        calls: Arc<AtomicUsize>,
        decision: HookDecision,
    }

    #[async_trait]
    impl HookHandler for CountingHandler {
        fn name(&self) -> &str {
            self.name
        }

        async fn handle(&self, _point: HookPoint, _ctx: &HookContext) -> DomainResult<HookDecision> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.decision.clone())
        }
    }

    #[tokio::test]
    async fn first_block_short_circuits_remaining_handlers() {
        let mut bus = InMemoryHookBus::new();
        let first_calls = Arc::new(AtomicUsize::new(0));
        let second_calls = Arc::new(AtomicUsize::new(0));

        bus.register(
            HookPoint::OnTickSync,
            Arc::new(CountingHandler { name: "first", calls: first_calls.clone(), decision: HookDecision::Block("nope".to_string()) }),
        );
        bus.register(
            HookPoint::OnTickSync,
            Arc::new(CountingHandler { name: "second", calls: second_calls.clone(), decision: HookDecision::Proceed }),
        );

        let decision = bus.fire(HookPoint::OnTickSync, &HookContext::new()).await.unwrap();
        assert_eq!(decision, HookDecision::Block("nope".to_string()));
        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_handlers_proceeds() {
        let bus = InMemoryHookBus::new();
        let decision = bus.fire(HookPoint::OnMissionComplete, &HookContext::new()).await.unwrap();
        assert_eq!(decision, HookDecision::Proceed);
    }
}
