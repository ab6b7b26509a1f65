//! Operation dispatcher
//!
//! A keyed table of boxed async handlers, drained sequentially from an
//! operation feed. One operation is handled to completion before the next
//! is taken, so handlers observe a consistent view of the engine state;
//! slow sub-work that must not block the feed is detached by the handler
//! itself.

use crate::core_platform::{OpKind, Operation};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;
use tracing::debug;

type BoxedHandler =
    Box<dyn Fn(Operation) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Routes operations to registered handlers by kind
#[derive(Default)]
pub struct OperationDispatcher {
    handlers: HashMap<OpKind, BoxedHandler>,
}

impl OperationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one operation kind
    ///
    /// Registering a second handler for the same kind replaces the first.
    pub fn set_handler<F, Fut>(&mut self, kind: OpKind, handler: F)
    where
        F: Fn(Operation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handlers.insert(kind, Box::new(move |op| Box::pin(handler(op))));
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handle one operation; kinds without a handler are dropped
    pub async fn dispatch(&self, operation: Operation) {
        let kind = operation.kind();
        match self.handlers.get(&kind) {
            Some(handler) => handler(operation).await,
            None => debug!(?kind, "no handler registered, dropping operation"),
        }
    }

    /// Drain the operation feed until every sender is dropped
    pub async fn run(&self, mut feed: mpsc::Receiver<Operation>) {
        while let Some(operation) = feed.recv().await {
            self.dispatch(operation).await;
        }
        debug!("operation feed closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_platform::RoomId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn room_op(id: &str) -> Operation {
        Operation::InvitedIntoRoom { room: RoomId::new(id) }
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_kind() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = OperationDispatcher::new();
        let counted = hits.clone();
        dispatcher.set_handler(OpKind::InvitedIntoRoom, move |_| {
            let counted = counted.clone();
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
            }
        });

        dispatcher.dispatch(room_op("r1")).await;
        dispatcher
            .dispatch(Operation::MessageReceived {
                message: crate::core_platform::ChatMessage {
                    group: crate::core_platform::GroupId::new("g"),
                    sender: crate::core_platform::ActorId::new("a"),
                    text: "hi".to_string(),
                },
            })
            .await;

        // The unregistered kind is dropped silently.
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = OperationDispatcher::new();
        dispatcher.set_handler(OpKind::InvitedIntoRoom, |_| async {
            panic!("replaced handler must not run");
        });
        let counted = hits.clone();
        dispatcher.set_handler(OpKind::InvitedIntoRoom, move |_| {
            let counted = counted.clone();
            async move {
                counted.fetch_add(1, Ordering::SeqCst);
            }
        });
        assert_eq!(dispatcher.len(), 1);

        dispatcher.dispatch(room_op("r1")).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_drains_feed_in_order() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut dispatcher = OperationDispatcher::new();
        let sink = seen.clone();
        dispatcher.set_handler(OpKind::InvitedIntoRoom, move |op| {
            let sink = sink.clone();
            async move {
                if let Operation::InvitedIntoRoom { room } = op {
                    sink.lock().unwrap().push(room.to_string());
                }
            }
        });

        let (tx, rx) = mpsc::channel(8);
        for id in ["r1", "r2", "r3"] {
            tx.send(room_op(id)).await.unwrap();
        }
        drop(tx);
        dispatcher.run(rx).await;

        assert_eq!(*seen.lock().unwrap(), vec!["r1", "r2", "r3"]);
    }
}
