//! Invalidation Task
//!
//! Background task that drives cache invalidation from the event bus.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::ResponseCache;
use crate::events::CacheEvent;

/// Spawns a background task that forwards bus events into the cache.
///
/// Each received event evicts or refreshes the scopes registered for it. A
/// lagged receiver logs the number of missed events and continues with the
/// next available one. The task ends when every bus handle is dropped.
///
/// # Arguments
/// * `cache` - Engine handle the events are applied to
/// * `events` - Receiver obtained from [`EventBus::subscribe`](crate::events::EventBus::subscribe)
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
pub fn spawn_invalidation_task<T>(
    cache: ResponseCache<T>,
    mut events: broadcast::Receiver<CacheEvent>,
) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting invalidation task");

        loop {
            match events.recv().await {
                Ok(event) => {
                    debug!("Received event: {:?}", event);
                    cache.invalidate(event).await;
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!("Invalidation task lagged, skipped {} events", missed);
                }
                Err(RecvError::Closed) => {
                    info!("Event bus closed, stopping invalidation task");
                    break;
                }
            }
        }
    })
}
