use std::sync::Arc;

use crate::bus::{EventBus, HandlerResult};
use crate::event::Event;

/// A projection builds a read model from published events.
///
/// Projections implement the **CQRS read model pattern**: they turn the write
/// side's notifications into queryable state that lives entirely in the read
/// side. They never write back to the source of truth.
///
/// ## Delivery
///
/// The bus is at-most-once and unordered across identifiers, so `apply` must
/// tolerate duplicates (re-applying a snapshot is harmless) and gaps (an update
/// for an entry never seen is dropped, not an error).
///
/// ## Concurrency
///
/// `apply` runs on bus tasks, concurrently with other `apply` calls and with
/// queries. Implementations guard their state themselves and must not hold a
/// guard across anything that publishes back into the bus.
///
/// ## Errors
///
/// A returned error is logged by the bus and otherwise ignored; it can never
/// reach the mutation that produced the event.
pub trait Projection<E: Event>: Send + Sync + 'static {
    /// Name used in log lines.
    fn name(&self) -> &'static str;

    /// Event kinds this projection consumes. One bus handler is registered per kind.
    fn kinds(&self) -> &'static [E::Kind];

    fn apply(&self, event: &E) -> HandlerResult;
}

impl<E: Event> EventBus<E> {
    /// Subscribes `projection` to every kind it declares, one handler per kind.
    ///
    /// All subscriptions are in place when this returns.
    pub fn attach<P>(&self, projection: &Arc<P>)
    where
        P: Projection<E>,
    {
        for kind in projection.kinds() {
            let target = Arc::clone(projection);
            self.subscribe(*kind, move |event: E| target.apply(&event));
        }
        tracing::debug!(
            projection = projection.name(),
            kinds = projection.kinds().len(),
            "projection attached"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use blogsync_core::PostId;

    use super::*;
    use crate::event::{EventKind, PostEvent};

    #[derive(Default)]
    struct DeletionLog {
        seen: Mutex<Vec<PostId>>,
    }

    impl Projection<PostEvent> for DeletionLog {
        fn name(&self) -> &'static str {
            "test.deletions"
        }

        fn kinds(&self) -> &'static [EventKind] {
            &[EventKind::Deleted]
        }

        fn apply(&self, event: &PostEvent) -> HandlerResult {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(event.post_id());
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn attach_subscribes_declared_kinds_only() {
        let bus = EventBus::<PostEvent>::new();
        let log = Arc::new(DeletionLog::default());
        bus.attach(&log);

        assert_eq!(bus.handler_count(EventKind::Deleted), 1);
        assert_eq!(bus.handler_count(EventKind::Created), 0);

        let id = PostId::new();
        bus.publish(PostEvent::Deleted(id));
        bus.quiesce().await;

        assert_eq!(*log.seen.lock().unwrap(), vec![id]);
    }
}
