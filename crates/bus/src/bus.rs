use crate::error::{BusError, BusResult};
use crate::event::{BusEvent, EventHandler, HandlerResult};
use dashmap::DashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// Default bound on how long `stop` waits for the queue to drain
const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

enum Command<E> {
    Publish(E),
    Shutdown,
}

/// The dispatch worker, either parked (holding the queue receiver) or
/// running (the task returns the receiver when it exits, so the bus can be
/// restarted).
enum Worker<E: BusEvent> {
    Idle(mpsc::UnboundedReceiver<Command<E>>),
    Running(JoinHandle<mpsc::UnboundedReceiver<Command<E>>>),
}

/// Asynchronous publish/subscribe event bus
///
/// Cloning is cheap and yields another handle onto the same bus, so a
/// producer (the clock engine) and the host can each hold one.
///
/// Delivery model: a single worker task drains the queue in FIFO order and
/// invokes the topic's handlers sequentially, in registration order. Events
/// published while the bus is stopped stay queued until the next `start`.
#[derive(Clone)]
pub struct EventBus<E: BusEvent> {
    handlers: Arc<DashMap<E::Topic, Vec<EventHandler<E>>>>,
    tx: mpsc::UnboundedSender<Command<E>>,
    worker: Arc<Mutex<Option<Worker<E>>>>,
    drain_timeout: Duration,
}

impl<E: BusEvent> EventBus<E> {
    /// Create a stopped bus with an empty handler registry
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            handlers: Arc::new(DashMap::new()),
            tx,
            worker: Arc::new(Mutex::new(Some(Worker::Idle(rx)))),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// Override the bounded wait used by [`stop`](EventBus::stop)
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Register a handler for `topic`
    ///
    /// No uniqueness constraint: registering the same handler twice invokes
    /// it once per registration. Insertion order defines delivery order
    /// within the topic.
    pub fn register<F>(&self, topic: E::Topic, handler: F)
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        self.handlers
            .entry(topic)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Number of handlers registered for `topic`
    pub fn handler_count(&self, topic: &E::Topic) -> usize {
        self.handlers.get(topic).map_or(0, |entry| entry.len())
    }

    /// Enqueue an event for asynchronous delivery; never blocks on handler
    /// execution
    pub fn publish(&self, event: E) -> BusResult<()> {
        self.tx
            .send(Command::Publish(event))
            .map_err(|_| BusError::Closed)
    }

    /// Spawn the dispatch worker
    pub async fn start(&self) -> BusResult<()> {
        let mut worker = self.worker.lock().await;
        match worker.take() {
            Some(Worker::Idle(rx)) => {
                let handlers = self.handlers.clone();
                *worker = Some(Worker::Running(tokio::spawn(Self::run_dispatch(
                    rx, handlers,
                ))));
                Ok(())
            }
            Some(running @ Worker::Running(_)) => {
                *worker = Some(running);
                Err(BusError::AlreadyRunning)
            }
            None => Err(BusError::Closed),
        }
    }

    /// Halt the dispatch worker after draining everything already enqueued
    ///
    /// Returns once all events published before this call have been handed
    /// to their subscribers, bounded by the drain timeout. The bus can be
    /// started again afterwards.
    pub async fn stop(&self) -> BusResult<()> {
        let mut worker = self.worker.lock().await;
        match worker.take() {
            Some(Worker::Running(handle)) => {
                // The shutdown marker queues behind pending events, so the
                // worker exits only after the backlog is delivered.
                if self.tx.send(Command::Shutdown).is_err() {
                    return Err(BusError::Closed);
                }
                match tokio::time::timeout(self.drain_timeout, handle).await {
                    Ok(Ok(rx)) => {
                        *worker = Some(Worker::Idle(rx));
                        Ok(())
                    }
                    Ok(Err(join_err)) => Err(BusError::WorkerFailed(join_err.to_string())),
                    Err(_) => Err(BusError::DrainTimeout(self.drain_timeout)),
                }
            }
            Some(idle @ Worker::Idle(_)) => {
                *worker = Some(idle);
                Err(BusError::NotRunning)
            }
            None => Err(BusError::Closed),
        }
    }

    /// Whether the dispatch worker is currently running
    pub async fn is_running(&self) -> bool {
        matches!(*self.worker.lock().await, Some(Worker::Running(_)))
    }

    async fn run_dispatch(
        mut rx: mpsc::UnboundedReceiver<Command<E>>,
        handlers: Arc<DashMap<E::Topic, Vec<EventHandler<E>>>>,
    ) -> mpsc::UnboundedReceiver<Command<E>> {
        log::debug!("Event bus dispatch loop started");
        while let Some(command) = rx.recv().await {
            match command {
                Command::Publish(event) => Self::dispatch(&handlers, &event),
                Command::Shutdown => break,
            }
        }
        log::debug!("Event bus dispatch loop stopped");
        rx
    }

    fn dispatch(handlers: &DashMap<E::Topic, Vec<EventHandler<E>>>, event: &E) {
        // Snapshot the handler list so subscribers may register from inside
        // a callback without deadlocking the registry.
        let subscribers: Vec<EventHandler<E>> = match handlers.get(&event.topic()) {
            Some(entry) => entry.value().clone(),
            None => return,
        };

        for (index, handler) in subscribers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    log::error!("Event handler #{index} failed: {err}");
                }
                Err(_) => {
                    log::error!("Event handler #{index} panicked; continuing delivery");
                }
            }
        }
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Minimal bus event for unit tests: routed by an integer topic.
    #[derive(Debug, Clone, PartialEq)]
    struct TestEvent {
        topic: u8,
        seq: usize,
    }

    impl BusEvent for TestEvent {
        type Topic = u8;

        fn topic(&self) -> u8 {
            self.topic
        }
    }

    #[tokio::test]
    async fn test_stop_drains_every_published_event() {
        let bus: EventBus<TestEvent> = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let seen = count.clone();
        bus.register(1, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.start().await.unwrap();
        for seq in 0..100 {
            bus.publish(TestEvent { topic: 1, seq }).unwrap();
        }
        bus.stop().await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 100);
    }

    #[tokio::test]
    async fn test_delivery_preserves_publish_order() {
        let bus: EventBus<TestEvent> = EventBus::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));

        let log = seen.clone();
        bus.register(1, move |event: &TestEvent| {
            log.lock().unwrap().push(event.seq);
            Ok(())
        });

        bus.start().await.unwrap();
        for seq in 0..50 {
            bus.publish(TestEvent { topic: 1, seq }).unwrap();
        }
        bus.stop().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), (0..50).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_handlers_fire_in_registration_order() {
        let bus: EventBus<TestEvent> = EventBus::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let log = seen.clone();
            bus.register(1, move |_| {
                log.lock().unwrap().push(tag);
                Ok(())
            });
        }

        bus.start().await.unwrap();
        bus.publish(TestEvent { topic: 1, seq: 0 }).unwrap();
        bus.stop().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_duplicate_registration_delivers_once_per_registration() {
        let bus: EventBus<TestEvent> = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let seen = count.clone();
            bus.register(1, move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        assert_eq!(bus.handler_count(&1), 2);

        bus.start().await.unwrap();
        bus.publish(TestEvent { topic: 1, seq: 0 }).unwrap();
        bus.stop().await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_events_route_by_topic() {
        let bus: EventBus<TestEvent> = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let seen = count.clone();
        bus.register(1, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.start().await.unwrap();
        bus.publish(TestEvent { topic: 2, seq: 0 }).unwrap();
        bus.publish(TestEvent { topic: 1, seq: 1 }).unwrap();
        bus.stop().await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_block_later_handlers() {
        let bus: EventBus<TestEvent> = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        bus.register(1, |_| Err("subscriber exploded".into()));
        let seen = count.clone();
        bus.register(1, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.start().await.unwrap();
        bus.publish(TestEvent { topic: 1, seq: 0 }).unwrap();
        bus.stop().await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_handler_does_not_kill_the_worker() {
        let bus: EventBus<TestEvent> = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        bus.register(1, |_| panic!("subscriber bug"));
        let seen = count.clone();
        bus.register(1, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.start().await.unwrap();
        bus.publish(TestEvent { topic: 1, seq: 0 }).unwrap();
        bus.publish(TestEvent { topic: 1, seq: 1 }).unwrap();
        bus.stop().await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_events_published_while_stopped_are_queued_not_dropped() {
        let bus: EventBus<TestEvent> = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let seen = count.clone();
        bus.register(1, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        // Published before start: queued
        bus.publish(TestEvent { topic: 1, seq: 0 }).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);

        bus.start().await.unwrap();
        bus.stop().await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bus_restarts_after_stop() {
        let bus: EventBus<TestEvent> = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let seen = count.clone();
        bus.register(1, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.start().await.unwrap();
        bus.publish(TestEvent { topic: 1, seq: 0 }).unwrap();
        bus.stop().await.unwrap();

        bus.publish(TestEvent { topic: 1, seq: 1 }).unwrap();
        bus.start().await.unwrap();
        bus.stop().await.unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_lifecycle_misuse_is_rejected() {
        let bus: EventBus<TestEvent> = EventBus::new();

        assert_eq!(bus.stop().await, Err(BusError::NotRunning));
        bus.start().await.unwrap();
        assert_eq!(bus.start().await, Err(BusError::AlreadyRunning));
        assert!(bus.is_running().await);
        bus.stop().await.unwrap();
        assert!(!bus.is_running().await);
    }
}
