use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    core::Config,
    events::Bus,
    executors::DeadlineExecutor,
    subscribers::{Subscribe, SubscriberSet},
    work::Work,
};
use super::trigger::{Shared, Trigger};

/// Builder for constructing a [`Trigger`] with optional features.
pub struct TriggerBuilder<E, W> {
    executor: E,
    work: W,
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<E: DeadlineExecutor, W: Work> TriggerBuilder<E, W> {
    /// Creates a new builder with the default configuration.
    pub fn new(executor: E, work: W) -> Self {
        Self {
            executor,
            work,
            cfg: Config::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the whole configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the trigger name used in events and logs.
    pub fn with_name(mut self, name: impl Into<std::borrow::Cow<'static, str>>) -> Self {
        self.cfg.name = name.into();
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive trigger events through dedicated workers with
    /// bounded queues. With at least one subscriber, [`build`](Self::build)
    /// must run inside a tokio runtime.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the trigger.
    ///
    /// Initializes the event bus and, when subscribers were given, spawns the
    /// subscriber workers plus a listener that forwards bus events to them.
    /// The listener stops when the last trigger handle and dispatch are gone.
    pub fn build(self) -> Trigger<E, W> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let stop = CancellationToken::new();

        if !self.subscribers.is_empty() {
            let rx = bus.subscribe();
            let subs = SubscriberSet::new(self.subscribers, bus.clone());
            let _listener = subs.spawn_listener(rx, stop.clone());
        }

        let name: Arc<str> = Arc::from(self.cfg.name.as_ref());
        Trigger::from_shared(Arc::new(Shared::new(
            self.executor,
            self.work,
            name,
            bus,
            stop,
        )))
    }
}
