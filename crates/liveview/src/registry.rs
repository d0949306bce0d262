use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use crate::channel::Channel;
use crate::view::{View, ViewKey};

/// Tunables for abandoned-channel collection.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Minimum time between garbage-collection sweeps.
    pub gc_interval: Duration,
    /// Age past which a channel that never saw a subscribe is evicted.
    pub abandon_after: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            gc_interval: Duration::from_secs(30),
            abandon_after: Duration::from_secs(30),
        }
    }
}

/// Channel bookkeeping: one channel per registered view, indexed both ways.
///
/// Both indexes live behind a single lock and are only ever mutated
/// together, so they cannot be observed out of sync.
pub(crate) struct Registry {
    config: RegistryConfig,
    inner: RwLock<Indexes>,
}

struct Indexes {
    by_id: HashMap<String, Arc<Channel>>,
    by_view: HashMap<ViewKey, Arc<Channel>>,
    last_gc: Instant,
}

impl Registry {
    pub(crate) fn new(config: RegistryConfig) -> Self {
        Registry {
            config,
            inner: RwLock::new(Indexes {
                by_id: HashMap::new(),
                by_view: HashMap::new(),
                last_gc: Instant::now(),
            }),
        }
    }

    /// Create channels for any of `views` that do not have one yet.
    ///
    /// Registering an already-registered view leaves its channel untouched.
    /// Channels whose browser never subscribed are swept out here once they
    /// pass the abandon threshold; the sweep and the inserts share one
    /// write-critical section, so a concurrent register cannot race it.
    pub(crate) fn register(&self, views: Vec<Arc<dyn View>>) {
        let mut inner = self.inner.write();
        self.maybe_collect(&mut inner);
        for view in views {
            Self::ensure_locked(&mut inner, view);
        }
    }

    /// Look up the channel for `view`, creating one if it has none yet.
    pub(crate) fn ensure(&self, view: Arc<dyn View>) -> Arc<Channel> {
        let mut inner = self.inner.write();
        self.maybe_collect(&mut inner);
        Self::ensure_locked(&mut inner, view)
    }

    fn ensure_locked(inner: &mut Indexes, view: Arc<dyn View>) -> Arc<Channel> {
        let key = ViewKey::of(view.as_ref());
        if let Some(channel) = inner.by_view.get(&key) {
            return Arc::clone(channel);
        }
        let channel = Arc::new(Channel::new(view));
        debug!(channel_id = %channel.id(), "channel registered");
        inner
            .by_id
            .insert(channel.id().to_string(), Arc::clone(&channel));
        inner.by_view.insert(key, Arc::clone(&channel));
        channel
    }

    fn maybe_collect(&self, inner: &mut Indexes) {
        if inner.last_gc.elapsed() < self.config.gc_interval {
            return;
        }
        let abandon_after = self.config.abandon_after;
        let mut evicted: Vec<Arc<Channel>> = Vec::new();
        inner.by_id.retain(|_, channel| {
            if !channel.is_bound() && channel.age() >= abandon_after {
                evicted.push(Arc::clone(channel));
                false
            } else {
                true
            }
        });
        for channel in &evicted {
            inner.by_view.remove(&ViewKey::of(channel.view().as_ref()));
            debug!(channel_id = %channel.id(), "abandoned channel evicted");
        }
        inner.last_gc = Instant::now();
    }

    pub(crate) fn channel_for_view(&self, view: &dyn View) -> Option<Arc<Channel>> {
        self.inner.read().by_view.get(&ViewKey::of(view)).cloned()
    }

    pub(crate) fn channel_by_id(&self, id: &str) -> Option<Arc<Channel>> {
        self.inner.read().by_id.get(id).cloned()
    }

    /// Drop a channel from both indexes. Called when a bound channel's
    /// connection has torn down.
    pub(crate) fn remove(&self, channel: &Channel) {
        let mut inner = self.inner.write();
        inner.by_id.remove(channel.id());
        inner.by_view.remove(&ViewKey::of(channel.view().as_ref()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Event;
    use async_trait::async_trait;
    use std::fmt;

    struct Probe {
        label: &'static str,
    }

    #[async_trait]
    impl View for Probe {
        fn render(&self, out: &mut dyn fmt::Write) -> fmt::Result {
            write!(out, "<p>{}</p>", self.label)
        }

        async fn handle_event(&self, _event: Event) {}
    }

    fn probe(label: &'static str) -> Arc<dyn View> {
        Arc::new(Probe { label })
    }

    #[test]
    fn register_is_idempotent_per_view() {
        let registry = Registry::new(RegistryConfig::default());
        let view = probe("a");

        registry.register(vec![Arc::clone(&view)]);
        let first = registry
            .channel_for_view(view.as_ref())
            .expect("registered");
        registry.register(vec![Arc::clone(&view)]);
        let second = registry
            .channel_for_view(view.as_ref())
            .expect("still registered");

        assert_eq!(first.id(), second.id());
    }

    #[test]
    fn indexes_agree_for_every_channel() {
        let registry = Registry::new(RegistryConfig::default());
        let a = probe("a");
        let b = probe("b");
        registry.register(vec![Arc::clone(&a), Arc::clone(&b)]);

        for view in [&a, &b] {
            let by_view = registry
                .channel_for_view(view.as_ref())
                .expect("channel for view");
            let by_id = registry
                .channel_by_id(by_view.id())
                .expect("channel by id");
            assert_eq!(by_view.id(), by_id.id());
        }
    }

    #[test]
    fn remove_clears_both_indexes() {
        let registry = Registry::new(RegistryConfig::default());
        let view = probe("a");
        registry.register(vec![Arc::clone(&view)]);
        let channel = registry
            .channel_for_view(view.as_ref())
            .expect("registered");

        registry.remove(&channel);

        assert!(registry.channel_for_view(view.as_ref()).is_none());
        assert!(registry.channel_by_id(channel.id()).is_none());
    }

    #[test]
    fn sweep_evicts_aged_unbound_channels() {
        let registry = Registry::new(RegistryConfig {
            gc_interval: Duration::ZERO,
            abandon_after: Duration::from_millis(20),
        });
        let stale = probe("stale");
        registry.register(vec![Arc::clone(&stale)]);
        let stale_id = registry
            .channel_for_view(stale.as_ref())
            .expect("registered")
            .id()
            .to_string();

        std::thread::sleep(Duration::from_millis(40));

        let fresh = probe("fresh");
        registry.register(vec![Arc::clone(&fresh)]);

        assert!(registry.channel_by_id(&stale_id).is_none());
        assert!(registry.channel_for_view(stale.as_ref()).is_none());
        assert!(registry.channel_for_view(fresh.as_ref()).is_some());
    }

    #[test]
    fn sweep_spares_young_channels() {
        let registry = Registry::new(RegistryConfig {
            gc_interval: Duration::ZERO,
            abandon_after: Duration::from_secs(30),
        });
        let young = probe("young");
        registry.register(vec![Arc::clone(&young)]);

        registry.register(vec![probe("other")]);

        assert!(registry.channel_for_view(young.as_ref()).is_some());
    }

    #[test]
    fn no_sweep_runs_before_the_gc_interval() {
        let registry = Registry::new(RegistryConfig {
            gc_interval: Duration::from_secs(3600),
            abandon_after: Duration::ZERO,
        });
        let view = probe("a");
        registry.register(vec![Arc::clone(&view)]);

        std::thread::sleep(Duration::from_millis(10));
        registry.register(vec![probe("other")]);

        assert!(registry.channel_for_view(view.as_ref()).is_some());
    }
}
