//! Resolution listener plumbing

use crate::configuration::ResolvableDependencies;
use parking_lot::Mutex;
use std::sync::Arc;

/// Receives resolution lifecycle events for one configuration.
pub trait DependencyResolutionListener: Send + Sync {
    fn before_resolve(&self, _incoming: &ResolvableDependencies) {}

    fn after_resolve(&self, _incoming: &ResolvableDependencies) {}
}

struct BeforeResolveAdapter<F>(F);

impl<F> DependencyResolutionListener for BeforeResolveAdapter<F>
where
    F: Fn(&ResolvableDependencies) + Send + Sync,
{
    fn before_resolve(&self, incoming: &ResolvableDependencies) {
        (self.0)(incoming)
    }
}

struct AfterResolveAdapter<F>(F);

impl<F> DependencyResolutionListener for AfterResolveAdapter<F>
where
    F: Fn(&ResolvableDependencies) + Send + Sync,
{
    fn after_resolve(&self, incoming: &ResolvableDependencies) {
        (self.0)(incoming)
    }
}

/// Ordered broadcast over the registered resolution listeners of one
/// configuration.
#[derive(Default)]
pub struct ListenerBroadcast {
    listeners: Mutex<Vec<Arc<dyn DependencyResolutionListener>>>,
}

impl ListenerBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn DependencyResolutionListener>) {
        self.listeners.lock().push(listener);
    }

    pub fn add_before_resolve<F>(&self, action: F)
    where
        F: Fn(&ResolvableDependencies) + Send + Sync + 'static,
    {
        self.add_listener(Arc::new(BeforeResolveAdapter(action)));
    }

    pub fn add_after_resolve<F>(&self, action: F)
    where
        F: Fn(&ResolvableDependencies) + Send + Sync + 'static,
    {
        self.add_listener(Arc::new(AfterResolveAdapter(action)));
    }

    pub fn before_resolve(&self, incoming: &ResolvableDependencies) {
        // snapshot so listeners can register further listeners
        let listeners: Vec<_> = self.listeners.lock().clone();
        for listener in listeners {
            listener.before_resolve(incoming);
        }
    }

    pub fn after_resolve(&self, incoming: &ResolvableDependencies) {
        let listeners: Vec<_> = self.listeners.lock().clone();
        for listener in listeners {
            listener.after_resolve(incoming);
        }
    }
}

/// Creates listener broadcasts. Listeners registered globally are attached to
/// every broadcast created afterwards.
#[derive(Default)]
pub struct ListenerManager {
    global: Mutex<Vec<Arc<dyn DependencyResolutionListener>>>,
}

impl ListenerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_global_listener(&self, listener: Arc<dyn DependencyResolutionListener>) {
        self.global.lock().push(listener);
    }

    pub fn create_anonymous_broadcaster(&self) -> ListenerBroadcast {
        let broadcast = ListenerBroadcast::new();
        for listener in self.global.lock().iter() {
            broadcast.add_listener(Arc::clone(listener));
        }
        broadcast
    }
}
