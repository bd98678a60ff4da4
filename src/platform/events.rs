//! Page-level event bus

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Notifications dispatched on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// The chart selection changed
    Selection { geoids: Vec<String> },
}

impl PageEvent {
    /// DOM-style event name
    pub fn name(&self) -> &'static str {
        match self {
            PageEvent::Selection { .. } => "chart:selection",
        }
    }
}

type Handler = Arc<dyn Fn(&PageEvent) + Send + Sync>;

/// Handle returned by `EventBus::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Synchronous publish/subscribe for page events
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<Vec<(SubscriptionId, Handler)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Handler)>> {
        self.handlers.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&PageEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(handler)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().retain(|(hid, _)| *hid != id);
    }

    /// Deliver `event` to every subscriber, outside the lock.
    pub fn dispatch(&self, event: &PageEvent) {
        let handlers: Vec<Handler> = self.lock().iter().map(|(_, f)| f.clone()).collect();
        log::debug!("dispatching {} to {} subscribers", event.name(), handlers.len());
        for handler in handlers {
            handler(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_receive_until_unsubscribed() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        let id = bus.subscribe(move |e| s.lock().unwrap().push(e.clone()));

        let ev = PageEvent::Selection { geoids: vec!["1".into()] };
        bus.dispatch(&ev);
        bus.unsubscribe(id);
        bus.dispatch(&ev);

        assert_eq!(*seen.lock().unwrap(), vec![ev]);
        assert_eq!(seen.lock().unwrap()[0].name(), "chart:selection");
    }

    #[test]
    fn poisoned_registry_still_delivers() {
        let bus = Arc::new(EventBus::new());
        let poisoner = bus.clone();
        let _ = std::thread::spawn(move || {
            let _held = poisoner.handlers.lock().unwrap();
            panic!("poison the handler list");
        })
        .join();
        assert!(bus.handlers.is_poisoned());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = seen.clone();
        bus.subscribe(move |e| s.lock().unwrap().push(e.clone()));
        bus.dispatch(&PageEvent::Selection { geoids: vec![] });
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
