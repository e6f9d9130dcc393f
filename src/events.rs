//! Observer lists used for every outward-facing notification.
//!
//! Each emitting component owns one [`Signal`] per notification kind.
//! Listeners live exactly as long as the signal that holds them: dropping
//! the component drops its listeners, and a listener can be detached
//! earlier with [`Signal::unsubscribe`] using the id returned at
//! subscription time.

use std::fmt;

/// Handle identifying one subscription on one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener<T> = Box<dyn FnMut(&T)>;

/// A list of listeners for a single notification kind.
pub struct Signal<T> {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener<T>)>,
}

impl<T> Signal<T> {
    /// Creates a signal with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    /// Registers `listener`; it is invoked on every subsequent [`emit`](Self::emit).
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&T) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns false if `id` was not subscribed here.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    /// Invokes every listener in subscription order.
    pub fn emit(&mut self, value: &T) {
        for (_, listener) in &mut self.listeners {
            listener(value);
        }
    }

    /// Drops all listeners.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Number of live listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// True if nothing is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn listeners_fire_in_subscription_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut signal = Signal::new();
        let a = Rc::clone(&seen);
        signal.subscribe(move |v: &u32| a.borrow_mut().push(("a", *v)));
        let b = Rc::clone(&seen);
        signal.subscribe(move |v: &u32| b.borrow_mut().push(("b", *v)));

        signal.emit(&7);
        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let count = Rc::new(RefCell::new(0));
        let mut signal = Signal::<()>::new();
        let c = Rc::clone(&count);
        let id = signal.subscribe(move |_| *c.borrow_mut() += 1);

        signal.emit(&());
        assert!(signal.unsubscribe(id));
        assert!(!signal.unsubscribe(id));
        signal.emit(&());

        assert_eq!(*count.borrow(), 1);
        assert!(signal.is_empty());
    }
}
