//! Observable state and the observer protocol.
//!
//! - [`Observer`] - anything that wants to hear about a change
//! - [`ObserverList`] - subscriptions keyed by widget, notified from a snapshot
//! - [`State`] - a value stored in a spark-signals `Signal` plus its observers
//!
//! Every mutation on [`State`] stores the new value first and notifies second,
//! so observers always read the updated payload.
//!
//! # Example
//!
//! ```ignore
//! let count = State::new(0);
//! tree.observe(counter_widget, &count);
//! count.add(1); // counter_widget repaints (or its component rebuilds)
//! assert_eq!(count.get(), 1);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::ops::{AddAssign, SubAssign};
use std::rc::Rc;

use spark_signals::{Signal, signal};

use crate::engine::WidgetId;

/// Receives change notifications.
pub trait Observer {
    fn on_notify(&self);
}

// =============================================================================
// OBSERVER LIST
// =============================================================================

/// Subscriptions of one observable value, at most one per widget.
#[derive(Default)]
pub struct ObserverList {
    entries: RefCell<Vec<(WidgetId, Rc<dyn Observer>)>>,
}

impl ObserverList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-subscribing the same widget replaces its observer.
    pub fn subscribe(&self, id: WidgetId, observer: Rc<dyn Observer>) {
        let mut entries = self.entries.borrow_mut();
        if let Some(entry) = entries.iter_mut().find(|(w, _)| *w == id) {
            entry.1 = observer;
        } else {
            entries.push((id, observer));
        }
    }

    pub fn unsubscribe(&self, id: WidgetId) {
        self.entries.borrow_mut().retain(|(w, _)| *w != id);
    }

    pub fn is_subscribed(&self, id: WidgetId) -> bool {
        self.entries.borrow().iter().any(|(w, _)| *w == id)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Walk a snapshot, skipping observers that unsubscribed meanwhile.
    pub fn notify(&self) {
        let snapshot: Vec<(WidgetId, Rc<dyn Observer>)> = self.entries.borrow().clone();
        for (id, observer) in snapshot {
            let live = self
                .entries
                .borrow()
                .iter()
                .any(|(w, o)| *w == id && Rc::ptr_eq(o, &observer));
            if live {
                observer.on_notify();
            }
        }
    }
}

impl fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverList")
            .field("len", &self.len())
            .finish()
    }
}

// =============================================================================
// STATE
// =============================================================================

struct StateInner<T: Clone + PartialEq + 'static> {
    value: Signal<T>,
    observers: Rc<ObserverList>,
}

/// Shared observable value. Clones share the same payload and observers.
pub struct State<T: Clone + PartialEq + 'static> {
    inner: Rc<StateInner<T>>,
}

impl<T: Clone + PartialEq + 'static> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> State<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(StateInner {
                value: signal(value),
                observers: Rc::new(ObserverList::new()),
            }),
        }
    }

    pub fn get(&self) -> T {
        self.inner.value.get()
    }

    /// Store and notify, even if the value is unchanged.
    pub fn set(&self, value: T) {
        self.inner.value.set(value);
        self.inner.observers.notify();
    }

    /// Mutate a copy of the payload in place, store it back, notify.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut value = self.get();
        f(&mut value);
        self.set(value);
    }

    pub fn subscribe(&self, id: WidgetId, observer: Rc<dyn Observer>) {
        self.inner.observers.subscribe(id, observer);
    }

    pub fn unsubscribe(&self, id: WidgetId) {
        self.inner.observers.unsubscribe(id);
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }

    pub fn observers(&self) -> &Rc<ObserverList> {
        &self.inner.observers
    }

    /// The underlying signal, for code that wants fine-grained reactivity
    /// instead of widget observers.
    pub fn signal(&self) -> &Signal<T> {
        &self.inner.value
    }
}

impl<T: Clone + PartialEq + AddAssign + 'static> State<T> {
    pub fn add(&self, rhs: T) {
        self.update(|v| *v += rhs);
    }
}

impl<T: Clone + PartialEq + SubAssign + 'static> State<T> {
    pub fn sub(&self, rhs: T) {
        self.update(|v| *v -= rhs);
    }
}

impl<T: Clone + PartialEq + fmt::Debug + 'static> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("value", &self.get())
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;
    use std::cell::Cell;

    struct Counter {
        hits: Rc<Cell<u32>>,
    }

    impl Observer for Counter {
        fn on_notify(&self) {
            self.hits.set(self.hits.get() + 1);
        }
    }

    /// Unsubscribes another widget the first time it is notified.
    struct Evictor {
        list: Rc<ObserverList>,
        victim: WidgetId,
    }

    impl Observer for Evictor {
        fn on_notify(&self) {
            self.list.unsubscribe(self.victim);
        }
    }

    fn setup() -> (Vec<WidgetId>, Rc<Cell<u32>>) {
        let mut map: SlotMap<WidgetId, ()> = SlotMap::with_key();
        let ids = (0..3).map(|_| map.insert(())).collect();
        (ids, Rc::new(Cell::new(0)))
    }

    #[test]
    fn test_mutators_store_then_notify() {
        let (ids, hits) = setup();
        let state = State::new(10);
        state.subscribe(ids[0], Rc::new(Counter { hits: hits.clone() }));

        state.add(5);
        assert_eq!(state.get(), 15);
        state.sub(3);
        assert_eq!(state.get(), 12);
        state.set(1);
        state.update(|v| *v *= 4);
        assert_eq!(state.get(), 4);
        assert_eq!(hits.get(), 4);
    }

    #[test]
    fn test_subscribe_is_idempotent() {
        let (ids, hits) = setup();
        let state = State::new(0);
        state.subscribe(ids[0], Rc::new(Counter { hits: hits.clone() }));
        state.subscribe(ids[0], Rc::new(Counter { hits: hits.clone() }));
        assert_eq!(state.observer_count(), 1);
        state.set(1);
        assert_eq!(hits.get(), 1);

        state.unsubscribe(ids[0]);
        state.set(2);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_observer_detached_mid_notify_is_skipped() {
        let (ids, hits) = setup();
        let state = State::new(0);
        let list = Rc::clone(state.observers());
        state.subscribe(
            ids[0],
            Rc::new(Evictor {
                list: Rc::clone(&list),
                victim: ids[1],
            }),
        );
        state.subscribe(ids[1], Rc::new(Counter { hits: hits.clone() }));
        state.subscribe(ids[2], Rc::new(Counter { hits: hits.clone() }));

        state.set(1);
        assert_eq!(hits.get(), 1);
        assert!(!list.is_subscribed(ids[1]));
    }

    #[test]
    fn test_clones_share_payload() {
        let state = State::new(String::from("a"));
        let other = state.clone();
        other.set(String::from("b"));
        assert_eq!(state.get(), "b");
    }
}
