//! A single value that pushes every assignment to its listeners.
//!
//! # Contract
//!
//! - [`Observable::bind`] calls the new listener with the current value
//!   before it returns, then keeps it registered.
//! - [`Observable::set`] replaces the value unconditionally (equal values
//!   still notify) and calls every registered listener, in registration
//!   order, on the writer's thread, before it returns.
//! - Listeners stay registered for the life of the observable unless they
//!   are removed with [`Observable::unbind`] or were bound through
//!   [`Observable::bind_scoped`].
//!
//! # Threading
//!
//! Every operation takes a re-entrant lock. Writes from different threads
//! are serialized, and a notification round finishes before the next
//! writer gets in. A write made from inside a listener on the same thread
//! takes effect at once, so reads right after it see the new value, but its
//! notification is queued behind the current round. Every listener still
//! sees writes in the order they were made. A listener must not block on
//! another thread that is waiting for the same observable.
//!
//! Nothing here hops threads. Work that has to happen on a UI thread must
//! be handed over by the listener itself, see [`crate::Dispatcher`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::ReentrantMutex;

use crate::listener::{panic_message, Listener, ListenerEntry, ListenerId};
use crate::policy::FailurePolicy;
use crate::subscription::Subscription;

/// A mutable value with synchronous change listeners.
///
/// The observable is owned by whoever holds it, typically a view-model.
/// Dropping it drops every listener.
pub struct Observable<T> {
    shared: Arc<Shared<T>>,
}

pub(crate) struct Shared<T> {
    policy: FailurePolicy,
    state: ReentrantMutex<RefCell<State<T>>>,
}

struct State<T> {
    value: Arc<T>,
    version: u64,
    next_id: u64,
    listeners: Vec<Arc<ListenerEntry<T>>>,
    notifying: bool,
    pending: VecDeque<(u64, Arc<T>)>,
}

// Closes a notification round, also when a listener panic unwinds through it.
struct Round<'a, T> {
    state: &'a RefCell<State<T>>,
}

impl<T> Drop for Round<'_, T> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.notifying = false;
            if !state.pending.is_empty() {
                log::warn!(
                    "dropping {} pending notifications after an aborted round",
                    state.pending.len()
                );
                state.pending.clear();
            }
        }
    }
}

impl<T> Observable<T>
where
    T: Send + Sync + 'static,
{
    /// Creates an observable holding `value`, with no listeners and the
    /// default [`FailurePolicy::Isolate`].
    pub fn new(value: T) -> Self {
        Self::with_policy(value, FailurePolicy::default())
    }

    pub fn with_policy(value: T, policy: FailurePolicy) -> Self {
        Self {
            shared: Arc::new(Shared {
                policy,
                state: ReentrantMutex::new(RefCell::new(State {
                    value: Arc::new(value),
                    version: 0,
                    next_id: 0,
                    listeners: Vec::new(),
                    notifying: false,
                    pending: VecDeque::new(),
                })),
            }),
        }
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        T::clone(&self.shared.snapshot())
    }

    /// Returns a shared handle to the current value without cloning it.
    ///
    /// The handle keeps seeing the value it was taken from; later writes
    /// replace the observable's value, they do not mutate this one.
    pub fn snapshot(&self) -> Arc<T> {
        self.shared.snapshot()
    }

    /// Runs `f` against the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.shared.snapshot())
    }

    /// Replaces the value and notifies every listener with it.
    ///
    /// # Panics
    ///
    /// Only with [`FailurePolicy::Propagate`], when a listener panics. The
    /// new value stays assigned and the observable remains usable.
    pub fn set(&self, value: T) {
        self.shared.set(value)
    }

    /// Mutates a copy of the current value and assigns it like [`set`](Self::set).
    pub fn update(&self, f: impl FnOnce(&mut T))
    where
        T: Clone,
    {
        // Held so no other thread writes between the read and the write.
        let _guard = self.shared.state.lock();
        let mut next = T::clone(&self.shared.snapshot());
        f(&mut next);
        self.shared.set(next);
    }

    /// Calls `listener` with the current value, then registers it for every
    /// following write.
    ///
    /// The returned id can be handed to [`unbind`](Self::unbind); ignoring it
    /// keeps the listener for the life of the observable.
    pub fn bind<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.shared.bind(Box::new(listener))
    }

    /// Like [`bind`](Self::bind), but the listener is removed when the
    /// returned [`Subscription`] is dropped.
    pub fn bind_scoped<F>(&self, listener: F) -> Subscription<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.shared.bind(Box::new(listener));
        Subscription::new(Arc::downgrade(&self.shared), id)
    }

    /// Removes a listener. Returns `false` if it was not registered.
    ///
    /// A listener removed during a notification round is not called for the
    /// rest of that round.
    pub fn unbind(&self, id: ListenerId) -> bool {
        self.shared.unbind(id)
    }

    /// Number of writes since construction.
    pub fn version(&self) -> u64 {
        let guard = self.shared.state.lock();
        let state = guard.borrow();
        state.version
    }

    pub fn listener_count(&self) -> usize {
        let guard = self.shared.state.lock();
        let state = guard.borrow();
        state.listeners.len()
    }

    pub fn policy(&self) -> FailurePolicy {
        self.shared.policy
    }
}

impl<T> Default for Observable<T>
where
    T: Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.shared.state.lock();
        let mut debug = f.debug_struct("Observable");
        match guard.try_borrow() {
            Ok(state) => debug
                .field("value", &state.value)
                .field("version", &state.version)
                .field("listener_count", &state.listeners.len()),
            Err(_) => debug.field("value", &"<borrowed>"),
        };
        debug.field("policy", &self.shared.policy).finish()
    }
}

impl<T> Shared<T>
where
    T: Send + Sync + 'static,
{
    fn snapshot(&self) -> Arc<T> {
        let guard = self.state.lock();
        let state = guard.borrow();
        Arc::clone(&state.value)
    }

    fn set(&self, value: T) {
        let guard = self.state.lock();
        {
            let mut state = guard.borrow_mut();
            let value = Arc::new(value);
            state.value = Arc::clone(&value);
            state.version += 1;
            let version = state.version;
            state.pending.push_back((version, value));
            if state.notifying {
                log::trace!("deferring notification of version {}", version);
                return;
            }
            state.notifying = true;
        }
        let _round = Round { state: &*guard };
        self.drain(&guard);
    }

    fn bind(&self, listener: Listener<T>) -> ListenerId {
        let guard = self.state.lock();
        let (entry, value, nested) = {
            let mut state = guard.borrow_mut();
            let id = ListenerId(state.next_id);
            state.next_id += 1;
            let nested = state.notifying;
            state.notifying = true;
            (
                Arc::new(ListenerEntry::new(id, state.version, listener)),
                Arc::clone(&state.value),
                nested,
            )
        };
        // Notifications of writes made by the replay wait until the listener is in.
        let round = (!nested).then(|| Round { state: &*guard });

        self.invoke(&entry, &value);
        let id = entry.id();
        guard.borrow_mut().listeners.push(entry);
        log::trace!("bound {}", id);

        if round.is_some() {
            self.drain(&guard);
        }
        id
    }

    fn drain(&self, state: &RefCell<State<T>>) {
        loop {
            let (value, version, listeners) = {
                let mut state = state.borrow_mut();
                let Some((version, value)) = state.pending.pop_front() else {
                    break;
                };
                (value, version, state.listeners.clone())
            };
            log::trace!(
                "notifying {} listeners of version {}",
                listeners.len(),
                version
            );
            // A listener bound after this write already got it, or a later
            // value, through its replay.
            for entry in listeners
                .iter()
                .filter(|entry| entry.is_active() && entry.bound_at() < version)
            {
                self.invoke(entry, &value);
            }
        }
    }

    fn invoke(&self, entry: &ListenerEntry<T>, value: &T) {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| entry.call(value)));
        if let Err(payload) = outcome {
            let message = panic_message(&*payload);
            match self.policy {
                FailurePolicy::Isolate => {
                    log::error!("{} panicked and was skipped: {}", entry.id(), message);
                }
                FailurePolicy::Propagate => {
                    log::debug!("{} panicked, propagating: {}", entry.id(), message);
                    panic::resume_unwind(payload);
                }
            }
        }
    }
}

impl<T> Shared<T> {
    pub(crate) fn unbind(&self, id: ListenerId) -> bool {
        let guard = self.state.lock();
        let removed = {
            let mut state = guard.borrow_mut();
            let index = state.listeners.iter().position(|entry| entry.id() == id);
            index.map(|index| state.listeners.remove(index))
        };
        // The entry is dropped outside the borrow: its captures may unbind too.
        match removed {
            Some(entry) => {
                entry.deactivate();
                log::trace!("unbound {}", id);
                true
            }
            None => false,
        }
    }
}
