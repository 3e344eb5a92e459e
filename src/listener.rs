use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) type Listener<T> = Box<dyn Fn(&T) + Send + Sync + 'static>;

/// Identifies a listener registered on one `Observable`.
///
/// Ids are handed out in registration order and never reused by the same
/// observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

pub(crate) struct ListenerEntry<T> {
    id: ListenerId,
    bound_at: u64,
    active: AtomicBool,
    callback: Listener<T>,
}

impl<T> ListenerEntry<T> {
    pub(crate) fn new(id: ListenerId, bound_at: u64, callback: Listener<T>) -> Self {
        Self {
            id,
            bound_at,
            active: AtomicBool::new(true),
            callback,
        }
    }

    pub(crate) fn id(&self) -> ListenerId {
        self.id
    }

    /// Version of the value replayed to this listener when it was bound.
    pub(crate) fn bound_at(&self) -> u64 {
        self.bound_at
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    // A round may still hold this entry in its snapshot after removal.
    pub(crate) fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub(crate) fn call(&self, value: &T) {
        (self.callback)(value)
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
