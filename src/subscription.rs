use std::fmt;
use std::sync::Weak;

use crate::listener::ListenerId;
use crate::observable::Shared;

/// Keeps a listener bound until it is dropped.
///
/// Holds only a weak reference, so it never keeps the observable alive.
pub struct Subscription<T> {
    shared: Weak<Shared<T>>,
    id: ListenerId,
    bound: bool,
}

impl<T> Subscription<T> {
    pub(crate) fn new(shared: Weak<Shared<T>>, id: ListenerId) -> Self {
        Self {
            shared,
            id,
            bound: true,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Removes the listener now. Returns `false` if the observable is gone.
    pub fn unsubscribe(mut self) -> bool {
        self.release()
    }

    fn release(&mut self) -> bool {
        if !std::mem::replace(&mut self.bound, false) {
            return false;
        }
        match self.shared.upgrade() {
            Some(shared) => shared.unbind(self.id),
            None => false,
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("bound", &self.bound)
            .finish()
    }
}
