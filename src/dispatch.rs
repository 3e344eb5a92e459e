use std::ops::Deref;
use std::sync::Arc;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Hands a job to the context it has to run in, usually the UI thread.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, job: Job);
}

/// Runs every job right away on the dispatching thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateDispatcher;

impl Dispatcher for ImmediateDispatcher {
    fn dispatch(&self, job: Job) {
        job()
    }
}

pub struct AnyDispatcher {
    value: Box<dyn Dispatcher>,
}

impl AnyDispatcher {
    pub fn new(value: Box<dyn Dispatcher>) -> Self {
        Self { value }
    }
}

impl Dispatcher for AnyDispatcher {
    fn dispatch(&self, job: Job) {
        self.value.dispatch(job)
    }
}

impl<T> Dispatcher for Arc<T>
where
    T: Dispatcher + ?Sized,
{
    fn dispatch(&self, job: Job) {
        self.deref().dispatch(job);
    }
}

#[cfg(test)]
mod test {
    use parking_lot::Mutex;

    use super::*;

    #[test]
    fn test_immediate_dispatch_runs_inline() {
        let ran = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&ran);

        let dispatcher = AnyDispatcher::new(Box::new(ImmediateDispatcher));
        dispatcher.dispatch(Box::new(move || *flag.lock() = true));

        assert!(*ran.lock());
    }

    #[test]
    fn test_shared_dispatcher() {
        let dispatcher: Arc<dyn Dispatcher> = Arc::new(ImmediateDispatcher);
        let count = Arc::new(Mutex::new(0));
        for _ in 0..3 {
            let count = Arc::clone(&count);
            dispatcher.dispatch(Box::new(move || *count.lock() += 1));
        }
        assert_eq!(*count.lock(), 3);
    }
}
