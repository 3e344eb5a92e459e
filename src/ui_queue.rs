use std::sync::Arc;

use futures::lock::Mutex;
use tokio::sync::mpsc;

use crate::dispatch::{Dispatcher, Job};

type JobSender = mpsc::UnboundedSender<Job>;
type JobReceiver = mpsc::UnboundedReceiver<Job>;

/// Queues jobs for a [`UiQueue`] to run.
#[derive(Clone)]
pub struct QueueDispatcher {
    job_sender: JobSender,
}

impl Dispatcher for QueueDispatcher {
    fn dispatch(&self, job: Job) {
        if self.job_sender.send(job).is_err() {
            log::warn!("UI queue is gone, dropping job");
        }
    }
}

/// The receiving end of the UI queue. Jobs run on whichever thread or task
/// drains it, one at a time, in dispatch order.
pub struct UiQueue {
    job_receiver: Arc<Mutex<JobReceiver>>,
}

impl UiQueue {
    pub fn new() -> (QueueDispatcher, UiQueue) {
        let (job_sender, job_receiver) = mpsc::unbounded_channel::<Job>();
        (
            QueueDispatcher { job_sender },
            UiQueue {
                job_receiver: Arc::new(Mutex::new(job_receiver)),
            },
        )
    }

    /// Runs every job queued so far on the calling thread and returns how
    /// many ran. Returns 0 while a spawned loop owns the queue.
    pub fn run_until_idle(&self) -> usize {
        let Some(mut receiver) = self.job_receiver.try_lock() else {
            log::warn!("UI loop is running, skipping manual drain");
            return 0;
        };

        let mut ran = 0;
        while let Ok(job) = receiver.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Runs jobs on a tokio task as they arrive. The task ends once every
    /// [`QueueDispatcher`] is dropped.
    pub fn spawn_loop(&self) -> tokio::task::AbortHandle {
        let receiver = self.job_receiver.clone();

        let handle = tokio::spawn(async move {
            let mut receiver = receiver.lock().await;
            while let Some(job) = receiver.recv().await {
                job();
            }
            log::debug!("every dispatcher dropped, UI loop finished");
        });

        handle.abort_handle()
    }
}

#[cfg(test)]
mod test {
    use parking_lot::Mutex;
    use tokio::sync::oneshot;

    use super::*;

    fn push_job(log: &Arc<Mutex<Vec<u32>>>, value: u32) -> Job {
        let log = Arc::clone(log);
        Box::new(move || log.lock().push(value))
    }

    #[test]
    fn test_jobs_wait_for_drain() {
        let (dispatcher, queue) = UiQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        dispatcher.dispatch(push_job(&log, 1));
        dispatcher.dispatch(push_job(&log, 2));
        assert!(log.lock().is_empty());

        assert_eq!(queue.run_until_idle(), 2);
        assert_eq!(*log.lock(), vec![1, 2]);
        assert_eq!(queue.run_until_idle(), 0);
    }

    #[test]
    fn test_dispatch_after_queue_dropped() {
        let (dispatcher, queue) = UiQueue::new();
        drop(queue);
        let log = Arc::new(Mutex::new(Vec::new()));

        dispatcher.dispatch(push_job(&log, 1));

        assert!(log.lock().is_empty());
    }

    #[tokio::test]
    async fn test_spawned_loop_runs_jobs() {
        let (dispatcher, queue) = UiQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _handle = queue.spawn_loop();

        let (done_sender, done) = oneshot::channel();
        dispatcher.dispatch(push_job(&log, 1));
        dispatcher.dispatch(push_job(&log, 2));
        dispatcher.dispatch(Box::new(move || {
            let _ = done_sender.send(());
        }));
        done.await.unwrap();

        assert_eq!(*log.lock(), vec![1, 2]);
        assert_eq!(queue.run_until_idle(), 0);
    }

    #[tokio::test]
    async fn test_aborted_loop_stops_running_jobs() {
        let (dispatcher, queue) = UiQueue::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handle = queue.spawn_loop();

        handle.abort();
        while !handle.is_finished() {
            tokio::task::yield_now().await;
        }
        dispatcher.dispatch(push_job(&log, 1));
        tokio::task::yield_now().await;
        assert!(log.lock().is_empty());

        // The aborted loop released the queue, so a manual drain gets the job.
        assert_eq!(queue.run_until_idle(), 1);
        assert_eq!(*log.lock(), vec![1]);
    }
}
