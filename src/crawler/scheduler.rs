//! Scheduling primitives for the crawl engine
//!
//! This module handles:
//! - The bounded task queue shared by all workers
//! - Outstanding-task accounting that drives queue shutdown
//! - The one-shot stop signal
//! - The page budget that caps how many pages are fetched

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;

/// A page waiting to be crawled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Normalized page URL
    pub url: String,

    /// Link distance from the seed page (seeds are depth 0)
    pub depth: usize,
}

impl CrawlTask {
    pub fn new(url: impl Into<String>, depth: usize) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

/// One-shot broadcast stop flag
///
/// Once raised it stays raised for the rest of the run. Raising is
/// idempotent: exactly one call observes the transition.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    raised: Arc<AtomicBool>,
    token: CancellationToken,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal
    ///
    /// # Returns
    ///
    /// * `true` - This call raised the signal
    /// * `false` - The signal was already raised
    pub fn raise(&self) -> bool {
        if self.raised.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// Completes once the signal has been raised
    pub async fn raised(&self) {
        self.token.cancelled().await;
    }
}

/// How a submission was handled by [`TaskQueue::submit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The task went straight into the queue
    Queued,
    /// The queue was full; a helper task delivers it or drops it on stop
    Deferred,
    /// The task was dropped (stop raised or queue closed)
    Dropped,
}

/// Count of accepted-but-unfinished tasks with a zero wakeup
#[derive(Debug, Default)]
struct Outstanding {
    count: AtomicUsize,
    idle: Notify,
}

impl Outstanding {
    fn add(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    fn complete(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }

    fn load(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }
}

/// Bounded multi-consumer task queue with outstanding-task accounting
///
/// Every accepted task increments the outstanding count. It is decremented
/// exactly once: by [`TaskQueue::complete`] after a worker finishes the task,
/// or internally when the task is dropped before reaching a worker.
///
/// Submission never blocks the caller. When the queue is full a helper task
/// waits for space and gives up if the stop signal is raised first, so
/// workers cannot deadlock pushing into a queue only they drain.
#[derive(Debug)]
pub struct TaskQueue {
    sender: Mutex<Option<mpsc::Sender<CrawlTask>>>,
    receiver: tokio::sync::Mutex<mpsc::Receiver<CrawlTask>>,
    outstanding: Arc<Outstanding>,
    stop: StopSignal,
}

impl TaskQueue {
    /// Creates a queue holding at most `capacity` tasks
    pub fn new(capacity: usize, stop: StopSignal) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: tokio::sync::Mutex::new(receiver),
            outstanding: Arc::new(Outstanding::default()),
            stop,
        }
    }

    /// Submits a task without blocking
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, task: CrawlTask) -> Submission {
        let sender = {
            let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
            match guard.as_ref() {
                Some(sender) => sender.clone(),
                None => return Submission::Dropped,
            }
        };

        self.outstanding.add();

        if self.stop.is_raised() {
            self.outstanding.complete();
            return Submission::Dropped;
        }

        match sender.try_send(task) {
            Ok(()) => Submission::Queued,
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.outstanding.complete();
                Submission::Dropped
            }
            Err(mpsc::error::TrySendError::Full(task)) => {
                let outstanding = Arc::clone(&self.outstanding);
                let stop = self.stop.clone();
                tokio::spawn(async move {
                    tokio::select! {
                        _ = stop.raised() => outstanding.complete(),
                        sent = sender.send(task) => {
                            if sent.is_err() {
                                outstanding.complete();
                            }
                        }
                    }
                });
                Submission::Deferred
            }
        }
    }

    /// Receives the next task
    ///
    /// Returns `None` once the queue is closed and drained.
    pub async fn next(&self) -> Option<CrawlTask> {
        let mut receiver = self.receiver.lock().await;
        receiver.recv().await
    }

    /// Marks one received task as fully processed
    pub fn complete(&self) {
        self.outstanding.complete();
    }

    /// Number of tasks accepted but not yet completed
    pub fn outstanding(&self) -> usize {
        self.outstanding.load()
    }

    /// Waits until no task is outstanding
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.outstanding.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.outstanding.load() == 0 {
                return;
            }

            notified.await;
        }
    }

    /// Closes the queue
    ///
    /// Further submissions are dropped. Workers drain what is already queued
    /// and then see `None` from [`TaskQueue::next`].
    pub fn close(&self) {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

/// Page budget shared by all workers
///
/// A slot is claimed only when a fetch is about to start, so the crawled
/// count never exceeds the budget and a failed claim means the budget is
/// spent.
#[derive(Debug)]
pub struct PageBudget {
    max_pages: usize,
    crawled: AtomicUsize,
}

impl PageBudget {
    pub fn new(max_pages: usize) -> Self {
        Self {
            max_pages,
            crawled: AtomicUsize::new(0),
        }
    }

    /// Counts one page as crawled if the budget allows it
    ///
    /// # Returns
    ///
    /// * `Some(n)` - The new crawled count
    /// * `None` - The budget is spent
    pub fn try_claim(&self) -> Option<usize> {
        self.crawled
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |crawled| {
                (crawled < self.max_pages).then_some(crawled + 1)
            })
            .ok()
            .map(|previous| previous + 1)
    }

    pub fn crawled(&self) -> usize {
        self.crawled.load(Ordering::Acquire)
    }

    pub fn is_exhausted(&self) -> bool {
        self.crawled() >= self.max_pages
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }
}
