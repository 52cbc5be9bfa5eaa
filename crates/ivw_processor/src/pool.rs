//! Background jobs whose results are applied on the evaluator thread
//!
//! Jobs run on worker threads and send their outcome back over a channel.
//! Nothing touches processor state off-thread: the `done` callbacks only run
//! inside [`JobPool::poll`], which the owner calls from the evaluator thread.

use crate::error::ProcessorError;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Error type returned by jobs
pub type JobError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Cancellation token handed to a job
#[derive(Debug, Clone, Default)]
pub struct Stop(Arc<AtomicBool>);

impl Stop {
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Progress reporter handed to a job, in `[0, 1]`
#[derive(Debug, Clone, Default)]
pub struct Progress(Arc<Mutex<f32>>);

impl Progress {
    pub fn set(&self, progress: f32) {
        *self.0.lock() = progress.clamp(0.0, 1.0);
    }

    /// Report step `i` of `n`
    pub fn set_step(&self, i: usize, n: usize) {
        if n > 0 {
            self.set(i as f32 / n as f32);
        }
    }

    pub fn get(&self) -> f32 {
        *self.0.lock()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolOptions {
    /// Keep running older jobs when a new one is dispatched
    pub keep_old_results: bool,
}

/// Identifies a dispatched job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

struct Finished<R> {
    id: JobId,
    outcome: std::result::Result<R, String>,
}

struct PendingJob<R> {
    id: JobId,
    stop: Stop,
    progress: Progress,
    done: Box<dyn FnOnce(R)>,
    handle: Option<JoinHandle<()>>,
}

type ErrorHandler = Box<dyn FnMut(&ProcessorError)>;

/// Runs jobs off-thread and applies their results in [`poll`](Self::poll)
pub struct JobPool<R: Send + 'static> {
    options: PoolOptions,
    sender: Sender<Finished<R>>,
    receiver: Receiver<Finished<R>>,
    pending: Vec<PendingJob<R>>,
    next_id: u64,
    error_handler: Option<ErrorHandler>,
}

impl<R: Send + 'static> Default for JobPool<R> {
    fn default() -> Self {
        Self::new(PoolOptions::default())
    }
}

impl<R: Send + 'static> JobPool<R> {
    pub fn new(options: PoolOptions) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            options,
            sender,
            receiver,
            pending: Vec::new(),
            next_id: 0,
            error_handler: None,
        }
    }

    pub fn options(&self) -> PoolOptions {
        self.options
    }

    /// Called on the owner thread for every failed job
    pub fn set_error_handler(&mut self, handler: impl FnMut(&ProcessorError) + 'static) {
        self.error_handler = Some(Box::new(handler));
    }

    /// Run `job` on a worker thread; `done` gets its result during a later
    /// [`poll`](Self::poll) unless the job was stopped first.
    pub fn dispatch_one<J, D>(&mut self, job: J, done: D) -> JobId
    where
        J: FnOnce(Stop, Progress) -> std::result::Result<R, JobError> + Send + 'static,
        D: FnOnce(R) + 'static,
    {
        if !self.options.keep_old_results {
            self.stop_jobs();
        }

        let id = JobId(self.next_id);
        self.next_id += 1;
        let stop = Stop::default();
        let progress = Progress::default();

        let sender = self.sender.clone();
        let (job_stop, job_progress) = (stop.clone(), progress.clone());
        let handle = std::thread::spawn(move || {
            let outcome = job(job_stop, job_progress).map_err(|e| e.to_string());
            // The pool may already be gone.
            let _ = sender.send(Finished { id, outcome });
        });
        log::debug!("Dispatched job {:?}", id);

        self.pending.push(PendingJob {
            id,
            stop,
            progress,
            done: Box::new(done),
            handle: Some(handle),
        });
        id
    }

    /// Stop every running job; their results will be discarded
    pub fn stop_jobs(&mut self) {
        for job in self.pending.drain(..) {
            job.stop.stop();
            log::debug!("Stopped job {:?}", job.id);
        }
    }

    pub fn has_jobs(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn job_count(&self) -> usize {
        self.pending.len()
    }

    /// Mean progress of the pending jobs
    pub fn progress(&self) -> f32 {
        if self.pending.is_empty() {
            return 1.0;
        }
        let total: f32 = self.pending.iter().map(|j| j.progress.get()).sum();
        total / self.pending.len() as f32
    }

    /// Apply every finished result; returns how many `done` callbacks ran
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(finished) = self.receiver.try_recv() {
            if self.apply(finished) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until every pending job has finished or `timeout` elapsed,
    /// applying results as they arrive
    pub fn wait(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut applied = self.poll();
        while self.has_jobs() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(finished) => {
                    if self.apply(finished) {
                        applied += 1;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!("Timed out waiting for {} job(s)", self.pending.len());
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        applied
    }

    fn apply(&mut self, finished: Finished<R>) -> bool {
        let Some(index) = self.pending.iter().position(|j| j.id == finished.id) else {
            log::trace!("Discarding result of stopped job {:?}", finished.id);
            return false;
        };
        let mut job = self.pending.remove(index);
        if let Some(handle) = job.handle.take() {
            if handle.join().is_err() {
                log::error!("Worker thread of job {:?} panicked", job.id);
            }
        }
        if job.stop.is_stopped() {
            return false;
        }

        match finished.outcome {
            Ok(result) => {
                (job.done)(result);
                true
            }
            Err(message) => {
                let error = ProcessorError::Job(message);
                log::error!("{}", error);
                if let Some(handler) = self.error_handler.as_mut() {
                    handler(&error);
                }
                false
            }
        }
    }
}

impl<R: Send + 'static> Drop for JobPool<R> {
    fn drop(&mut self) {
        self.stop_jobs();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[test]
    fn test_results_only_arrive_through_poll() {
        let mut pool = JobPool::<u64>::default();
        let out = Rc::new(RefCell::new(Vec::new()));
        let o = Rc::clone(&out);
        pool.dispatch_one(|_, _| Ok((1..=10).sum()), move |sum| o.borrow_mut().push(sum));

        assert!(out.borrow().is_empty());
        assert_eq!(pool.wait(TIMEOUT), 1);
        assert_eq!(*out.borrow(), vec![55]);
        assert!(!pool.has_jobs());
    }

    #[test]
    fn test_new_dispatch_stops_old_job() {
        let mut pool = JobPool::<&'static str>::default();
        let out = Rc::new(RefCell::new(Vec::new()));
        let (release, gate) = crossbeam_channel::bounded::<()>(0);

        let o = Rc::clone(&out);
        pool.dispatch_one(
            move |stop, _| {
                let _ = gate.recv();
                Ok(if stop.is_stopped() { "stopped" } else { "old" })
            },
            move |r| o.borrow_mut().push(r),
        );
        let o = Rc::clone(&out);
        pool.dispatch_one(|_, _| Ok("new"), move |r| o.borrow_mut().push(r));
        assert_eq!(pool.job_count(), 1);
        drop(release);

        pool.wait(TIMEOUT);
        assert_eq!(*out.borrow(), vec!["new"]);
    }

    #[test]
    fn test_keep_old_results() {
        let mut pool = JobPool::<u32>::new(PoolOptions {
            keep_old_results: true,
        });
        let out = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let o = Rc::clone(&out);
            pool.dispatch_one(
                move |_, p| {
                    p.set(1.0);
                    Ok(i)
                },
                move |r| o.borrow_mut().push(r),
            );
        }
        assert_eq!(pool.wait(TIMEOUT), 3);
        let mut got = out.borrow().clone();
        got.sort();
        assert_eq!(got, vec![0, 1, 2]);
    }

    #[test]
    fn test_failed_job_reaches_error_handler() {
        let mut pool = JobPool::<u32>::default();
        let errors = Rc::new(RefCell::new(Vec::new()));
        let e = Rc::clone(&errors);
        pool.set_error_handler(move |err| e.borrow_mut().push(err.to_string()));
        pool.dispatch_one(|_, _| Err("disk full".into()), |_| panic!("should not run"));

        assert_eq!(pool.wait(TIMEOUT), 0);
        assert_eq!(errors.borrow().len(), 1);
        assert!(errors.borrow()[0].contains("disk full"));
    }

    #[test]
    fn test_stop_jobs_discards_results() {
        let mut pool = JobPool::<u32>::new(PoolOptions {
            keep_old_results: true,
        });
        let (release, gate) = crossbeam_channel::bounded::<()>(0);
        pool.dispatch_one(
            move |_, _| {
                let _ = gate.recv();
                Ok(1)
            },
            |_| panic!("stopped job must not deliver"),
        );
        pool.stop_jobs();
        assert!(!pool.has_jobs());
        drop(release);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(pool.poll(), 0);
    }

    #[test]
    fn test_progress() {
        let p = Progress::default();
        p.set_step(1, 4);
        assert_eq!(p.get(), 0.25);
        p.set(3.0);
        assert_eq!(p.get(), 1.0);
        assert_eq!(JobPool::<u8>::default().progress(), 1.0);
    }
}
