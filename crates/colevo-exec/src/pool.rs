//! Fixed-size worker pool for background post-processing.
//!
//! Tasks are queued on one shared channel and picked up by whichever worker
//! is free. Each submission gets its own completion handle; a task's outcome
//! (value, error, or caught panic) is delivered only to that handle.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{self as xchan, Receiver, Sender, TryRecvError};

use colevo_convert::Table;
use colevo_core::config::EngineConfig;

use crate::error::{ExecError, Result};
use crate::stats::TableStats;

type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

/// Completion handle for one submitted task.
#[must_use = "a task's outcome is only observable through its handle"]
pub struct TaskHandle<T> {
    name: String,
    rx: Receiver<Result<T>>,
}

impl<T> TaskHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Block until the task finishes.
    pub fn wait(self) -> Result<T> {
        self.rx
            .recv()
            .unwrap_or_else(|_| Err(ExecError::Abandoned { task: self.name }))
    }

    /// Outcome if the task already finished.
    pub fn try_wait(&self) -> Option<Result<T>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ExecError::Abandoned {
                task: self.name.clone(),
            })),
        }
    }
}

impl WorkerPool {
    pub fn new(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(ExecError::Config("worker pool needs at least one thread".into()));
        }

        let (sender, receiver) = xchan::unbounded::<Job>();
        let mut workers = Vec::with_capacity(threads);
        for id in 0..threads {
            let rx = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("colevo-worker-{id}"))
                .spawn(move || worker_loop(id, &rx))?;
            workers.push(handle);
        }
        tracing::debug!(threads, "worker pool started");

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    pub fn from_config(cfg: &EngineConfig) -> Result<Self> {
        Self::new(cfg.worker_threads)
    }

    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Queue `task` and return its completion handle.
    pub fn submit<T, F>(&self, name: impl Into<String>, task: F) -> Result<TaskHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce() -> colevo_core::error::Result<T> + Send + 'static,
    {
        let name = name.into();
        let sender = self.sender.as_ref().ok_or(ExecError::ShutDown)?;
        let (tx, rx) = xchan::bounded(1);

        let task_name = name.clone();
        let job: Job = Box::new(move || run_task(task_name, task, &tx));
        sender.send(job).map_err(|_| ExecError::ShutDown)?;

        Ok(TaskHandle { name, rx })
    }

    /// Compute column statistics for `table` in the background.
    pub fn submit_stats(&self, table: Arc<Table>) -> Result<TaskHandle<TableStats>> {
        self.submit("table-stats", move || TableStats::compute(&table))
    }

    /// Stop accepting work, drain the queue, and join every worker.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.sender.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("worker thread exited abnormally");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(id: usize, rx: &Receiver<Job>) {
    // Ends once the sender is gone and the queue is drained.
    for job in rx.iter() {
        job();
    }
    tracing::trace!(worker = id, "worker stopped");
}

fn run_task<T, F>(name: String, task: F, tx: &Sender<Result<T>>)
where
    F: FnOnce() -> colevo_core::error::Result<T>,
{
    tracing::trace!(task = %name, "task started");
    let outcome = match panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => {
            tracing::warn!(task = %name, error = %source, "task failed");
            Err(ExecError::Task { task: name.clone(), source })
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(task = %name, %message, "task panicked");
            Err(ExecError::Panicked { task: name.clone(), message })
        }
    };
    tracing::trace!(task = %name, ok = outcome.is_ok(), "task finished");
    // The handle may have been dropped; nobody is waiting then.
    let _ = tx.send(outcome);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colevo_convert::ConversionEngine;
    use colevo_core::error::Error;
    use colevo_core::record::Record;
    use colevo_core::schema::{DataType, Field, Schema};

    #[test]
    fn each_task_gets_its_own_outcome() {
        let pool = WorkerPool::new(3).unwrap();
        let handles: Vec<_> = (0..16_u64)
            .map(|i| pool.submit(format!("square-{i}"), move || Ok(i * i)).unwrap())
            .collect();
        let results: Vec<u64> = handles.into_iter().map(|h| h.wait().unwrap()).collect();
        assert_eq!(results, (0..16_u64).map(|i| i * i).collect::<Vec<_>>());
    }

    #[test]
    fn failures_and_panics_are_reported_not_swallowed() {
        let pool = WorkerPool::new(2).unwrap();
        let failing = pool
            .submit::<(), _>("lookup", || Err(Error::NotFound { version: 4 }))
            .unwrap();
        let panicking = pool
            .submit::<(), _>("boom", || panic!("column exploded"))
            .unwrap();
        let fine = pool.submit("fine", || Ok(1)).unwrap();

        let err = failing.wait().unwrap_err();
        assert!(matches!(
            err.task_error(),
            Some(Error::NotFound { version: 4 })
        ));
        match panicking.wait().unwrap_err() {
            ExecError::Panicked { task, message } => {
                assert_eq!(task, "boom");
                assert!(message.contains("column exploded"));
            }
            other => panic!("unexpected {other:?}"),
        }
        // The pool keeps serving after a panic.
        assert_eq!(fine.wait().unwrap(), 1);
        assert_eq!(pool.submit("again", || Ok(2)).unwrap().wait().unwrap(), 2);
    }

    #[test]
    fn queued_tasks_drain_before_shutdown() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let done = Arc::new(AtomicUsize::new(0));
        let pool = WorkerPool::new(4).unwrap();
        let handles: Vec<_> = (0..64)
            .map(|i| {
                let done = Arc::clone(&done);
                pool.submit(format!("count-{i}"), move || {
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap()
            })
            .collect();
        pool.shutdown();

        assert_eq!(done.load(Ordering::SeqCst), 64);
        for h in handles {
            assert!(matches!(h.try_wait(), Some(Ok(()))));
        }
    }

    #[test]
    fn zero_threads_rejected() {
        assert!(matches!(WorkerPool::new(0), Err(ExecError::Config(_))));
    }

    #[test]
    fn stats_run_in_background() {
        let schema = Schema::try_new(vec![
            Field::new("uid", DataType::Int64, false),
            Field::new("overall", DataType::Int32, false),
        ])
        .unwrap();
        let records: Vec<Record> = (1..=4_i64)
            .map(|i| Record::new().with("uid", i).with("overall", 60 + i as i32))
            .collect();
        let table = ConversionEngine::new().to_table(&records, &schema).unwrap();

        let pool = WorkerPool::new(1).unwrap();
        let stats = pool.submit_stats(Arc::new(table)).unwrap().wait().unwrap();
        let overall = stats.get("overall").unwrap();
        assert_eq!(overall.min, Some(colevo_core::record::Scalar::I32(61)));
        assert_eq!(overall.max, Some(colevo_core::record::Scalar::I32(64)));
        pool.shutdown();
    }
}
