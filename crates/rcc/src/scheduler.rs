//! The single-threaded cancellable deferred-task scheduler behind the tuner
//! facade's `tune`/`seek`/`step`/`configure` operations.
//!
//! At most one task is ever pending: scheduling a new one discards whatever
//! was queued before it, so a new request cancels any previously scheduled
//! but not-yet-run task. Internally this is a single worker thread
//! consuming a bounded channel of `(task, deadline, generation)`, with the
//! queue narrowed to depth one since the facade only ever wants the latest
//! request honoured.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

type Task = Box<dyn FnOnce() + Send + 'static>;

enum Msg {
    Schedule {
        run_at: Instant,
        generation: u64,
        task: Task,
    },
    CancelAll,
    Shutdown,
}

/// Handle to the scheduler worker thread. Dropping it joins the thread.
pub struct Scheduler {
    tx: Sender<Msg>,
    generation: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        let generation = Arc::new(AtomicU64::new(0));
        let worker_generation = Arc::clone(&generation);
        let worker = std::thread::Builder::new()
            .name("rcc-scheduler".into())
            .spawn(move || run(rx, worker_generation))
            .expect("failed to spawn scheduler thread");
        Scheduler {
            tx,
            generation,
            worker: Some(worker),
        }
    }

    /// Schedule `task` to run after `delay`, cancelling whatever was
    /// previously queued (run or not-yet-run tasks from an earlier
    /// generation are dropped without executing).
    pub fn schedule(&self, delay: Duration, task: impl FnOnce() + Send + 'static) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let _ = self.tx.send(Msg::Schedule {
            run_at: Instant::now() + delay,
            generation,
            task: Box::new(task),
        });
    }

    /// Drop any queued-but-not-yet-run task. A task already inside its
    /// device I/O cannot be interrupted.
    pub fn cancel_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let _ = self.tx.send(Msg::CancelAll);
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let _ = self.tx.send(Msg::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run(rx: std::sync::mpsc::Receiver<Msg>, generation: Arc<AtomicU64>) {
    let mut pending: Option<(Instant, u64, Task)> = None;
    loop {
        let timeout = pending
            .as_ref()
            .map(|(run_at, _, _)| run_at.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::from_secs(3600));

        match rx.recv_timeout(timeout) {
            Ok(Msg::Schedule {
                run_at,
                generation: gen,
                task,
            }) => {
                pending = Some((run_at, gen, task));
            }
            Ok(Msg::CancelAll) => {
                pending = None;
            }
            Ok(Msg::Shutdown) => return,
            Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => {
                let due = pending
                    .as_ref()
                    .map(|(run_at, _, _)| Instant::now() >= *run_at)
                    .unwrap_or(false);
                if due {
                    let (_, gen, task) = pending.take().unwrap();
                    if gen == generation.load(Ordering::SeqCst) {
                        task();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn scheduled_task_runs_after_delay() {
        let scheduler = Scheduler::new();
        let (tx, rx) = mpsc::channel();
        scheduler.schedule(Duration::from_millis(20), move || {
            let _ = tx.send(());
        });
        rx.recv_timeout(Duration::from_secs(1))
            .expect("task should have fired");
    }

    #[test]
    fn rescheduling_cancels_the_previous_task() {
        let scheduler = Scheduler::new();
        let (tx, rx) = mpsc::channel::<&'static str>();
        let tx1 = tx.clone();
        scheduler.schedule(Duration::from_millis(200), move || {
            let _ = tx1.send("first");
        });
        let tx2 = tx.clone();
        scheduler.schedule(Duration::from_millis(20), move || {
            let _ = tx2.send("second");
        });
        let got = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(got, "second");
        assert!(rx.recv_timeout(Duration::from_millis(400)).is_err());
    }

    #[test]
    fn cancel_all_suppresses_a_pending_task() {
        let scheduler = Scheduler::new();
        let (tx, rx) = mpsc::channel();
        scheduler.schedule(Duration::from_millis(50), move || {
            let _ = tx.send(());
        });
        scheduler.cancel_all();
        assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
    }
}
