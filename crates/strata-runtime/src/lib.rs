//! Fixed worker pool with a priority job queue.
//!
//! Jobs are plain closures; enqueue from any thread. Shutdown is two-step:
//! `stop` prevents queued jobs from starting, `join` waits for in-flight
//! jobs to finish. Cancellation of superseded work is not the pool's job;
//! callers use version tags checked inside the closures.
#![forbid(unsafe_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Scheduling class of a job. Edits and their lighting deltas run `High`;
/// streaming loads run `Medium`; saves and other housekeeping run `Low`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Priority {
    High = 0,
    Medium = 1,
    Low = 2,
}

struct PoolState {
    queues: [VecDeque<Job>; 3],
    in_flight: usize,
    stopped: bool,
}

impl PoolState {
    fn pop_next(&mut self) -> Option<Job> {
        self.queues.iter_mut().find_map(|q| q.pop_front())
    }

    fn queued(&self) -> usize {
        self.queues.iter().map(|q| q.len()).sum()
    }

    fn is_idle(&self) -> bool {
        self.in_flight == 0 && self.queued() == 0
    }
}

struct Shared {
    state: Mutex<PoolState>,
    work_cv: Condvar,
    idle_cv: Condvar,
}

pub struct WorkPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkPool {
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                queues: [VecDeque::new(), VecDeque::new(), VecDeque::new()],
                in_flight: 0,
                stopped: false,
            }),
            work_cv: Condvar::new(),
            idle_cv: Condvar::new(),
        });
        let workers = (0..worker_count)
            .map(|_| {
                let shared = shared.clone();
                thread::spawn(move || worker_loop(shared))
            })
            .collect();
        log::debug!("work pool started with {} worker(s)", worker_count);
        Self {
            shared,
            workers: Mutex::new(workers),
        }
    }

    /// Enqueues a job. Jobs submitted after `stop` are dropped.
    pub fn submit(&self, priority: Priority, job: impl FnOnce() + Send + 'static) {
        let mut st = self.shared.state.lock().unwrap();
        if st.stopped {
            return;
        }
        st.queues[priority as usize].push_back(Box::new(job));
        drop(st);
        self.shared.work_cv.notify_one();
    }

    /// `(queued_high, queued_medium, queued_low, in_flight)`, for scheduling
    /// heuristics and tests.
    pub fn queue_debug_counts(&self) -> (usize, usize, usize, usize) {
        let st = self.shared.state.lock().unwrap();
        (
            st.queues[0].len(),
            st.queues[1].len(),
            st.queues[2].len(),
            st.in_flight,
        )
    }

    /// Blocks until no job is queued or running, or the timeout elapses.
    /// Returns true when the pool went idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut st = self.shared.state.lock().unwrap();
        while !st.is_idle() && !st.stopped {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (next, res) = self
                .shared
                .idle_cv
                .wait_timeout(st, deadline - now)
                .unwrap();
            st = next;
            if res.timed_out() && !st.is_idle() {
                return false;
            }
        }
        true
    }

    /// Prevents any queued job from starting. In-flight jobs keep running
    /// until completion; see `join`.
    pub fn stop(&self) {
        let mut st = self.shared.state.lock().unwrap();
        st.stopped = true;
        let dropped = st.queued();
        for q in &mut st.queues {
            q.clear();
        }
        drop(st);
        self.shared.work_cv.notify_all();
        self.shared.idle_cv.notify_all();
        if dropped > 0 {
            log::debug!("work pool stopped, dropped {} queued job(s)", dropped);
        }
    }

    /// Waits for every worker to exit. Implies `stop`. Must not be called
    /// from inside a job.
    pub fn join(&self) {
        self.stop();
        let handles: Vec<_> = self.workers.lock().unwrap().drain(..).collect();
        for handle in handles {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkPool {
    fn drop(&mut self) {
        self.join();
    }
}

fn worker_loop(shared: Arc<Shared>) {
    loop {
        let job = {
            let mut st = shared.state.lock().unwrap();
            loop {
                if st.stopped {
                    return;
                }
                if let Some(job) = st.pop_next() {
                    st.in_flight += 1;
                    break job;
                }
                st = shared.work_cv.wait(st).unwrap();
            }
        };
        job();
        let mut st = shared.state.lock().unwrap();
        st.in_flight -= 1;
        if st.is_idle() {
            shared.idle_cv.notify_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    #[test]
    fn drains_high_before_medium_before_low() {
        let pool = WorkPool::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));
        // Hold the single worker hostage while the queue fills up
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        pool.submit(Priority::High, move || {
            gate_rx.recv().unwrap();
        });
        for (prio, tag) in [
            (Priority::Low, "low"),
            (Priority::Medium, "medium"),
            (Priority::High, "high"),
        ] {
            let order = order.clone();
            pool.submit(prio, move || order.lock().unwrap().push(tag));
        }
        gate_tx.send(()).unwrap();
        assert!(pool.wait_idle(Duration::from_secs(5)));
        assert_eq!(&*order.lock().unwrap(), &["high", "medium", "low"]);
    }

    #[test]
    fn stop_drops_queued_jobs_and_join_waits_for_running() {
        let pool = WorkPool::new(1);
        let ran = Arc::new(AtomicUsize::new(0));
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel::<()>();
        {
            let ran = ran.clone();
            pool.submit(Priority::High, move || {
                started_tx.send(()).unwrap();
                gate_rx.recv().unwrap();
                ran.fetch_add(1, Ordering::SeqCst);
            });
        }
        {
            let ran = ran.clone();
            pool.submit(Priority::High, move || {
                ran.fetch_add(100, Ordering::SeqCst);
            });
        }
        // Stop only once the first job is definitely in flight
        started_rx.recv().unwrap();
        pool.stop();
        gate_tx.send(()).unwrap();
        pool.join();
        // The in-flight job finished; the queued one never ran
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn jobs_may_submit_follow_up_jobs() {
        let pool = Arc::new(WorkPool::new(2));
        let total = Arc::new(AtomicUsize::new(0));
        {
            let pool2 = pool.clone();
            let total = total.clone();
            pool.submit(Priority::Medium, move || {
                total.fetch_add(1, Ordering::SeqCst);
                for _ in 0..4 {
                    let total = total.clone();
                    pool2.submit(Priority::High, move || {
                        total.fetch_add(1, Ordering::SeqCst);
                    });
                }
            });
        }
        assert!(pool.wait_idle(Duration::from_secs(5)));
        assert_eq!(total.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn submissions_after_stop_are_ignored() {
        let pool = WorkPool::new(1);
        pool.stop();
        let ran = Arc::new(AtomicUsize::new(0));
        let ran2 = ran.clone();
        pool.submit(Priority::High, move || {
            ran2.fetch_add(1, Ordering::SeqCst);
        });
        assert!(pool.wait_idle(Duration::from_secs(1)));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }
}
