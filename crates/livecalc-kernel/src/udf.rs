use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use livecalc_core::constants::{DEFAULT_MULTIPLIER, DEFAULT_UDF_TIMEOUT_MS};
use livecalc_core::Policy;

/// Per-year state handed to a UDF callback.
#[derive(Clone, Copy, Debug)]
pub struct UdfYearState {
    pub year: u8,
    pub lives: f64,
    pub rate: f64,
}

/// A pure, in-process multiplicative adjustment hook. Implementations must
/// be a pure function of their inputs and must never mutate the policy.
/// An embedded, in-process hook rather than a subprocess-per-call
/// interpreter.
pub trait UdfHook: Send + Sync {
    fn adjust_mortality(&self, policy: &Policy, state: UdfYearState) -> f64;
    fn adjust_lapse(&self, policy: &Policy, state: UdfYearState) -> f64;
}

enum UdfKind {
    Mortality,
    Lapse,
}

struct UdfJob {
    policy: Policy,
    state: UdfYearState,
    kind: UdfKind,
    reply: mpsc::Sender<f64>,
}

/// A fixed pool of long-lived worker threads servicing UDF calls over an
/// `mpsc` request/response channel — a persistent worker pool with
/// request/response framing, without subprocess plumbing. A call that
/// exceeds its timeout leaves the worker thread running
/// (UDFs are assumed not to block indefinitely in well-behaved use) but
/// never blocks the caller past the configured bound.
struct UdfWorkerPool {
    sender: mpsc::Sender<UdfJob>,
    _workers: Vec<thread::JoinHandle<()>>,
}

impl UdfWorkerPool {
    fn new(hook: Arc<dyn UdfHook>, num_workers: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<UdfJob>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..num_workers.max(1))
            .map(|_| {
                let receiver = Arc::clone(&receiver);
                let hook = Arc::clone(&hook);
                thread::spawn(move || loop {
                    let job = {
                        let guard = receiver.lock().expect("udf worker queue poisoned");
                        guard.recv()
                    };
                    let Ok(job) = job else { break };
                    let value = match job.kind {
                        UdfKind::Mortality => hook.adjust_mortality(&job.policy, job.state),
                        UdfKind::Lapse => hook.adjust_lapse(&job.policy, job.state),
                    };
                    let _ = job.reply.send(value);
                })
            })
            .collect();

        Self {
            sender,
            _workers: workers,
        }
    }

    fn call(
        &self,
        kind: UdfKind,
        policy: &Policy,
        state: UdfYearState,
        timeout: Duration,
        failures: &AtomicU64,
    ) -> f64 {
        let (reply_tx, reply_rx) = mpsc::channel();
        let job = UdfJob {
            policy: policy.clone(),
            state,
            kind,
            reply: reply_tx,
        };

        if self.sender.send(job).is_err() {
            failures.fetch_add(1, Ordering::Relaxed);
            return DEFAULT_MULTIPLIER;
        }

        match reply_rx.recv_timeout(timeout) {
            Ok(value) if value.is_finite() => value,
            _ => {
                failures.fetch_add(1, Ordering::Relaxed);
                DEFAULT_MULTIPLIER
            }
        }
    }
}

/// Attaches a [`UdfHook`] to a projection run: owns the worker pool, the
/// per-call timeout, and a shared failure counter. Cheaply `Clone`-able
/// so it can be shared across the rayon scenario fan-out.
#[derive(Clone)]
pub struct UdfContext {
    pool: Arc<UdfWorkerPool>,
    timeout: Duration,
    failures: Arc<AtomicU64>,
}

impl UdfContext {
    pub fn new(hook: Arc<dyn UdfHook>) -> Self {
        Self::with_options(hook, 4, Duration::from_millis(DEFAULT_UDF_TIMEOUT_MS))
    }

    pub fn with_options(hook: Arc<dyn UdfHook>, num_workers: usize, timeout: Duration) -> Self {
        Self {
            pool: Arc::new(UdfWorkerPool::new(hook, num_workers)),
            timeout,
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn adjust_mortality(&self, policy: &Policy, state: UdfYearState) -> f64 {
        self.pool
            .call(UdfKind::Mortality, policy, state, self.timeout, &self.failures)
    }

    pub fn adjust_lapse(&self, policy: &Policy, state: UdfYearState) -> f64 {
        self.pool
            .call(UdfKind::Lapse, policy, state, self.timeout, &self.failures)
    }

    /// Total timed-out or failed calls observed so far across all threads
    /// sharing this context.
    pub fn failure_count(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}
