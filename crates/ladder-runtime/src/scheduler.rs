//! Periodic scan scheduling and clocks.
//!
//! Every access to a running simulation goes through [`SharedSimulation`],
//! whose single lock serializes periodic cycles, manual steps, overrides,
//! resets and snapshots. A reader therefore only ever sees a whole commit.

#![allow(missing_docs)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use tracing::{info, warn};

use crate::error::RuntimeError;
use crate::image::ProcessImage;
use crate::runtime::{CycleReport, Simulation};
use crate::tag::TagId;
use crate::value::Duration;

/// Scan period used by the browser simulator.
pub const DEFAULT_SCAN_PERIOD: Duration = Duration::from_millis(100);

/// Clock interface for scan scheduling.
pub trait Clock: Send + Sync + 'static {
    /// Return the current time for scheduling.
    fn now(&self) -> Duration;

    /// Block until `deadline` or until `cancel` is set and [`Clock::wake`] runs.
    fn sleep_until(&self, deadline: Duration, cancel: &AtomicBool);

    /// Wake any sleepers so they can observe their cancel flag.
    fn wake(&self);
}

#[derive(Debug, Default)]
struct WakeSignal {
    lock: Mutex<()>,
    cvar: Condvar,
}

/// Monotonic clock based on `std::time::Instant`.
#[derive(Debug, Clone)]
pub struct StdClock {
    start: std::time::Instant,
    signal: Arc<WakeSignal>,
}

impl StdClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
            signal: Arc::new(WakeSignal::default()),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now(&self) -> Duration {
        Duration::from(self.start.elapsed())
    }

    fn sleep_until(&self, deadline: Duration, cancel: &AtomicBool) {
        let mut guard = self.signal.lock.lock().expect("clock lock poisoned");
        loop {
            if cancel.load(Ordering::SeqCst) {
                return;
            }
            let remaining = deadline.saturating_sub(self.now()).as_nanos();
            if remaining <= 0 {
                return;
            }
            let timeout = std::time::Duration::from_nanos(u64::try_from(remaining).unwrap_or(0));
            let (next, _) = self
                .signal
                .cvar
                .wait_timeout(guard, timeout)
                .expect("clock wait poisoned");
            guard = next;
        }
    }

    fn wake(&self) {
        let _guard = self.signal.lock.lock().expect("clock lock poisoned");
        self.signal.cvar.notify_all();
    }
}

#[derive(Debug)]
struct ManualClockState {
    now: Duration,
    sleep_calls: u64,
}

/// Deterministic clock for tests and simulations.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<(Mutex<ManualClockState>, Condvar)>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new((
                Mutex::new(ManualClockState {
                    now: Duration::ZERO,
                    sleep_calls: 0,
                }),
                Condvar::new(),
            )),
        }
    }

    /// Advance time by the given delta.
    pub fn advance(&self, delta: Duration) -> Duration {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock().expect("manual clock lock poisoned");
        state.now = state.now.saturating_add(delta);
        cvar.notify_all();
        state.now
    }

    /// Set the current time explicitly.
    pub fn set_time(&self, time: Duration) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock().expect("manual clock lock poisoned");
        state.now = time;
        cvar.notify_all();
    }

    /// Number of sleep calls issued to this clock.
    #[must_use]
    pub fn sleep_calls(&self) -> u64 {
        let (lock, _) = &*self.inner;
        lock.lock().expect("manual clock lock poisoned").sleep_calls
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let (lock, _) = &*self.inner;
        lock.lock().expect("manual clock lock poisoned").now
    }

    fn sleep_until(&self, deadline: Duration, cancel: &AtomicBool) {
        let (lock, cvar) = &*self.inner;
        let mut state = lock.lock().expect("manual clock lock poisoned");
        state.sleep_calls = state.sleep_calls.saturating_add(1);
        while !cancel.load(Ordering::SeqCst) && state.now < deadline {
            state = cvar.wait(state).expect("manual clock wait poisoned");
        }
    }

    fn wake(&self) {
        let (lock, cvar) = &*self.inner;
        let _state = lock.lock().expect("manual clock lock poisoned");
        cvar.notify_all();
    }
}

/// Scan execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Ready,
    Running,
    Stopped,
}

type Subscribers = Arc<Mutex<Vec<Sender<CycleReport>>>>;

/// Simulation shared between the scan thread and external readers.
#[derive(Debug, Clone)]
pub struct SharedSimulation {
    inner: Arc<Mutex<Simulation>>,
    subscribers: Subscribers,
}

impl SharedSimulation {
    #[must_use]
    pub fn new(simulation: Simulation) -> Self {
        Self {
            inner: Arc::new(Mutex::new(simulation)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Run `f` with exclusive access; no cycle runs concurrently.
    pub fn with_lock<T>(&self, f: impl FnOnce(&mut Simulation) -> T) -> T {
        let mut guard = self.inner.lock().expect("simulation lock poisoned");
        f(&mut guard)
    }

    /// Run one cycle at the clock's current reading and publish its report.
    ///
    /// The clock is read with the lock held, so commits carry increasing
    /// readings.
    pub fn step_now<C: Clock>(&self, clock: &C) -> CycleReport {
        self.with_lock(|sim| {
            let report = sim.step_at(clock.now());
            self.publish(&report);
            report
        })
    }

    /// Consistent copy of the committed process image.
    #[must_use]
    pub fn snapshot(&self) -> ProcessImage {
        self.with_lock(|sim| sim.image().clone())
    }

    /// Receive a report after every committed cycle.
    pub fn subscribe(&self) -> Receiver<CycleReport> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .push(tx);
        rx
    }

    // Called with the simulation lock held so reports arrive in commit order.
    fn publish(&self, report: &CycleReport) {
        let mut subscribers = self.subscribers.lock().expect("subscriber lock poisoned");
        subscribers.retain(|tx| tx.send(report.clone()).is_ok());
    }
}

/// Drives a shared simulation at a fixed period.
#[derive(Debug)]
pub struct ScanRunner<C: Clock + Clone> {
    shared: SharedSimulation,
    clock: C,
    period: Duration,
}

impl<C: Clock + Clone> ScanRunner<C> {
    #[must_use]
    pub fn new(shared: SharedSimulation, clock: C, period: Duration) -> Self {
        Self {
            shared,
            clock,
            period,
        }
    }

    /// Execute one cycle using the current clock time.
    pub fn tick(&self) -> CycleReport {
        self.shared.step_now(&self.clock)
    }

    /// Spawn the runner in a dedicated OS thread.
    pub fn spawn(self, name: impl Into<String>) -> Result<ScanHandle<C>, RuntimeError> {
        let stop = Arc::new(AtomicBool::new(false));
        let state = Arc::new(Mutex::new(ScanState::Ready));
        let clock = self.clock.clone();

        let stop_thread = stop.clone();
        let state_thread = state.clone();
        let join = thread::Builder::new()
            .name(name.into())
            .spawn(move || run_scan_loop(&self, &stop_thread, &state_thread))
            .map_err(|err| RuntimeError::ThreadSpawn(err.to_string().into()))?;

        Ok(ScanHandle {
            stop,
            state,
            clock,
            join: Some(join),
        })
    }
}

fn run_scan_loop<C: Clock + Clone>(
    runner: &ScanRunner<C>,
    stop: &AtomicBool,
    state: &Mutex<ScanState>,
) {
    *state.lock().expect("scan state poisoned") = ScanState::Running;
    loop {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        let now = runner.clock.now();
        runner.tick();

        let deadline = now.saturating_add(runner.period);
        if runner.clock.now() > deadline {
            runner.shared.with_lock(|sim| sim.stats_mut().record_overrun());
            warn!("scan cycle overran its {}ms period", runner.period.as_millis());
            continue;
        }
        runner.clock.sleep_until(deadline, stop);
    }
    *state.lock().expect("scan state poisoned") = ScanState::Stopped;
}

/// Handle to a running scan thread.
#[derive(Debug)]
pub struct ScanHandle<C: Clock + Clone> {
    stop: Arc<AtomicBool>,
    state: Arc<Mutex<ScanState>>,
    clock: C,
    join: Option<thread::JoinHandle<()>>,
}

impl<C: Clock + Clone> ScanHandle<C> {
    /// Signal the scan thread to stop after the current cycle.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        self.clock.wake();
    }

    /// Current scan state.
    #[must_use]
    pub fn state(&self) -> ScanState {
        *self.state.lock().expect("scan state poisoned")
    }

    /// Join the scan thread.
    pub fn join(&mut self) -> thread::Result<()> {
        if let Some(join) = self.join.take() {
            return join.join();
        }
        Ok(())
    }
}

impl<C: Clock + Clone> Drop for ScanHandle<C> {
    fn drop(&mut self) {
        self.stop();
        let _ = self.join();
    }
}

/// Start/stop/step/reset surface used by front-ends.
#[derive(Debug)]
pub struct Controller<C: Clock + Clone> {
    shared: SharedSimulation,
    clock: C,
    handle: Option<ScanHandle<C>>,
}

impl<C: Clock + Clone> Controller<C> {
    #[must_use]
    pub fn new(simulation: Simulation, clock: C) -> Self {
        Self {
            shared: SharedSimulation::new(simulation),
            clock,
            handle: None,
        }
    }

    #[must_use]
    pub fn shared(&self) -> &SharedSimulation {
        &self.shared
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Begin periodic scanning after a successful pre-run check.
    pub fn start(&mut self, period: Duration) -> Result<(), RuntimeError> {
        if self.handle.is_some() {
            return Err(RuntimeError::AlreadyRunning);
        }
        if period <= Duration::ZERO {
            return Err(RuntimeError::InvalidConfig(
                format!("scan period must be greater than 0 (got {}ns)", period.as_nanos()).into(),
            ));
        }
        if let Err(err) = self.shared.with_lock(|sim| sim.pre_run_check()) {
            warn!("scan not started: {err}");
            return Err(err);
        }
        let runner = ScanRunner::new(self.shared.clone(), self.clock.clone(), period);
        self.handle = Some(runner.spawn("ladder-scan")?);
        info!(period_ms = period.as_millis(), "scan started");
        Ok(())
    }

    /// Stop periodic scanning; the in-flight cycle, if any, completes first.
    pub fn stop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop();
            if handle.join().is_err() {
                warn!("scan thread panicked");
            }
            info!("scan stopped");
        }
    }

    /// Stop scanning, clear the image to `false` and drop timer state.
    pub fn reset(&mut self) {
        self.stop();
        self.shared.with_lock(Simulation::reset);
    }

    /// Run one manual cycle, whether or not periodic scanning is active.
    pub fn step(&self) -> CycleReport {
        self.shared.step_now(&self.clock)
    }

    /// Override a tag between cycles.
    ///
    /// While scanning, the override is followed by one out-of-band cycle
    /// under the same lock.
    pub fn force(&self, name: &str, value: bool) -> Option<TagId> {
        let running = self.is_running();
        self.shared.with_lock(|sim| {
            let id = sim.inject(name, value)?;
            if running {
                let report = sim.step_at(self.clock.now());
                self.shared.publish(&report);
            }
            Some(id)
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> ProcessImage {
        self.shared.snapshot()
    }

    pub fn subscribe(&self) -> Receiver<CycleReport> {
        self.shared.subscribe()
    }
}

impl<C: Clock + Clone> Drop for Controller<C> {
    fn drop(&mut self) {
        self.stop();
    }
}
