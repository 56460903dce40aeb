use crate::config::LightConfig;
use crate::error::Error;
use crate::mailbox::Mailbox;
use crate::phase::{CycleTimer, Phase, PhaseCycle};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

struct Shared {
    phase: AtomicU8,
    mailbox: Mailbox<Phase>,
    stop: StopSignal,
}

/// Cancellation for the timer thread. Waiting on it doubles as the poll sleep,
/// so a stop request cuts the current sleep short.
struct StopSignal {
    stopped: Mutex<bool>,
    changed: Condvar,
}

impl StopSignal {
    fn new() -> Self {
        Self {
            stopped: Mutex::new(false),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.stopped.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop(&self) {
        *self.lock() = true;
        self.changed.notify_all();
    }

    /// Sleeps for `timeout` or until stopped. Returns true once stopped.
    fn wait(&self, timeout: Duration) -> bool {
        let stopped = self.lock();
        let (stopped, _) = self
            .changed
            .wait_timeout_while(stopped, timeout, |stopped| !*stopped)
            .unwrap_or_else(PoisonError::into_inner);
        *stopped
    }
}

enum Timer {
    Idle,
    Running(thread::JoinHandle<()>),
    Stopped,
}

/// A light that flips between [`Phase::Stop`] and [`Phase::Go`] on a
/// randomized cycle once [`TrafficLight::simulate`] has been called.
///
/// Share it behind an `Arc` to let several threads wait on it.
pub struct TrafficLight {
    id: usize,
    config: LightConfig,
    shared: Arc<Shared>,
    timer: Mutex<Timer>,
}

impl Default for TrafficLight {
    fn default() -> Self {
        Self::new()
    }
}

impl TrafficLight {
    pub fn new() -> Self {
        Self::build(LightConfig::default())
    }

    pub fn with_config(config: LightConfig) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: LightConfig) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            config,
            shared: Arc::new(Shared {
                phase: AtomicU8::new(Phase::Stop.into()),
                mailbox: Mailbox::new(),
                stop: StopSignal::new(),
            }),
            timer: Mutex::new(Timer::Idle),
        }
    }

    fn lock_timer(&self) -> MutexGuard<'_, Timer> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn config(&self) -> &LightConfig {
        &self.config
    }

    /// True while the timer thread is alive. A timer thread that panicked
    /// reports false here; [`TrafficLight::shutdown`] then returns
    /// [`Error::TimerPanicked`].
    pub fn is_simulating(&self) -> bool {
        match &*self.lock_timer() {
            Timer::Running(handle) => !handle.is_finished(),
            Timer::Idle | Timer::Stopped => false,
        }
    }

    pub fn current_phase(&self) -> Phase {
        Phase::from_u8(self.shared.phase.load(Ordering::Acquire))
    }

    /// Blocks until the light publishes [`Phase::Go`].
    ///
    /// Phase changes are taken from the mailbox, not from the current phase.
    /// A published `Go` that nobody has read yet is returned straight away.
    /// Once that `Go` has been taken, later callers wait for the next cycle
    /// back to green, even while the light still shows `Go`.
    ///
    /// Never returns `Ok` unless [`TrafficLight::simulate`] has been called;
    /// returns [`Error::Stopped`] if the light is shut down while waiting.
    pub fn wait_for_green(&self) -> Result<(), Error> {
        loop {
            match self.shared.mailbox.receive_until_closed() {
                Some(Phase::Go) => return Ok(()),
                Some(Phase::Stop) => continue,
                None => return Err(Error::Stopped),
            }
        }
    }

    /// Starts the timer thread. Only the first call on a light succeeds.
    pub fn simulate(&self) -> Result<(), Error> {
        let mut timer = self.lock_timer();
        match *timer {
            Timer::Running(_) => {
                log::warn!("Light {}: simulate called while already running", self.id);
                return Err(Error::AlreadySimulating);
            }
            Timer::Stopped => return Err(Error::Stopped),
            Timer::Idle => {}
        }

        let id = self.id;
        let config = self.config;
        let shared = self.shared.clone();
        let handle = thread::Builder::new()
            .name(format!("traffic-light-{}", id))
            .spawn(move || cycle_through_phases(id, shared, config))
            .map_err(Error::Spawn)?;

        *timer = Timer::Running(handle);
        log::info!(
            "Light {}: cycling every {:?} - {:?}",
            id,
            config.min_cycle,
            config.max_cycle
        );
        Ok(())
    }

    /// Stops the timer thread, releases blocked waiters and joins the thread.
    /// Calling it again is a no-op.
    pub fn shutdown(&self) -> Result<(), Error> {
        let previous = std::mem::replace(&mut *self.lock_timer(), Timer::Stopped);
        self.shared.stop.stop();
        self.shared.mailbox.close();

        match previous {
            Timer::Running(handle) => handle.join().map_err(|_| {
                log::error!("Light {}: timer thread panicked", self.id);
                Error::TimerPanicked
            }),
            Timer::Idle | Timer::Stopped => Ok(()),
        }
    }
}

impl Drop for TrafficLight {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn cycle_through_phases(id: usize, shared: Arc<Shared>, config: LightConfig) {
    let mut cycle = PhaseCycle::new(CycleTimer::new(&config), Instant::now());
    log::debug!("Light {}: first cycle {:?}", id, cycle.duration());

    loop {
        if let Some(phase) = cycle.poll(Instant::now()) {
            shared.phase.store(phase.into(), Ordering::Release);
            shared.mailbox.send(phase);
            log::debug!("Light {}: {} for {:?}", id, phase, cycle.duration());
        }
        if shared.stop.wait(config.poll_interval) {
            break;
        }
    }

    log::info!("Light {}: timer stopped", id);
}
