// Keymode Movement Worker
// Background thread that drifts the cursor while a movement state is active

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use super::cursor::CursorDriver;
use super::machine::MovementMachine;
use super::state::{MovementConfig, MovementState};

/// Errors from the movement worker
#[derive(Debug, thiserror::Error)]
pub enum MovementError {
    #[error("failed to spawn movement worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Waits out one tick interval
pub trait Pacer: Send {
    fn pause(&mut self, interval: Duration);
}

/// Pacer backed by `thread::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Pacer for ThreadSleep {
    fn pause(&mut self, interval: Duration) {
        thread::sleep(interval);
    }
}

struct Shared {
    machine: MovementMachine,
    /// Worker is blocked on the condvar
    parked: bool,
    wakeups: u64,
}

struct Inner {
    shared: Mutex<Shared>,
    wake: Condvar,
}

/// Owner of the movement worker thread.
///
/// `update_state` is the only way to talk to the worker. Passing
/// [`MovementState::Quit`] (or calling [`shutdown`](Self::shutdown), or
/// dropping the controller) stops the worker and joins it.
pub struct MovementController {
    inner: Arc<Inner>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl MovementController {
    /// Start a worker with the real clock
    pub fn spawn<C>(config: MovementConfig, cursor: C) -> Result<Self, MovementError>
    where
        C: CursorDriver + 'static,
    {
        Self::spawn_with_pacer(config, cursor, ThreadSleep)
    }

    pub fn spawn_with_pacer<C, P>(
        config: MovementConfig,
        cursor: C,
        pacer: P,
    ) -> Result<Self, MovementError>
    where
        C: CursorDriver + 'static,
        P: Pacer + 'static,
    {
        let interval = config.tick_interval;
        let verbose = config.verbose;
        let inner = Arc::new(Inner {
            shared: Mutex::new(Shared {
                machine: MovementMachine::new(config),
                parked: false,
                wakeups: 0,
            }),
            wake: Condvar::new(),
        });

        let worker = Arc::clone(&inner);
        let handle = thread::Builder::new()
            .name("movement".to_string())
            .spawn(move || run(worker, cursor, pacer, interval, verbose))?;

        log::debug!("movement worker started");
        Ok(Self {
            inner,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn state(&self) -> MovementState {
        self.inner.shared.lock().machine.state()
    }

    /// Number of times the worker was signalled out of its parked wait
    pub fn wakeups(&self) -> u64 {
        self.inner.shared.lock().wakeups
    }

    /// Whether the worker is parked waiting for a state change
    pub fn is_parked(&self) -> bool {
        self.inner.shared.lock().parked
    }

    /// Whether the worker thread has exited
    pub fn is_finished(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }

    /// Request a new state.
    ///
    /// Never blocks for long, except for `Quit`, which waits for the worker
    /// thread to exit.
    pub fn update_state(&self, state: MovementState) {
        let quit = state == MovementState::Quit;
        {
            let mut shared = self.inner.shared.lock();
            let changed = shared.machine.update(state);
            if (changed && shared.parked) || quit {
                shared.wakeups += 1;
                self.inner.wake.notify_one();
            }
        }

        if quit {
            self.join();
        }
    }

    pub fn shutdown(&self) {
        self.update_state(MovementState::Quit);
    }

    fn join(&self) {
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::error!("movement worker panicked");
            } else {
                log::debug!("movement worker stopped");
            }
        }
    }
}

impl Drop for MovementController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run<C, P>(inner: Arc<Inner>, mut cursor: C, mut pacer: P, interval: Duration, verbose: bool)
where
    C: CursorDriver,
    P: Pacer,
{
    loop {
        let (velocity, state) = {
            let mut shared = inner.shared.lock();
            loop {
                match shared.machine.state() {
                    MovementState::Quit => return,
                    MovementState::Normal => {
                        shared.parked = true;
                        inner.wake.wait(&mut shared);
                        shared.parked = false;
                    }
                    MovementState::Moving(_) => break,
                }
            }
            let state = shared.machine.state();
            match shared.machine.tick() {
                Some(velocity) => (velocity, state),
                None => continue,
            }
        };

        let position = cursor.drift(velocity);
        if verbose {
            log::debug!("cursor ({}, {}) state {}", position.x, position.y, state);
        }
        pacer.pause(interval);
    }
}
