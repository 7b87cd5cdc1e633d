//! Thread-safe spin machine handle
//!
//! One lock around the whole machine makes "check idle, take bet, mark
//! spinning" a single step, so concurrent spin requests can never both be
//! accepted.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::RngCore;
use rand_chacha::ChaCha8Rng;

use crate::error::EngineResult;
use crate::scheduler::{ManualClock, Scheduler};
use crate::sequencer::{SpinEvent, SpinMachine, SpinState, SpinTicket};

/// Cloneable handle to a [`SpinMachine`]
pub struct SharedSpinMachine<S = ManualClock, R = ChaCha8Rng> {
    inner: Arc<Mutex<SpinMachine<S, R>>>,
}

impl<S, R> Clone for SharedSpinMachine<S, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Scheduler, R: RngCore> SharedSpinMachine<S, R> {
    pub fn new(machine: SpinMachine<S, R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(machine)),
        }
    }

    pub fn request_spin(&self) -> EngineResult<SpinTicket> {
        self.inner.lock().request_spin()
    }

    pub fn pump(&self) -> EngineResult<Vec<SpinEvent>> {
        self.inner.lock().pump()
    }

    pub fn award_points(&self, amount: u64) -> EngineResult<u64> {
        self.inner.lock().award_points(amount)
    }

    pub fn balance(&self) -> u64 {
        self.inner.lock().balance()
    }

    pub fn state(&self) -> SpinState {
        self.inner.lock().state()
    }

    /// Run `f` with exclusive access
    pub fn with<T>(&self, f: impl FnOnce(&mut SpinMachine<S, R>) -> T) -> T {
        f(&mut self.inner.lock())
    }
}
