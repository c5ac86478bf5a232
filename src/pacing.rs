use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::SecondsRange;

const SLEEP_SLICE: Duration = Duration::from_millis(250);
const MAX_PAUSE: Duration = Duration::from_secs(86_400);

pub(crate) trait Sleeper {
    /// Blocks for up to `duration`. Returns `false` if the wait was cut short by an interrupt.
    fn sleep(&mut self, duration: Duration) -> bool;

    fn interrupted(&self) -> bool;
}

/// Real wall-clock sleeper that wakes early when the interrupt flag is raised.
#[derive(Debug)]
pub(crate) struct ThreadSleeper {
    interrupt_flag: Arc<AtomicBool>,
}

impl ThreadSleeper {
    pub(crate) fn new(interrupt_flag: Arc<AtomicBool>) -> Self {
        Self { interrupt_flag }
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) -> bool {
        let mut remaining = duration;
        while !remaining.is_zero() {
            if self.interrupted() {
                return false;
            }
            let slice = remaining.min(SLEEP_SLICE);
            thread::sleep(slice);
            remaining -= slice;
        }
        !self.interrupted()
    }

    fn interrupted(&self) -> bool {
        self.interrupt_flag.load(Ordering::SeqCst)
    }
}

/// Draws random durations and hands them to a [`Sleeper`].
#[derive(Debug)]
pub(crate) struct Pacer<S, R> {
    sleeper: S,
    rng: R,
}

impl<S: Sleeper, R: Rng> Pacer<S, R> {
    pub(crate) fn new(sleeper: S, rng: R) -> Self {
        Self { sleeper, rng }
    }

    pub(crate) fn draw(&mut self, range: SecondsRange) -> Duration {
        let secs = if range.max > range.min {
            self.rng.gen_range(range.min..range.max)
        } else {
            range.min
        };
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(MAX_PAUSE)
    }

    /// Sleeps a random duration within `range`. `None` means the wait was interrupted.
    pub(crate) fn pause(&mut self, range: SecondsRange) -> Option<Duration> {
        let duration = self.draw(range);
        if self.sleeper.sleep(duration) {
            Some(duration)
        } else {
            None
        }
    }

    pub(crate) fn interrupted(&self) -> bool {
        self.sleeper.interrupted()
    }

    #[cfg(test)]
    pub(crate) fn sleeper(&self) -> &S {
        &self.sleeper
    }
}
