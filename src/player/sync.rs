//! Time display and the fixed-interval poll that refreshes it while playing.

use std::fmt;
use std::time::{Duration, Instant};

/// Whole minutes and seconds, as shown to the user.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Clock {
    pub minutes: u64,
    pub seconds: u64,
}

impl Clock {
    pub fn from_secs(secs: f64) -> Self {
        let whole = if secs.is_finite() && secs > 0.0 {
            secs.floor() as u64
        } else {
            0
        };
        Self {
            minutes: whole / 60,
            seconds: whole % 60,
        }
    }
}

impl fmt::Display for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.minutes, self.seconds)
    }
}

/// Elapsed and total position of the current track, in seconds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimeDisplay {
    pub elapsed: f64,
    pub total: Option<f64>,
}

impl TimeDisplay {
    /// Build a display from raw adapter reads.
    ///
    /// Returns `None` when the position is unavailable; elapsed never exceeds
    /// a known total.
    pub fn sample(position: Option<f64>, total: Option<f64>) -> Option<Self> {
        let position = position.filter(|p| p.is_finite())?.max(0.0);
        let total = total.filter(|t| t.is_finite() && *t > 0.0);
        let elapsed = match total {
            Some(t) => position.min(t),
            None => position,
        };
        Some(Self { elapsed, total })
    }

    pub fn elapsed_clock(&self) -> Clock {
        Clock::from_secs(self.elapsed)
    }

    pub fn total_clock(&self) -> Option<Clock> {
        self.total.map(Clock::from_secs)
    }

    pub fn remaining_clock(&self) -> Option<Clock> {
        self.total.map(|t| Clock::from_secs(t - self.elapsed))
    }
}

/// The coordinator's single poll timer.
///
/// Cooperative: the host calls [`SyncLoop::poll`] from its own loop and the
/// timer reports whether a sample is due.
#[derive(Debug)]
pub struct SyncLoop {
    interval: Duration,
    running: bool,
    next_due: Option<Instant>,
    starts: u64,
}

impl SyncLoop {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            running: false,
            next_due: None,
            starts: 0,
        }
    }

    /// Arm the timer. Starting a running timer is ignored.
    pub fn start(&mut self) -> bool {
        if self.running {
            return false;
        }
        self.running = true;
        self.next_due = None;
        self.starts += 1;
        true
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.next_due = None;
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// How many times the timer has been armed.
    pub fn starts(&self) -> u64 {
        self.starts
    }

    /// Whether a sample is due at `now`. The first poll after a start fires
    /// immediately; later ones every `interval`.
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.running {
            return false;
        }
        match self.next_due {
            Some(due) if now < due => false,
            _ => {
                self.next_due = Some(now + self.interval);
                true
            }
        }
    }
}
