//! Work-rate limiting for redraws, pointer moves, and persistence.
//!
//! Everything is driven by explicit `Instant`s handed in by the caller, so
//! the host decides what a frame is and tests need no clock.

use std::time::{Duration, Instant};

/// Coalesces redraw requests into at most one composite per frame interval.
///
/// A new request replaces the pending one; the due time stays on the next
/// frame boundary, so a steady stream of requests still redraws once per
/// interval.
#[derive(Debug, Clone)]
pub struct RenderScheduler {
    interval: Duration,
    pending: Option<Instant>,
    last_run: Option<Instant>,
}

impl RenderScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
            last_run: None,
        }
    }

    /// Schedule a redraw at the next frame boundary, replacing any pending one.
    pub fn request(&mut self, now: Instant) {
        let due = match self.last_run {
            Some(last) if last + self.interval > now => last + self.interval,
            _ => now,
        };
        self.pending = Some(due);
    }

    /// `true` when the pending redraw is due; it is consumed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(due) if due <= now => {
                self.pending = None;
                self.last_run = Some(now);
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending redraw becomes due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }
}

/// Lets one value through per interval.
///
/// Values offered inside the interval replace each other; the latest one is
/// held and released on the trailing edge by `poll`, or early by `flush`.
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last: Option<Instant>,
    held: Option<T>,
}

impl<T> Throttle<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
            held: None,
        }
    }

    fn ready(&self, now: Instant) -> bool {
        self.last
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// `Some(value)` if it may be applied now, otherwise it becomes the held value.
    pub fn offer(&mut self, now: Instant, value: T) -> Option<T> {
        if self.ready(now) {
            self.last = Some(now);
            self.held = None;
            Some(value)
        } else {
            self.held = Some(value);
            None
        }
    }

    /// The held value, once the interval since the last release has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.held.is_some() && self.ready(now) {
            self.last = Some(now);
            self.held.take()
        } else {
            None
        }
    }

    /// Release the held value regardless of timing.
    pub fn flush(&mut self) -> Option<T> {
        self.held.take()
    }

    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }

    pub fn reset(&mut self) {
        self.last = None;
        self.held = None;
    }
}

/// Fires once after a quiet period following the last `touch`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    /// `true` once the quiet period has elapsed; disarms.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }
}
