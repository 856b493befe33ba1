//! Frame-polled timer scheduling for gravity and key-repeat cadences

use std::time::{Duration, Instant};

/// A pending timed event.
struct Entry<T> {
    token: T,
    due: Instant,
    period: Option<Duration>,
}

/// Polled scheduler holding pending timed events keyed by token.
///
/// Callers decide what a token means; the scheduler only tracks when each
/// one is next due. Repeating entries rearm themselves on every fire, and a
/// poll that arrives late yields every missed fire so cadences stay
/// consistent under frame hiccups.
pub struct Scheduler<T> {
    entries: Vec<Entry<T>>,
}

impl<T: Copy + PartialEq> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Schedules a one-shot event. Any existing entry for the same token is
    /// replaced.
    pub fn schedule(&mut self, token: T, now: Instant, delay: Duration) {
        self.cancel(token);
        self.entries.push(Entry {
            token,
            due: now + delay,
            period: None,
        });
    }

    /// Schedules an event that first fires after `delay`, then again every
    /// `period` until cancelled.
    pub fn schedule_repeating(&mut self, token: T, now: Instant, delay: Duration, period: Duration) {
        self.cancel(token);
        self.entries.push(Entry {
            token,
            due: now + delay,
            period: Some(period),
        });
    }

    /// Removes the pending entry for `token`, if any.
    pub fn cancel(&mut self, token: T) {
        self.entries.retain(|entry| entry.token != token);
    }

    /// Removes every pending entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// True while an entry for `token` is pending.
    pub fn is_scheduled(&self, token: T) -> bool {
        self.entries.iter().any(|entry| entry.token == token)
    }

    /// Returns every token due by `now`, oldest deadline first. One-shot
    /// entries are consumed; repeating entries advance by their period and
    /// yield one fire per period elapsed.
    pub fn poll(&mut self, now: Instant) -> Vec<T> {
        let mut fired: Vec<(Instant, T)> = Vec::new();
        self.entries.retain_mut(|entry| {
            while entry.due <= now {
                fired.push((entry.due, entry.token));
                match entry.period {
                    Some(period) => entry.due += period,
                    None => return false,
                }
            }
            true
        });
        fired.sort_by_key(|&(due, _)| due);
        fired.into_iter().map(|(_, token)| token).collect()
    }
}

impl<T: Copy + PartialEq> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
