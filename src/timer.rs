use std::time::{Duration, Instant};

/// Single-shot timer armed before a blocking receive that requires a
/// deadline. The reference arms a `SIGALRM` and lets the signal
/// interrupt `recvfrom`; here the deadline is carried as data and
/// consulted by the channel's `recv_timeout` loop instead.
#[derive(Debug, Default)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    pub fn new() -> Self {
        Timer { deadline: None }
    }

    pub fn arm(&mut self, timeout: Duration) {
        self.deadline = Some(Instant::now() + timeout);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left before expiry, or `None` if the timer isn't armed.
    /// Never returns a negative duration; an elapsed timer reports zero.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }
}
