use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};

use rand::Rng;

/// Connection lifecycle status, mirroring the reference's `enum states`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Closed,
    Bound,
    Listening,
    SynSent,
    SynRcvd,
    Established,
    FinSent,
    FinRcvd,
    Broken,
}

/// Per-connection state: status, sequence numbers, peer address,
/// transmission window and timeout count. One `ConnectionState` backs
/// exactly one `GbnSocket`; unlike the reference, which keeps this as
/// process-wide globals, it lives on the handle (see `SPEC_FULL.md` §9).
#[derive(Debug)]
pub struct ConnectionState {
    pub status: Status,
    pub seqnum: u8,
    pub expected_seqnum: u8,
    pub peer_addr: Option<SocketAddr>,
    pub window: u8,
    num_timeouts: AtomicU32,
}

impl ConnectionState {
    pub fn new() -> Self {
        let seqnum = rand::thread_rng().gen_range(0..=255u8);
        ConnectionState {
            status: Status::Closed,
            seqnum,
            expected_seqnum: seqnum,
            peer_addr: None,
            window: 1,
            num_timeouts: AtomicU32::new(0),
        }
    }

    pub fn num_timeouts(&self) -> u32 {
        self.num_timeouts.load(Ordering::Acquire)
    }

    /// Record a timer expiry, returning the new consecutive-timeout count.
    pub fn register_timeout(&self) -> u32 {
        self.num_timeouts.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Clear the consecutive-timeout count, as happens on any valid reply.
    pub fn reset_timeouts(&self) {
        self.num_timeouts.store(0, Ordering::Release);
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}
