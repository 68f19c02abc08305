//! Test doubles for driving the protocol engine without real sockets.
//! Not behind `#[cfg(test)]` because the integration tests under
//! `tests/` are a separate crate and need to reach these types too.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::time::Duration;

use crate::channel::{Disruption, LossModel};
use crate::datagram::{Datagram, RecvError};

/// One endpoint of an in-memory, two-party datagram link. Delivery is
/// ordered and lossless at this layer — any loss/corruption exercised in
/// a test comes from the [`crate::channel::UnreliableChannel`] wrapped
/// around it, not from this transport.
pub struct ChannelDatagram {
    local_addr: SocketAddr,
    tx: Sender<(Vec<u8>, SocketAddr)>,
    rx: Mutex<Receiver<(Vec<u8>, SocketAddr)>>,
}

impl ChannelDatagram {
    /// Build a connected pair: `a` and `b` can send to and receive from
    /// each other, addressed by the given (fake) socket addresses.
    pub fn pair(addr_a: SocketAddr, addr_b: SocketAddr) -> (Self, Self) {
        let (tx_to_b, rx_for_b) = mpsc::channel();
        let (tx_to_a, rx_for_a) = mpsc::channel();

        let a = ChannelDatagram {
            local_addr: addr_a,
            tx: tx_to_b,
            rx: Mutex::new(rx_for_a),
        };
        let b = ChannelDatagram {
            local_addr: addr_b,
            tx: tx_to_a,
            rx: Mutex::new(rx_for_b),
        };
        (a, b)
    }
}

impl Datagram for ChannelDatagram {
    fn send_to(&self, buf: &[u8], _addr: SocketAddr) -> io::Result<usize> {
        self.tx
            .send((buf.to_vec(), self.local_addr))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "peer dropped"))?;
        Ok(buf.len())
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        let (data, from) = self
            .rx
            .lock()
            .unwrap()
            .recv()
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "peer dropped"))?;
        let n = data.len().min(buf.len());
        buf[..n].copy_from_slice(&data[..n]);
        Ok((n, from))
    }

    fn recv_timeout(&self, buf: &mut [u8], timeout: Duration) -> Result<(usize, SocketAddr), RecvError> {
        match self.rx.lock().unwrap().recv_timeout(timeout) {
            Ok((data, from)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                Ok((n, from))
            }
            Err(RecvTimeoutError::Timeout) => Err(RecvError::TimedOut),
            Err(RecvTimeoutError::Disconnected) => {
                Err(RecvError::Io(io::Error::new(io::ErrorKind::BrokenPipe, "peer dropped")))
            }
        }
    }
}

/// A scripted, deterministic stand-in for `RandomLoss`: pops one
/// [`Disruption`] per call, falling back to `default` once exhausted.
/// Lets tests pin an exact packet to be lost or corrupted (S2–S5).
pub struct ScriptedLoss {
    events: Mutex<VecDeque<Disruption>>,
    default: Disruption,
}

impl ScriptedLoss {
    pub fn new(events: impl IntoIterator<Item = Disruption>, default: Disruption) -> Self {
        ScriptedLoss {
            events: Mutex::new(events.into_iter().collect()),
            default,
        }
    }

    /// Every call behaves like `default` — useful for "nothing ever
    /// arrives" scenarios (S4) where the model is irrelevant because the
    /// peer never replies at all.
    pub fn always(default: Disruption) -> Self {
        ScriptedLoss::new(std::iter::empty(), default)
    }
}

impl LossModel for ScriptedLoss {
    fn roll(&self) -> Disruption {
        self.events.lock().unwrap().pop_front().unwrap_or(self.default)
    }
}
