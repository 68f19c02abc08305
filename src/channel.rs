use std::net::SocketAddr;

use rand::Rng;

use crate::datagram::{Datagram, RecvError};
use crate::timer::Timer;

/// What happened to a datagram as it crossed the simulated unreliable
/// link, decided after the datagram has actually been received. A lost
/// datagram is discarded by the shim rather than handed to the caller;
/// the caller's receive keeps waiting against the same deadline, which
/// is how a lost packet eventually turns into a genuine timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disruption {
    None,
    Lost,
    Corrupted,
}

/// Source of loss/corruption decisions for the channel shim. Production
/// code uses `RandomLoss`; tests that need a specific packet to be lost
/// or corrupted use `ScriptedLoss` from [`crate::testkit`].
pub trait LossModel {
    fn roll(&self) -> Disruption;
}

/// §4.2's default: independent probabilistic loss and corruption checks
/// drawn fresh on every call.
#[derive(Debug, Clone, Copy)]
pub struct RandomLoss {
    pub loss_prob: f64,
    pub corr_prob: f64,
}

impl LossModel for RandomLoss {
    fn roll(&self) -> Disruption {
        let mut rng = rand::thread_rng();
        if rng.gen_bool(self.loss_prob.clamp(0.0, 1.0)) {
            Disruption::Lost
        } else if rng.gen_bool(self.corr_prob.clamp(0.0, 1.0)) {
            Disruption::Corrupted
        } else {
            Disruption::None
        }
    }
}

/// Wraps an underlying [`Datagram`], simulating loss and single-bit
/// corruption on every receive per §4.2. This is the sole source of
/// simulated unreliability; a real lossy network enters the same error
/// paths because the channel never distinguishes the two.
pub struct UnreliableChannel<D, L = RandomLoss> {
    inner: D,
    model: L,
}

impl<D: Datagram> UnreliableChannel<D, RandomLoss> {
    pub fn new(inner: D, loss_prob: f64, corr_prob: f64) -> Self {
        UnreliableChannel {
            inner,
            model: RandomLoss { loss_prob, corr_prob },
        }
    }
}

impl<D: Datagram, L: LossModel> UnreliableChannel<D, L> {
    pub fn with_loss_model(inner: D, model: L) -> Self {
        UnreliableChannel { inner, model }
    }

    pub fn send_to(&self, buf: &[u8], addr: SocketAddr) -> std::io::Result<usize> {
        self.inner.send_to(buf, addr)
    }

    /// Blocking receive with no deadline, used by `accept`.
    pub fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), RecvError> {
        loop {
            let (len, addr) = self.inner.recv(buf)?;
            match self.model.roll() {
                Disruption::None => return Ok((len, addr)),
                Disruption::Corrupted => {
                    corrupt_one_bit(&mut buf[..len]);
                    return Ok((len, addr));
                }
                Disruption::Lost => continue,
            }
        }
    }

    /// Receive bounded by `timer`. A lost datagram consumes no extra
    /// real time of its own; the loop just asks the inner transport to
    /// wait out whatever time remains on the same deadline.
    pub fn recv_timeout(&self, buf: &mut [u8], timer: &Timer) -> Result<(usize, SocketAddr), RecvError> {
        loop {
            let remaining = match timer.remaining() {
                Some(d) if !d.is_zero() => d,
                _ => return Err(RecvError::TimedOut),
            };
            let (len, addr) = self.inner.recv_timeout(buf, remaining)?;
            match self.model.roll() {
                Disruption::None => return Ok((len, addr)),
                Disruption::Corrupted => {
                    corrupt_one_bit(&mut buf[..len]);
                    return Ok((len, addr));
                }
                Disruption::Lost => continue,
            }
        }
    }
}

/// Flip the lowest bit of one uniformly-chosen byte in `buf`, per §4.2.
fn corrupt_one_bit(buf: &mut [u8]) {
    if buf.is_empty() {
        return;
    }
    let index = rand::thread_rng().gen_range(0..buf.len());
    buf[index] ^= 0x01;
}
