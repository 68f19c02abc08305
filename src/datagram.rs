use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

/// A receive failure: either the underlying transport errored, or a
/// deadline-bound receive ran out of time without a datagram arriving.
/// This plays the role the reference's `SIGALRM`-interrupted `errno ==
/// EINTR` branch played, without relying on a signal.
#[derive(Debug)]
pub enum RecvError {
    TimedOut,
    Io(io::Error),
}

impl From<io::Error> for RecvError {
    fn from(e: io::Error) -> Self {
        RecvError::Io(e)
    }
}

/// The datagram-send/receive capability the protocol core is layered
/// over. CLI argument parsing, hostname resolution and raw socket
/// creation all live outside this trait — callers hand in an already
/// constructed `Datagram` (typically a bound `UdpSocket`).
pub trait Datagram {
    /// Send one datagram. Assumed non-blocking for correctness; the
    /// protocol never buffers outgoing packets.
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;

    /// Block indefinitely for one datagram. Used by `accept`, where the
    /// reference has no alarm armed.
    fn recv(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// Block for at most `timeout` for one datagram.
    fn recv_timeout(&self, buf: &mut [u8], timeout: Duration) -> Result<(usize, SocketAddr), RecvError>;
}

impl Datagram for UdpSocket {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, addr)
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.set_read_timeout(None)?;
        UdpSocket::recv_from(self, buf)
    }

    fn recv_timeout(&self, buf: &mut [u8], timeout: Duration) -> Result<(usize, SocketAddr), RecvError> {
        self.set_read_timeout(Some(timeout))?;
        match UdpSocket::recv_from(self, buf) {
            Ok(v) => Ok(v),
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Err(RecvError::TimedOut)
            }
            Err(e) => Err(RecvError::Io(e)),
        }
    }
}

impl<D: Datagram + ?Sized> Datagram for &D {
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        (**self).send_to(buf, addr)
    }

    fn recv(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        (**self).recv(buf)
    }

    fn recv_timeout(&self, buf: &mut [u8], timeout: Duration) -> Result<(usize, SocketAddr), RecvError> {
        (**self).recv_timeout(buf, timeout)
    }
}
