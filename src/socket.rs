use std::net::SocketAddr;

use log::debug;

use crate::channel::{LossModel, RandomLoss, UnreliableChannel};
use crate::config::Config;
use crate::datagram::Datagram;
use crate::error::Error;
use crate::handshake;
use crate::receiver;
use crate::sender;
use crate::state::{ConnectionState, Status};

/// Socket lifecycle handle: open, bind, listen, accept, connect, send,
/// recv, close — the public stream API of §6. `D` is the underlying
/// datagram capability; `L` is the loss/corruption model the channel
/// shim uses, defaulting to the spec's probabilistic `RandomLoss`.
pub struct GbnSocket<D, L = RandomLoss> {
    channel: UnreliableChannel<D, L>,
    state: ConnectionState,
    config: Config,
}

impl<D: Datagram> GbnSocket<D, RandomLoss> {
    /// `open(domain, type, protocol)` in the abstract surface of §6: the
    /// domain/type/protocol triple is the caller's concern (raw socket
    /// creation is out of scope for the core), so this just takes the
    /// already-constructed datagram capability and starts CLOSED.
    pub fn open(datagram: D) -> Self {
        Self::with_config(datagram, Config::default())
    }

    pub fn with_config(datagram: D, config: Config) -> Self {
        let channel = UnreliableChannel::new(datagram, config.loss_prob, config.corr_prob);
        GbnSocket {
            channel,
            state: ConnectionState::new(),
            config,
        }
    }
}

impl<D: Datagram, L: LossModel> GbnSocket<D, L> {
    /// Construct with an explicit loss model, bypassing the probabilistic
    /// default — used by tests that need a specific packet lost or
    /// corrupted deterministically.
    pub fn with_loss_model(datagram: D, config: Config, model: L) -> Self {
        GbnSocket {
            channel: UnreliableChannel::with_loss_model(datagram, model),
            state: ConnectionState::new(),
            config,
        }
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn window(&self) -> u8 {
        self.state.window
    }

    pub fn num_timeouts(&self) -> u32 {
        self.state.num_timeouts()
    }

    pub fn bind(&mut self, _addr: SocketAddr) -> Result<(), Error> {
        if self.state.status != Status::Closed {
            return Err(Error::IllegalState(self.state.status));
        }
        self.state.status = Status::Bound;
        debug!("socket bound");
        Ok(())
    }

    pub fn listen(&mut self, _backlog: u32) -> Result<(), Error> {
        if self.state.status != Status::Bound {
            return Err(Error::IllegalState(self.state.status));
        }
        self.state.status = Status::Listening;
        debug!("socket listening");
        Ok(())
    }

    pub fn connect(&mut self, peer: SocketAddr) -> Result<(), Error> {
        handshake::connect(&mut self.state, &self.channel, &self.config, peer)
    }

    pub fn accept(&mut self) -> Result<SocketAddr, Error> {
        handshake::accept(&mut self.state, &self.channel)
    }

    pub fn send(&mut self, buf: &[u8]) -> Result<usize, Error> {
        sender::go_back_n_send(&mut self.state, &self.channel, &self.config, buf)
    }

    pub fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        receiver::go_back_n_recv(&mut self.state, &self.channel, buf)
    }

    pub fn close(&mut self) -> Result<(), Error> {
        handshake::close(&mut self.state, &self.channel, &self.config)
    }
}
