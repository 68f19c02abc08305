//! A Go-Back-N reliable-transport engine layered over an abstract
//! unreliable datagram channel. The core is transport-agnostic: it knows
//! nothing about `UdpSocket`, argv, hostnames, or files — those are the
//! caller's concern, wired up in the `gbn-sender`/`gbn-receiver` binaries.

pub mod channel;
pub mod config;
pub mod datagram;
pub mod error;
pub mod handshake;
pub mod packet;
pub mod receiver;
pub mod sender;
pub mod socket;
pub mod state;
pub mod testkit;
pub mod timer;

pub use channel::{Disruption, LossModel, RandomLoss, UnreliableChannel};
pub use config::Config;
pub use datagram::{Datagram, RecvError};
pub use error::Error;
pub use packet::{Packet, PacketType};
pub use socket::GbnSocket;
pub use state::Status;
