use std::net::SocketAddr;

use log::{debug, warn};

use crate::channel::{LossModel, UnreliableChannel};
use crate::config::Config;
use crate::datagram::{Datagram, RecvError};
use crate::error::Error;
use crate::packet::{Packet, PacketType, PACKET_LEN};
use crate::state::{ConnectionState, Status};
use crate::timer::Timer;

/// Active open: send SYN, retry on timeout up to the broken threshold,
/// fail immediately (no retry) on a SYNACK that fails validation.
pub fn connect<D: Datagram, L: LossModel>(
    state: &mut ConnectionState,
    channel: &UnreliableChannel<D, L>,
    config: &Config,
    peer: SocketAddr,
) -> Result<(), Error> {
    if state.status != Status::Closed {
        return Err(Error::IllegalState(state.status));
    }

    state.peer_addr = Some(peer);
    let sent_seq = state.seqnum;

    let mut syn = Packet::control(PacketType::Syn, sent_seq);
    syn.finalize_checksum();

    let mut timer = Timer::new();
    let mut buf = [0u8; PACKET_LEN];

    loop {
        channel.send_to(&syn.to_bytes(), peer)?;
        timer.arm(config.timeout);
        state.status = Status::SynSent;
        debug!("connect: sent SYN seq={sent_seq}, awaiting SYNACK");

        match channel.recv_timeout(&mut buf, &timer) {
            Err(RecvError::TimedOut) => {
                let timeouts = state.register_timeout();
                warn!("connect: timeout {timeouts}/{} waiting for SYNACK", config.timeouts_to_broken);
                if timeouts >= config.timeouts_to_broken {
                    state.status = Status::Broken;
                    return Err(Error::ConnectionBroken(timeouts));
                }
                continue;
            }
            Err(RecvError::Io(e)) => return Err(Error::TransportFailure(e)),
            Ok((len, _from)) => {
                state.reset_timeouts();
                timer.disarm();

                let synack = Packet::from_bytes(&buf[..len]).ok_or(Error::HandshakeCorrupt)?;
                if !synack.verify() {
                    return Err(Error::HandshakeCorrupt);
                }
                if synack.seqnum != sent_seq {
                    return Err(Error::HandshakeOutOfOrder);
                }

                state.seqnum = sent_seq.wrapping_add(1);
                state.expected_seqnum = state.seqnum;
                state.status = Status::Established;
                debug!("connect: established, seq={}", state.seqnum);
                return Ok(());
            }
        }
    }
}

/// Passive open: block for a SYN (discarding corrupt ones with no
/// timeout), then reply with an unreliable SYNACK and move straight to
/// ESTABLISHED without waiting for further confirmation — a lost SYNACK
/// surfaces later as client-side timeouts, per §4.4.
pub fn accept<D: Datagram, L: LossModel>(
    state: &mut ConnectionState,
    channel: &UnreliableChannel<D, L>,
) -> Result<SocketAddr, Error> {
    if state.status != Status::Listening {
        return Err(Error::IllegalState(state.status));
    }

    let mut buf = [0u8; PACKET_LEN];

    let (from, syn) = loop {
        let (len, from) = match channel.recv(&mut buf) {
            Ok(v) => v,
            Err(RecvError::Io(e)) => return Err(Error::TransportFailure(e)),
            Err(RecvError::TimedOut) => unreachable!("accept's receive has no deadline"),
        };

        let Some(syn) = Packet::from_bytes(&buf[..len]) else {
            continue;
        };
        if syn.kind != PacketType::Syn || !syn.verify() {
            warn!("accept: discarding corrupt SYN, re-blocking");
            continue;
        }
        break (from, syn);
    };

    state.peer_addr = Some(from);
    state.seqnum = syn.seqnum;
    state.expected_seqnum = syn.seqnum.wrapping_add(1);
    state.status = Status::SynRcvd;

    let mut synack = Packet::control(PacketType::SynAck, syn.seqnum);
    synack.finalize_checksum();
    channel.send_to(&synack.to_bytes(), from)?;

    state.status = Status::Established;
    debug!("accept: established with {from}, seq={}", state.seqnum);
    Ok(from)
}

/// Close, initiator side: send FIN carrying `expected_seqnum`, retry on
/// timeout up to the broken threshold. Unlike `connect`, a corrupt or
/// out-of-order FINACK is not fatal — it just means the reply wasn't the
/// one we're waiting for, so the FIN is resent.
pub fn close<D: Datagram, L: LossModel>(
    state: &mut ConnectionState,
    channel: &UnreliableChannel<D, L>,
    config: &Config,
) -> Result<(), Error> {
    match state.status {
        Status::Closed => return Err(Error::AlreadyClosed),
        Status::Bound | Status::Listening | Status::FinSent | Status::FinRcvd | Status::Broken => {
            state.status = Status::Closed;
            return Ok(());
        }
        Status::SynSent | Status::SynRcvd | Status::Established => {}
    }

    let peer = state.peer_addr.ok_or(Error::IllegalState(state.status))?;
    state.seqnum = state.expected_seqnum;
    let fin_seq = state.seqnum;

    let mut fin = Packet::control(PacketType::Fin, fin_seq);
    fin.finalize_checksum();

    let mut timer = Timer::new();
    let mut buf = [0u8; PACKET_LEN];

    loop {
        channel.send_to(&fin.to_bytes(), peer)?;
        timer.arm(config.timeout);
        state.status = Status::FinSent;
        debug!("close: sent FIN seq={fin_seq}, awaiting FINACK");

        match channel.recv_timeout(&mut buf, &timer) {
            Err(RecvError::TimedOut) => {
                let timeouts = state.register_timeout();
                warn!("close: timeout {timeouts}/{} waiting for FINACK", config.timeouts_to_broken);
                if timeouts >= config.timeouts_to_broken {
                    state.status = Status::Broken;
                    return Ok(());
                }
            }
            Err(RecvError::Io(e)) => return Err(Error::TransportFailure(e)),
            Ok((len, _from)) => {
                state.reset_timeouts();
                if let Some(finack) = Packet::from_bytes(&buf[..len]) {
                    if finack.verify() && finack.kind == PacketType::FinAck && finack.seqnum == fin_seq {
                        state.status = Status::Closed;
                        return Ok(());
                    }
                }
                // Corrupt or out-of-order FINACK: fall through and resend FIN.
            }
        }
    }
}
