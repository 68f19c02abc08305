use log::{debug, trace, warn};

use crate::channel::{LossModel, UnreliableChannel};
use crate::datagram::{Datagram, RecvError};
use crate::error::Error;
use crate::packet::{Packet, PacketType, PACKET_LEN};
use crate::state::{ConnectionState, Status};

/// Accept one in-order segment per call, ACKing the last good sequence
/// number whether or not the datagram that triggered this call was
/// itself accepted. A FIN only drives `FIN_RCVD` and a FINACK reply when
/// it is itself fully validated — a corrupt or out-of-order packet that
/// happens to carry the FIN type tag does not (the safe reading of the
/// reference's FIN quirk, see `SPEC_FULL.md` §9).
pub fn go_back_n_recv<D: Datagram, L: LossModel>(
    state: &mut ConnectionState,
    channel: &UnreliableChannel<D, L>,
    out: &mut [u8],
) -> Result<usize, Error> {
    if state.status == Status::FinRcvd {
        return Ok(0);
    }
    if state.status != Status::Established {
        return Err(Error::IllegalState(state.status));
    }
    let peer = state.peer_addr.ok_or(Error::IllegalState(state.status))?;

    let mut buf = [0u8; PACKET_LEN];

    loop {
        let (len, _from) = match channel.recv(&mut buf) {
            Ok(v) => v,
            Err(RecvError::Io(e)) => return Err(Error::TransportFailure(e)),
            Err(RecvError::TimedOut) => unreachable!("recv's blocking receive has no deadline"),
        };

        let Some(packet) = Packet::from_bytes(&buf[..len]) else {
            trace!("recv: discarding malformed datagram");
            continue;
        };

        let mut reject = !packet.verify();
        if packet.seqnum != state.expected_seqnum {
            reject = true;
        }
        if !matches!(packet.kind, PacketType::Data | PacketType::Fin) {
            reject = true;
        }

        let ack_type = match packet.kind {
            PacketType::Fin if !reject => PacketType::FinAck,
            _ => PacketType::DataAck,
        };

        let mut delivered = 0usize;
        if !reject && packet.kind == PacketType::Data {
            let n = packet.payload_len as usize;
            out[..n].copy_from_slice(&packet.data[..n]);
            delivered = n;
            state.seqnum = packet.seqnum;
            state.expected_seqnum = packet.seqnum.wrapping_add(1);
        }

        let ack_seq = if reject {
            state.expected_seqnum.wrapping_sub(1)
        } else {
            packet.seqnum
        };

        let mut ack = Packet::control(ack_type, ack_seq);
        ack.finalize_checksum();
        channel.send_to(&ack.to_bytes(), peer)?;

        if reject {
            warn!("recv: rejected seq={} (reason: checksum/seq/type), re-ACKing {ack_seq}", packet.seqnum);
            continue;
        }

        return match packet.kind {
            PacketType::Data => {
                debug!("recv: accepted DATA seq={}, {delivered} bytes", packet.seqnum);
                Ok(delivered)
            }
            PacketType::Fin => {
                state.status = Status::FinRcvd;
                debug!("recv: accepted FIN seq={}", packet.seqnum);
                Ok(0)
            }
            _ => unreachable!("non-DATA/FIN types are always rejected above"),
        };
    }
}
