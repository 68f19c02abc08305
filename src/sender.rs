use log::{debug, trace, warn};

use crate::channel::{LossModel, UnreliableChannel};
use crate::config::Config;
use crate::datagram::{Datagram, RecvError};
use crate::error::Error;
use crate::packet::{seq_gt, Packet, PacketType, PACKET_LEN};
use crate::state::{ConnectionState, Status};
use crate::timer::Timer;

/// Segment `buf` and drive it across the link with Go-Back-N, adapting
/// the window per §4.5's fixed ramp (1→2→4, collapsing to 1 on any
/// timeout, corrupt ACK or out-of-order ACK). Returns the number of
/// bytes transmitted.
pub fn go_back_n_send<D: Datagram, L: LossModel>(
    state: &mut ConnectionState,
    channel: &UnreliableChannel<D, L>,
    config: &Config,
    buf: &[u8],
) -> Result<usize, Error> {
    if matches!(state.status, Status::Bound | Status::Broken) {
        return Err(Error::IllegalState(state.status));
    }
    if buf.is_empty() {
        return Ok(0);
    }

    let peer = state.peer_addr.ok_or(Error::IllegalState(state.status))?;
    let seg_len = config.segment_len;
    let total_segments = buf.len().div_ceil(seg_len);

    if total_segments > config.max_segments_per_send {
        warn!(
            "send: {total_segments} segments exceeds max_segments_per_send ({}); sending anyway",
            config.max_segments_per_send
        );
    }

    state.window = config.min_window;
    let mut window = state.window;
    let mut num_to_send = window;
    // Index of the next segment not yet transmitted at all, as opposed to
    // `packets_acked` which only tracks what the receiver has confirmed.
    // The two diverge as soon as the window grows past 1: segments can be
    // in flight, unacked, while new ones are still being sent.
    let mut next_send_index = 0usize;
    let mut packets_acked = 0usize;
    let mut max_seen_seq = state.seqnum;

    let mut timer = Timer::new();
    let mut ack_buf = [0u8; PACKET_LEN];

    while packets_acked < total_segments {
        timer.arm(config.timeout);

        for _ in 0..num_to_send {
            if next_send_index >= total_segments {
                break;
            }
            let start = next_send_index * seg_len;
            let end = (start + seg_len).min(buf.len());
            let payload = &buf[start..end];

            let mut pkt = Packet::data(state.seqnum, payload);
            pkt.finalize_checksum();
            channel.send_to(&pkt.to_bytes(), peer)?;
            trace!("send: segment {next_send_index} seq={} ({} bytes)", state.seqnum, payload.len());

            state.seqnum = state.seqnum.wrapping_add(1);
            next_send_index += 1;

            if next_send_index == total_segments {
                break;
            }
        }
        num_to_send = 0;

        match channel.recv_timeout(&mut ack_buf, &timer) {
            Err(RecvError::TimedOut) => {
                let timeouts = state.register_timeout();
                warn!("send: timeout {timeouts}/{} waiting for DATAACK", config.timeouts_to_broken);
                if timeouts >= config.timeouts_to_broken {
                    state.status = Status::Broken;
                    return Err(Error::ConnectionBroken(timeouts));
                }
                window = config.min_window;
                state.window = window;
                num_to_send = window;
                state.seqnum = state.expected_seqnum;
                next_send_index = packets_acked;
                continue;
            }
            Err(RecvError::Io(e)) => return Err(Error::TransportFailure(e)),
            Ok((len, _from)) => {
                let ack = Packet::from_bytes(&ack_buf[..len]);
                let valid = ack.map(|a| a.kind == PacketType::DataAck && a.verify());

                match (ack, valid) {
                    (Some(ack), Some(true)) if ack.seqnum == state.expected_seqnum => {
                        state.reset_timeouts();
                        timer.disarm();

                        window = match window {
                            1 => {
                                num_to_send = 2;
                                2
                            }
                            2 => {
                                num_to_send = 3;
                                4
                            }
                            _ => {
                                num_to_send += 1;
                                config.max_window
                            }
                        };
                        state.window = window;

                        packets_acked += 1;
                        max_seen_seq = ack.seqnum;
                        state.expected_seqnum = ack.seqnum.wrapping_add(1);
                        debug!(
                            "send: DATAACK seq={} accepted, packets_acked={packets_acked}/{total_segments}, window={window}",
                            ack.seqnum
                        );
                    }
                    (Some(ack), Some(true)) => {
                        // Cumulative ACK ahead of what we expected.
                        if seq_gt(ack.seqnum, max_seen_seq) {
                            let diff = ack.seqnum.wrapping_sub(max_seen_seq) as usize;
                            packets_acked += diff;
                            max_seen_seq = ack.seqnum;
                            state.expected_seqnum = ack.seqnum.wrapping_add(1);
                        }
                        warn!("send: out-of-order DATAACK seq={}, collapsing window", ack.seqnum);
                        window = config.min_window;
                        state.window = window;
                        num_to_send = window;
                        state.seqnum = state.expected_seqnum;
                        next_send_index = packets_acked;
                    }
                    _ => {
                        warn!("send: corrupt or unexpected ACK, collapsing window");
                        window = config.min_window;
                        state.window = window;
                        num_to_send = window;
                        state.seqnum = state.expected_seqnum;
                        next_send_index = packets_acked;
                    }
                }
            }
        }
    }

    Ok(buf.len())
}
