//! Wire format for the Go-Back-N packet: a fixed 1030-byte record
//! comprising a 6-byte header and a 1024-byte payload region, encoded
//! little-endian, with a 16-bit ones-complement checksum covering the
//! whole record with the checksum field zeroed.

/// Number of payload bytes a single segment may carry.
pub const PAYLOAD_LEN: usize = 1024;

/// Size of the on-wire header: type(1) + seqnum(1) + checksum(2) + payloadlen(2).
pub const HEADER_LEN: usize = 6;

/// Total on-wire packet size, header plus payload region.
pub const PACKET_LEN: usize = HEADER_LEN + PAYLOAD_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Syn,
    SynAck,
    Data,
    DataAck,
    Fin,
    FinAck,
    Rst,
}

impl PacketType {
    fn to_u8(self) -> u8 {
        match self {
            PacketType::Syn => 0,
            PacketType::SynAck => 1,
            PacketType::Data => 2,
            PacketType::DataAck => 3,
            PacketType::Fin => 4,
            PacketType::FinAck => 5,
            PacketType::Rst => 6,
        }
    }

    fn from_u8(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => PacketType::Syn,
            1 => PacketType::SynAck,
            2 => PacketType::Data,
            3 => PacketType::DataAck,
            4 => PacketType::Fin,
            5 => PacketType::FinAck,
            6 => PacketType::Rst,
            _ => return None,
        })
    }
}

/// A decoded Go-Back-N packet. `data` is always `PAYLOAD_LEN` bytes wide;
/// only the first `payload_len` bytes are meaningful, the rest is
/// undefined but still covered by the checksum, matching the wire
/// invariant in the spec.
#[derive(Clone, Copy)]
pub struct Packet {
    pub kind: PacketType,
    pub seqnum: u8,
    pub checksum: u16,
    pub payload_len: u16,
    pub data: [u8; PAYLOAD_LEN],
}

impl std::fmt::Debug for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packet")
            .field("kind", &self.kind)
            .field("seqnum", &self.seqnum)
            .field("checksum", &self.checksum)
            .field("payload_len", &self.payload_len)
            .finish_non_exhaustive()
    }
}

impl Packet {
    /// Build a control packet (SYN, SYNACK, FIN, FINACK, RST) with no payload.
    pub fn control(kind: PacketType, seqnum: u8) -> Self {
        Packet {
            kind,
            seqnum,
            checksum: 0,
            payload_len: 0,
            data: [0u8; PAYLOAD_LEN],
        }
    }

    /// Build a DATA packet carrying `payload` (at most `PAYLOAD_LEN` bytes).
    pub fn data(seqnum: u8, payload: &[u8]) -> Self {
        assert!(payload.len() <= PAYLOAD_LEN, "segment exceeds PAYLOAD_LEN");
        let mut data = [0u8; PAYLOAD_LEN];
        data[..payload.len()].copy_from_slice(payload);
        Packet {
            kind: PacketType::Data,
            seqnum,
            checksum: 0,
            payload_len: payload.len() as u16,
            data,
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[..self.payload_len as usize]
    }

    /// Serialize to the exact on-wire layout (little-endian multi-byte fields).
    pub fn to_bytes(&self) -> [u8; PACKET_LEN] {
        let mut out = [0u8; PACKET_LEN];
        out[0] = self.kind.to_u8();
        out[1] = self.seqnum;
        out[2..4].copy_from_slice(&self.checksum.to_le_bytes());
        out[4..6].copy_from_slice(&self.payload_len.to_le_bytes());
        out[6..].copy_from_slice(&self.data);
        out
    }

    /// Decode a received buffer. Returns `None` for anything that isn't
    /// exactly `PACKET_LEN` bytes with a recognized type tag — such a
    /// buffer did not originate from this protocol and is discarded
    /// before it ever reaches checksum/seqnum validation.
    pub fn from_bytes(buf: &[u8]) -> Option<Self> {
        if buf.len() != PACKET_LEN {
            return None;
        }
        let kind = PacketType::from_u8(buf[0])?;
        let seqnum = buf[1];
        let checksum = u16::from_le_bytes([buf[2], buf[3]]);
        let payload_len = u16::from_le_bytes([buf[4], buf[5]]);
        let mut data = [0u8; PAYLOAD_LEN];
        data.copy_from_slice(&buf[6..]);
        Some(Packet {
            kind,
            seqnum,
            checksum,
            payload_len,
            data,
        })
    }

    /// Ones-complement checksum over the whole packet with the checksum
    /// field itself treated as zero, per RFC 1071-style folding.
    fn compute_checksum(&self) -> u16 {
        let mut bytes = self.to_bytes();
        bytes[2] = 0;
        bytes[3] = 0;

        let mut sum: u32 = 0;
        for word in bytes.chunks_exact(2) {
            sum += u16::from_le_bytes([word[0], word[1]]) as u32;
        }
        while sum >> 16 != 0 {
            sum = (sum & 0xFFFF) + (sum >> 16);
        }
        !(sum as u16)
    }

    /// Set `checksum` to the correct value for the packet's current contents.
    pub fn finalize_checksum(&mut self) {
        self.checksum = self.compute_checksum();
    }

    /// Verify the transmitted checksum against a fresh computation with
    /// the field zeroed, per §4.1: save, zero, recompute, compare.
    pub fn verify(&self) -> bool {
        self.checksum == self.compute_checksum()
    }
}

/// Wraparound-aware "is `a` strictly ahead of `b`" comparison over the
/// modulo-256 sequence space, used to decide whether a cumulative ACK
/// advances the sender's high-water mark. Plain integer `>` breaks at the
/// wrap boundary; this treats the space as split into two open
/// half-spaces around `b`.
pub fn seq_gt(a: u8, b: u8) -> bool {
    (a.wrapping_sub(b) as i8) > 0
}
