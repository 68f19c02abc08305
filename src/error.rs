use std::io;

use crate::state::Status;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("connection broken after {0} consecutive timeouts")]
    ConnectionBroken(u32),

    #[error("operation not permitted in state {0:?}")]
    IllegalState(Status),

    #[error("SYNACK failed checksum validation")]
    HandshakeCorrupt,

    #[error("SYNACK carried an unexpected sequence number")]
    HandshakeOutOfOrder,

    #[error("underlying transport failed: {0}")]
    TransportFailure(#[from] io::Error),

    #[error("socket is already closed")]
    AlreadyClosed,
}
