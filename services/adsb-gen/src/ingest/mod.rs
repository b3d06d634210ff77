//! Control message ingest
//!
//! Messages arrive as UDP datagrams holding a '0'/'1' string. Receiving never
//! blocks: "no data" is a normal `None`.

mod socket;

pub use socket::{decode_payload, IngestError, SocketIngest, MAX_PAYLOAD_SIZE};

use crate::encoder::ControlMessage;

/// Something the producer can poll once per cycle for a new message
pub trait MessageSource {
    /// Attempt one receive without blocking
    fn try_receive(&mut self) -> Option<ControlMessage>;
}
