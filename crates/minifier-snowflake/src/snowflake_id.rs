use modular_bitfield::prelude::*;
use std::fmt;

/// A packed 64-bit id.
///
/// Fields are laid out from the least significant bit, so the integer form
/// returned by [`SnowflakeId::as_u64`] orders by timestamp first.
#[bitfield]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SnowflakeId {
    /// 12 bits for sequence number (resets every millisecond).
    pub sequence: B12,
    /// 10 bits for node ID (allows up to 1024 nodes).
    pub node_id: B10,
    /// 41 bits for timestamp (milliseconds since a custom epoch).
    pub timestamp: B41,
    #[skip]
    __: B1,
}

impl SnowflakeId {
    /// The id as an unsigned integer.
    pub fn as_u64(&self) -> u64 {
        u64::from_le_bytes(self.into_bytes())
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("timestamp", &self.timestamp())
            .field("node_id", &self.node_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}
