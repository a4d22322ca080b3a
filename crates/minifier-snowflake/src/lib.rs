//! Time-ordered 64-bit id generation.
//!
//! A [`Snowflake`] packs milliseconds since a custom epoch, a node id, and a
//! per-millisecond sequence into a [`SnowflakeId`]. Ids from one generator
//! are strictly increasing; ids from generators with distinct node ids never
//! collide.

mod clock;
pub mod error;
mod snowflake;
mod snowflake_id;

pub use clock::{Clock, SystemClock};
pub use error::Error;
pub use snowflake::{Snowflake, SnowflakeSettings, MAX_NODE_ID};
pub use snowflake_id::SnowflakeId;
