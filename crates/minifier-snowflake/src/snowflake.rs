use crate::{
    clock::{Clock, SystemClock},
    error::Error,
    SnowflakeId,
};
use jiff::Timestamp;
use std::sync::Mutex;
use typed_builder::TypedBuilder;

const MAX_TIMESTAMP_MILLIS: u64 = (1_u64 << 41) - 1;
/// Largest node id that fits the 10-bit node field.
pub const MAX_NODE_ID: u16 = (1 << 10) - 1;
const MAX_SEQUENCE: u16 = (1 << 12) - 1;
const DEFAULT_MAX_BACKWARD_MILLIS: i64 = 10;

/// 2024-01-01T00:00:00Z
fn default_epoch() -> Timestamp {
    Timestamp::constant(1_704_067_200, 0)
}

/// Configures a Snowflake generator instance.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct SnowflakeSettings {
    /// A unique node index in the range `[0, 1023]`.
    #[builder]
    pub node_id: u16,
    /// Custom epoch used as the zero point for the 41-bit timestamp field.
    #[builder(default = default_epoch())]
    pub start_epoch: Timestamp,
    /// Largest backward clock step, in milliseconds, that is waited out.
    /// Anything larger fails with [`Error::ClockMovedBackwards`].
    #[builder(default = DEFAULT_MAX_BACKWARD_MILLIS)]
    pub max_backward_millis: i64,
}

#[derive(Debug, Default)]
struct GeneratorState {
    last_millis: Option<i64>,
    sequence: u16,
}

/// Snowflake ID generator with wait-on-overflow semantics.
pub struct Snowflake<C: Clock = SystemClock> {
    start_time: Timestamp,
    node_id: u16,
    max_backward_millis: i64,
    clock: C,
    state: Mutex<GeneratorState>,
}

impl Snowflake<SystemClock> {
    /// Creates a generator backed by the real system clock.
    pub fn new(settings: SnowflakeSettings) -> Result<Self, Error> {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> Snowflake<C> {
    /// Creates a generator reading time from `clock`.
    pub fn with_clock(settings: SnowflakeSettings, clock: C) -> Result<Self, Error> {
        if settings.node_id > MAX_NODE_ID {
            return Err(Error::InvalidNodeId {
                node_id: settings.node_id,
                max_node_id: MAX_NODE_ID,
            });
        }

        let now = clock.now();
        if settings.start_epoch > now {
            return Err(Error::EpochAhead {
                epoch: settings.start_epoch,
                now,
            });
        }

        Ok(Self {
            start_time: settings.start_epoch,
            node_id: settings.node_id,
            max_backward_millis: settings.max_backward_millis.max(0),
            clock,
            state: Mutex::new(GeneratorState::default()),
        })
    }

    pub fn node_id(&self) -> u16 {
        self.node_id
    }

    /// Generates the next unique id.
    ///
    /// - if the per-millisecond sequence is exhausted, wait for the next millisecond
    /// - if the clock moves backward by at most `max_backward_millis`, wait
    ///   until it catches up; a larger step fails with
    ///   [`Error::ClockMovedBackwards`] instead of blocking
    pub fn next_id(&self) -> Result<SnowflakeId, Error> {
        let mut state = self.state.lock().map_err(|_| Error::StatePoisoned)?;

        let mut now = self.clock.now();

        match state.last_millis {
            None => {
                state.sequence = 0;
            }
            Some(last) => {
                let behind = last - now.as_millisecond();
                if behind > self.max_backward_millis {
                    return Err(Error::ClockMovedBackwards {
                        behind_millis: behind,
                    });
                }
                if behind > 0 {
                    // Reusing an old millisecond could repeat a
                    // (timestamp, node, sequence) triple.
                    self.clock.wait_until(millis_to_timestamp(last)?);
                    now = self.clock.now();
                }

                if now.as_millisecond() == last {
                    if state.sequence < MAX_SEQUENCE {
                        state.sequence += 1;
                    } else {
                        self.clock.wait_until(millis_to_timestamp(last + 1)?);
                        now = self.clock.now();
                        state.sequence = 0;
                    }
                } else {
                    state.sequence = 0;
                }
            }
        }

        let elapsed = now.duration_since(self.start_time).as_millis();
        if elapsed < 0 || elapsed as u64 > MAX_TIMESTAMP_MILLIS {
            return Err(Error::OverTimeLimit);
        }

        let id = SnowflakeId::new()
            .with_timestamp(elapsed as u64)
            .with_node_id(self.node_id)
            .with_sequence(state.sequence);

        state.last_millis = Some(now.as_millisecond());

        Ok(id)
    }
}

fn millis_to_timestamp(millis: i64) -> Result<Timestamp, Error> {
    Timestamp::from_millisecond(millis).map_err(|_| Error::OverTimeLimit)
}

impl<C: Clock> std::fmt::Debug for Snowflake<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snowflake")
            .field("start_time", &self.start_time)
            .field("node_id", &self.node_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::test_clock::TestClock;

    fn make_generator(node_id: u16, clock_millis: i64) -> (Snowflake<TestClock>, TestClock) {
        let epoch = Timestamp::from_millisecond(0).unwrap();
        let settings = SnowflakeSettings::builder()
            .node_id(node_id)
            .start_epoch(epoch)
            .build();
        let clock = TestClock::new(Timestamp::from_millisecond(clock_millis).unwrap());
        let generator = Snowflake::with_clock(settings, clock.clone()).unwrap();
        (generator, clock)
    }

    #[test]
    fn first_id_has_sequence_zero() {
        let (generator, _) = make_generator(0, 100);
        let id = generator.next_id().unwrap();
        assert_eq!(id.sequence(), 0);
    }

    #[test]
    fn same_millisecond_increments_sequence() {
        let (generator, _) = make_generator(0, 100);
        let id0 = generator.next_id().unwrap();
        let id1 = generator.next_id().unwrap();
        let id2 = generator.next_id().unwrap();
        assert_eq!(id0.sequence(), 0);
        assert_eq!(id1.sequence(), 1);
        assert_eq!(id2.sequence(), 2);
        assert!(id0.as_u64() < id1.as_u64() && id1.as_u64() < id2.as_u64());
    }

    #[test]
    fn sequence_overflow_advances_clock() {
        let (generator, _) = make_generator(0, 100);
        for _ in 0..=MAX_SEQUENCE {
            generator.next_id().unwrap();
        }
        let id = generator.next_id().unwrap();
        assert_eq!(id.sequence(), 0);
        assert_eq!(id.timestamp(), 101);
    }

    #[test]
    fn backward_clock_waits_for_last_millisecond() {
        let (generator, clock) = make_generator(0, 500);
        let first = generator.next_id().unwrap();

        clock.set(Timestamp::from_millisecond(495).unwrap());
        let second = generator.next_id().unwrap();

        assert_eq!(second.timestamp(), 500);
        assert_eq!(second.sequence(), 1);
        assert!(first.as_u64() < second.as_u64());
    }

    #[test]
    fn large_backward_step_fails_fast() {
        let (generator, clock) = make_generator(0, 5_000);
        generator.next_id().unwrap();

        clock.set(Timestamp::from_millisecond(4_000).unwrap());

        assert_eq!(
            generator.next_id(),
            Err(Error::ClockMovedBackwards {
                behind_millis: 1_000
            })
        );
        // the clock was not advanced by a wait
        assert_eq!(clock.now(), Timestamp::from_millisecond(4_000).unwrap());

        // once time catches up, ids resume
        clock.set(Timestamp::from_millisecond(5_001).unwrap());
        assert_eq!(generator.next_id().unwrap().timestamp(), 5_001);
    }

    #[test]
    fn node_id_is_embedded() {
        let (generator, _) = make_generator(1023, 100);
        let id = generator.next_id().unwrap();
        assert_eq!(id.node_id(), 1023);
    }

    #[test]
    fn invalid_node_id_is_rejected() {
        let settings = SnowflakeSettings::builder().node_id(1024).build();
        assert_eq!(
            Snowflake::new(settings).unwrap_err(),
            Error::InvalidNodeId {
                node_id: 1024,
                max_node_id: MAX_NODE_ID
            }
        );
    }

    #[test]
    fn epoch_in_the_future_is_rejected() {
        let settings = SnowflakeSettings::builder()
            .node_id(0)
            .start_epoch(Timestamp::from_millisecond(1_000).unwrap())
            .build();
        let clock = TestClock::new(Timestamp::from_millisecond(0).unwrap());
        assert!(matches!(
            Snowflake::with_clock(settings, clock),
            Err(Error::EpochAhead { .. })
        ));
    }

    #[test]
    fn overtime_limit_returns_error() {
        let over_limit = MAX_TIMESTAMP_MILLIS as i64 + 1;
        let (generator, _) = make_generator(0, over_limit);
        assert_eq!(generator.next_id(), Err(Error::OverTimeLimit));
    }

    #[test]
    fn system_clock_ids_are_unique() {
        let generator = Snowflake::new(SnowflakeSettings::builder().node_id(3).build()).unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(generator.next_id().unwrap().as_u64()));
        }
    }
}
