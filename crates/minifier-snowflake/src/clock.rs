use jiff::Timestamp;
use std::time::Duration;

pub trait Clock: Send + Sync {
    /// Returns the current time of the clock
    fn now(&self) -> Timestamp;
    /// Block and wait until the clock reaches the target time.
    fn wait_until(&self, target: Timestamp);
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    fn wait_until(&self, target: Timestamp) {
        // Re-check after every sleep; the OS may wake us early.
        loop {
            let now = Timestamp::now();
            if now >= target {
                return;
            }
            let remaining_ms = (target.as_millisecond() - now.as_millisecond()).max(1) as u64;
            std::thread::sleep(Duration::from_millis(remaining_ms));
        }
    }
}

#[cfg(test)]
pub(crate) mod test_clock {
    use crate::clock::Clock;
    use jiff::Timestamp;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    pub(crate) struct TestClock {
        inner: Arc<Mutex<TestClockState>>,
    }

    struct TestClockState {
        now: Timestamp,
    }

    impl TestClock {
        pub(crate) fn new(now: Timestamp) -> Self {
            Self {
                inner: Arc::new(Mutex::new(TestClockState { now })),
            }
        }

        pub(crate) fn set(&self, now: Timestamp) {
            self.inner
                .lock()
                .expect("test clock lock should not be poisoned")
                .now = now;
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Timestamp {
            self.inner
                .lock()
                .expect("test clock lock should not be poisoned")
                .now
        }

        fn wait_until(&self, target: Timestamp) {
            let mut state = self
                .inner
                .lock()
                .expect("test clock lock should not be poisoned");
            // jump straight to the target instead of blocking
            if target > state.now {
                state.now = target;
            }
        }
    }

    #[test]
    fn test_clock_advances_on_wait() {
        let base = Timestamp::from_millisecond(0).unwrap();
        let clock = TestClock::new(base);
        assert_eq!(clock.now(), base);

        let target = Timestamp::from_millisecond(1_500).unwrap();
        clock.wait_until(target);
        assert_eq!(clock.now(), target);

        // waiting for the past is a no-op
        clock.wait_until(base);
        assert_eq!(clock.now(), target);
    }
}
