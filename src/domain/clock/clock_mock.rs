use std::sync::{Arc, RwLock};

use crate::domain::clock::clock::Clock;

/// Manually advanced clock shared between a test and the component under test.
#[derive(Debug, Clone, Default)]
pub struct MockClock {
    pub time_ms: Arc<RwLock<i64>>,
}

impl MockClock {
    pub fn new(time_ms: i64) -> MockClock {
        MockClock { time_ms: Arc::new(RwLock::new(time_ms)) }
    }

    pub fn set_ms(&self, time_ms: i64) {
        if let Ok(mut guard) = self.time_ms.write() {
            *guard = time_ms;
        }
    }

    pub fn advance_ms(&self, delta_ms: i64) {
        if let Ok(mut guard) = self.time_ms.write() {
            *guard += delta_ms;
        }
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> i64 {
        self.time_ms.read().map(|t| *t).unwrap_or_default()
    }
}
