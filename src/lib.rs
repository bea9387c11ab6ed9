pub mod classify;
pub mod commands;
pub mod config;
pub mod http;
pub mod journal;
pub mod payment;
pub mod runtime;

/// Test utilities shared across modules.
#[cfg(test)]
pub mod test_utils {
    use crate::http::Sleeper;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Records requested waits instead of sleeping.
    /// Clones share the same record, so a test can keep one and hand the other out.
    #[derive(Clone, Default)]
    pub struct RecordingSleeper {
        waits: Arc<Mutex<Vec<Duration>>>,
    }

    impl RecordingSleeper {
        pub fn waits(&self) -> Vec<Duration> {
            self.waits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }
}
