use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fibdag::exec::{HandlerFuture, TaskHandler};

/// Payloads seen by a [`RecordingHandler`], in the order handlers started.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A handler that:
/// - records its payload in a [`CallLog`] when it starts
/// - optionally sleeps, to keep a worker slot busy
/// - completes with the payload as its result.
///
/// It also tracks the highest number of its calls that were in flight at
/// once, which is how tests observe the concurrency bound.
#[derive(Debug, Clone)]
pub struct RecordingHandler {
    log: CallLog,
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl RecordingHandler {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            delay: Duration::ZERO,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl TaskHandler<String, String, String> for RecordingHandler {
    fn call(&self, payload: String) -> HandlerFuture<String, String> {
        let log = self.log.clone();
        let delay = self.delay;
        let in_flight = Arc::clone(&self.in_flight);
        let max_in_flight = Arc::clone(&self.max_in_flight);

        Box::pin(async move {
            log.push(payload.clone());
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight.fetch_max(now, Ordering::SeqCst);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(payload)
        })
    }
}
