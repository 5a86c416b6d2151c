use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use beacon_common::probe;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

/// Last result of a check that runs on its own task
///
/// Reading the result never blocks. The task stops when the watch is dropped.
#[derive(Debug)]
pub struct Watch {
    healthy: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl Watch {
    /// Run `check` every `interval`, reporting `initial` until it first completes
    ///
    /// A check that yields `None` leaves the previous result in place.
    #[must_use]
    pub fn spawn<F, Fut>(label: String, initial: bool, interval: Duration, mut check: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Option<bool>> + Send + 'static,
    {
        let healthy = Arc::new(AtomicBool::new(initial));
        let task = tokio::spawn({
            let healthy = Arc::clone(&healthy);
            async move {
                let mut ticker = tokio::time::interval(interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

                loop {
                    ticker.tick().await;

                    let Some(now) = check().await else {
                        continue;
                    };

                    if healthy.swap(now, Ordering::Relaxed) != now {
                        if now {
                            probe!(level = INFO, "{} is healthy", label);
                        } else {
                            probe!(level = WARN, "{} is unhealthy", label);
                        }
                    }
                }
            }
        });

        Self { healthy, task }
    }

    #[must_use]
    pub fn healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }
}

impl Drop for Watch {
    fn drop(&mut self) {
        self.task.abort();
    }
}
