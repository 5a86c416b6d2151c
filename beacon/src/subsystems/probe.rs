use std::{sync::Arc, time::Duration};

use beacon_common::{
    probe,
    traits::{HealthChecker, Subsystem},
};
use tokio::net::TcpStream;

use super::watch::Watch;

/// Periodic TCP reachability check against a dependency
///
/// The connection attempt happens on a background task; [`HealthChecker::healthy`]
/// only reads the last result. A probe starts unhealthy until its first
/// attempt succeeds, and its task stops when the probe is dropped.
#[derive(Debug)]
pub struct Probe {
    name: String,
    reachable: Watch,
}

impl Probe {
    /// Create the probe and start checking `address` every `interval`
    #[must_use]
    pub fn spawn(name: String, address: String, interval: Duration, timeout: Duration) -> Arc<Self> {
        let label = format!("{name} at {address}");

        let reachable = Watch::spawn(label, false, interval, move || {
            let address = address.clone();
            async move {
                let reachable =
                    match tokio::time::timeout(timeout, TcpStream::connect(&address)).await {
                        Ok(Ok(_)) => true,
                        Ok(Err(err)) => {
                            probe!("Failed to connect to {}: {}", address, err);
                            false
                        }
                        Err(_) => {
                            probe!("Timed out connecting to {}", address);
                            false
                        }
                    };

                Some(reachable)
            }
        });

        Arc::new(Self { name, reachable })
    }
}

impl HealthChecker for Probe {
    fn healthy(&self) -> bool {
        self.reachable.healthy()
    }
}

impl Subsystem for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn health_checker(self: Arc<Self>) -> Option<Arc<dyn HealthChecker>> {
        Some(self)
    }
}
