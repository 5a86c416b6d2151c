use std::{path::PathBuf, sync::Arc, time::Duration};

use beacon_common::{
    probe,
    traits::{HealthChecker, Subsystem},
};

use super::watch::Watch;

/// Operator-controlled drain switch
///
/// Reports unhealthy while the marker file exists, so load balancers can be
/// told to move traffic away without stopping the process. The marker is
/// looked for on a background task; a health query only reads the last answer.
#[derive(Debug)]
pub struct Drain {
    name: String,
    marker: Watch,
}

impl Drain {
    /// Start watching `path`, checking for it every `interval`
    #[must_use]
    pub fn spawn(name: String, path: PathBuf, interval: Duration) -> Arc<Self> {
        let initial = !path.exists();
        let label = format!("{name} (marker {})", path.display());

        let marker = Watch::spawn(label, initial, interval, move || {
            let path = path.clone();
            async move {
                match tokio::fs::try_exists(&path).await {
                    Ok(exists) => Some(!exists),
                    Err(err) => {
                        probe!("Unable to check drain marker {}: {}", path.display(), err);
                        None
                    }
                }
            }
        });

        Arc::new(Self { name, marker })
    }
}

impl HealthChecker for Drain {
    fn healthy(&self) -> bool {
        self.marker.healthy()
    }
}

impl Subsystem for Drain {
    fn name(&self) -> &str {
        &self.name
    }

    fn health_checker(self: Arc<Self>) -> Option<Arc<dyn HealthChecker>> {
        Some(self)
    }
}
