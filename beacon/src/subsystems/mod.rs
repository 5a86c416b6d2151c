//! Subsystems the host can run
//!
//! Each configured entry becomes one [`Subsystem`]. Those that can judge
//! their own health also implement [`HealthChecker`](beacon_common::traits::HealthChecker)
//! and are picked up by the health endpoint without further wiring.

mod drain;
mod probe;
mod watch;

use std::{path::PathBuf, sync::Arc, time::Duration};

use beacon_common::traits::Subsystem;
use serde::Deserialize;

pub use self::{drain::Drain, probe::Probe};
use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub enum SubsystemConfig {
    /// Unhealthy while `path` exists
    Drain {
        name: String,
        path: PathBuf,

        /// Default: 1000 milliseconds
        #[serde(default = "defaults::drain_interval_ms")]
        interval_ms: u64,
    },

    /// Unhealthy while a TCP connection to `address` cannot be made
    Probe {
        name: String,
        address: String,

        /// Default: 5 seconds
        #[serde(default = "defaults::probe_interval_secs")]
        interval_secs: u64,

        /// Default: 1000 milliseconds
        #[serde(default = "defaults::probe_timeout_ms")]
        timeout_ms: u64,
    },
}

mod defaults {
    pub const fn drain_interval_ms() -> u64 {
        1000
    }

    pub const fn probe_interval_secs() -> u64 {
        5
    }

    pub const fn probe_timeout_ms() -> u64 {
        1000
    }
}

impl SubsystemConfig {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Drain { name, .. } | Self::Probe { name, .. } => name,
        }
    }

    ///
    /// Instantiate the configured subsystem
    ///
    /// Every subsystem starts its background task straight away, so this must
    /// be called from within a Tokio runtime.
    ///
    /// # Errors
    /// If the entry has an empty name or out of range values
    ///
    pub fn build(&self) -> Result<Arc<dyn Subsystem>, ConfigError> {
        let invalid = |reason: &str| ConfigError::Subsystem {
            name: self.name().to_string(),
            reason: reason.to_string(),
        };

        if self.name().is_empty() {
            return Err(invalid("name must not be empty"));
        }

        match self {
            Self::Drain {
                name,
                path,
                interval_ms,
            } => {
                if *interval_ms == 0 {
                    return Err(invalid("interval_ms must be greater than zero"));
                }

                Ok(Drain::spawn(
                    name.clone(),
                    path.clone(),
                    Duration::from_millis(*interval_ms),
                ))
            }
            Self::Probe {
                name,
                address,
                interval_secs,
                timeout_ms,
            } => {
                if address.is_empty() {
                    return Err(invalid("address must not be empty"));
                }
                if *interval_secs == 0 {
                    return Err(invalid("interval_secs must be greater than zero"));
                }
                if *timeout_ms == 0 {
                    return Err(invalid("timeout_ms must be greater than zero"));
                }

                Ok(Probe::spawn(
                    name.clone(),
                    address.clone(),
                    Duration::from_secs(*interval_secs),
                    Duration::from_millis(*timeout_ms),
                ))
            }
        }
    }
}

///
/// Build every configured subsystem, keeping the configured order
///
/// # Errors
/// On the first entry that fails to build. Anything built before it is dropped.
///
pub fn build_all(configs: &[SubsystemConfig]) -> Result<Vec<Arc<dyn Subsystem>>, ConfigError> {
    configs.iter().map(SubsystemConfig::build).collect()
}

///
/// Build `configs`, carrying over every `active` subsystem whose entry is unchanged
///
/// A carried over subsystem keeps its background task and last result, so an
/// unchanged probe does not drop back to unhealthy on reload. Each active
/// subsystem is carried over at most once.
///
/// # Errors
/// On the first new or changed entry that fails to build
///
pub fn rebuild<'a>(
    configs: &[SubsystemConfig],
    active: impl IntoIterator<Item = (&'a SubsystemConfig, &'a Arc<dyn Subsystem>)>,
) -> Result<Vec<Arc<dyn Subsystem>>, ConfigError> {
    let mut unclaimed = active.into_iter().map(Some).collect::<Vec<_>>();

    configs
        .iter()
        .map(|config| {
            let carried = unclaimed
                .iter_mut()
                .find(|slot| slot.is_some_and(|(active, _)| active == config))
                .and_then(Option::take);

            carried.map_or_else(|| config.build(), |(_, subsystem)| Ok(Arc::clone(subsystem)))
        })
        .collect()
}
