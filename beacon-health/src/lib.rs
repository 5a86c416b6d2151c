//! Aggregated health endpoint for beacon
//!
//! This crate serves a single HTTP route reporting whether every subsystem
//! that can check its own health currently says it is healthy.
//!
//! # Endpoint
//!
//! - **`GET /health`** returns `200` with body `OK` when every checker is
//!   healthy, or when there are none. Otherwise it returns `503` with the
//!   names of the unhealthy checkers joined by `,`, in registration order.
//!
//! # Lifecycle
//!
//! [`HealthLifecycle`] fills the [`Registry`] before binding, re-populates it
//! on reload (and again if the reload is rolled back), and on shutdown keeps
//! answering for the configured lameduck period before closing the listener.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use beacon_common::traits::Subsystem;
//! use beacon_health::{HealthConfig, HealthLifecycle};
//!
//! # async fn example(subsystems: Vec<Arc<dyn Subsystem>>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = HealthConfig::new(":8080")?.with_lameduck(Duration::from_secs(5));
//! let health = HealthLifecycle::new(config);
//!
//! health.start(&subsystems).await?;
//!
//! // ... on SIGTERM: answers for five more seconds, then closes
//! health.shutdown().await?;
//! # Ok(())
//! # }
//! ```

mod checker;
mod config;
pub mod duration;
mod error;
mod lifecycle;
mod registry;
mod server;

pub use beacon_common::traits::HealthChecker;
pub use checker::{Health, NamedChecker, aggregate};
pub use config::{DEFAULT_ADDRESS, HealthConfig};
pub use error::HealthError;
pub use lifecycle::{HealthLifecycle, Phase};
pub use registry::{Registry, Snapshot};
pub use server::{HEALTH_PATH, HealthServer, router};
