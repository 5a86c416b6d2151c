pub mod health;
pub mod lifecycle;
pub mod subsystem;

pub use self::{health::HealthChecker, lifecycle::Lifecycle, subsystem::Subsystem};
