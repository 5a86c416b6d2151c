//! Pieces shared by every beacon crate: the broadcast [`Signal`], logging
//! setup, and the capability traits subsystems implement.

pub mod logging;
pub mod traits;

pub use tracing;

/// Control signal broadcast from the host to long-running tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Stop accepting work and finish up
    Shutdown,
    /// Re-read configuration
    Reload,
}
