use std::sync::Arc;

use async_trait::async_trait;

use super::Subsystem;

/// Hooks the host fires as its configuration comes and goes
///
/// Each hook that takes a subsystem slice receives the set that is active
/// once the hook has run: the freshly built set for startup and reload, and
/// the still-running set when a reload was rolled back.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    ///
    /// Called once, after the initial configuration has been built
    ///
    /// # Errors
    /// If the hook cannot bring its resources up
    ///
    async fn on_startup(&self, subsystems: &[Arc<dyn Subsystem>]) -> anyhow::Result<()>;

    ///
    /// Called after a new configuration has been built, before it is committed
    ///
    /// # Errors
    /// If the hook cannot adopt the new configuration
    ///
    async fn on_reload(&self, subsystems: &[Arc<dyn Subsystem>]) -> anyhow::Result<()>;

    ///
    /// Called when a reload did not commit and the previous configuration stays
    ///
    /// # Errors
    /// If the hook cannot return to the previous configuration
    ///
    async fn on_restart_failed(&self, subsystems: &[Arc<dyn Subsystem>]) -> anyhow::Result<()>;

    ///
    /// Called once when the process is going away for good
    ///
    /// # Errors
    /// If releasing resources fails
    ///
    async fn on_final_shutdown(&self) -> anyhow::Result<()>;
}
