//! Start, reload and lameduck shutdown of the health endpoint
//!
//! ```text
//! Idle --start--> Listening --shutdown--> Draining --lameduck--> Closed
//!                  |     ^
//!                  +-----+
//!          reload / restart failed: re-populate
//! ```
//!
//! Reloads never touch the listener. While draining, the server task keeps
//! answering `/health`; only the caller of [`HealthLifecycle::shutdown`]
//! waits out the lameduck period.

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use beacon_common::{
    Signal, lifecycle,
    traits::{Lifecycle, Subsystem},
};
use parking_lot::Mutex;
use tokio::{sync::broadcast, task::JoinHandle};

use crate::{HealthConfig, HealthError, HealthServer, Registry};

/// Externally visible state of a [`HealthLifecycle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Listening,
    Draining,
    Closed,
}

enum State {
    Idle,
    Listening(Running),
    Draining,
    Closed,
}

struct Running {
    local_addr: SocketAddr,
    shutdown: broadcast::Sender<Signal>,
    task: JoinHandle<Result<(), HealthError>>,
}

impl State {
    const fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Listening(_) => Phase::Listening,
            Self::Draining => Phase::Draining,
            Self::Closed => Phase::Closed,
        }
    }

    /// `Some` while listening, `None` while idle
    fn listening_addr(&self) -> Result<Option<SocketAddr>, HealthError> {
        match self {
            Self::Idle => Ok(None),
            Self::Listening(running) => Ok(Some(running.local_addr)),
            Self::Draining | Self::Closed => Err(HealthError::Closed),
        }
    }
}

/// Marks the lifecycle closed when dropped, including when a shutdown is
/// abandoned part way through its lameduck period
struct CloseOnDrop<'a>(&'a Mutex<State>);

impl Drop for CloseOnDrop<'_> {
    fn drop(&mut self) {
        *self.0.lock() = State::Closed;
    }
}

/// Owns the checker registry and the server for the life of the process
pub struct HealthLifecycle {
    config: HealthConfig,
    registry: Arc<Registry>,
    state: Mutex<State>,
}

impl HealthLifecycle {
    #[must_use]
    pub fn new(config: HealthConfig) -> Self {
        Self {
            config,
            registry: Arc::new(Registry::new()),
            state: Mutex::new(State::Idle),
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.lock().phase()
    }

    /// The bound address, while listening
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.state.lock().listening_addr().ok().flatten()
    }

    ///
    /// Populate the registry, then bind and start serving
    ///
    /// The registry is filled before the listener exists, so `/health` can
    /// never answer from an empty set while checkers are still being wired
    /// in. Starting an endpoint that is already listening returns its
    /// address without doing anything else.
    ///
    /// # Errors
    /// [`HealthError::BindError`] if the address cannot be bound, and
    /// [`HealthError::Closed`] once shutdown has begun.
    ///
    pub async fn start(&self, subsystems: &[Arc<dyn Subsystem>]) -> Result<SocketAddr, HealthError> {
        let current = self.state.lock().listening_addr();
        if let Some(local_addr) = current? {
            return Ok(local_addr);
        }

        let checkers = self.registry.populate(subsystems);
        let server = HealthServer::bind(&self.config, Arc::clone(&self.registry)).await?;
        let local_addr = server.local_addr()?;

        let mut state = self.state.lock();
        // A concurrent start won the race; its listener is kept and ours dropped
        if let Some(existing) = state.listening_addr()? {
            return Ok(existing);
        }

        let (shutdown, receiver) = broadcast::channel(1);
        let task = tokio::spawn(server.serve(receiver));
        *state = State::Listening(Running {
            local_addr,
            shutdown,
            task,
        });
        drop(state);

        lifecycle!(
            level = INFO,
            "Health endpoint listening on {} with {} checker(s)",
            local_addr,
            checkers
        );

        Ok(local_addr)
    }

    /// Re-populate from a newly built configuration
    pub fn reload(&self, subsystems: &[Arc<dyn Subsystem>]) {
        self.repopulate(subsystems, "reload");
    }

    /// Re-populate from the configuration that stayed active after a failed reload
    pub fn restart_failed(&self, subsystems: &[Arc<dyn Subsystem>]) {
        self.repopulate(subsystems, "restart failed");
    }

    fn repopulate(&self, subsystems: &[Arc<dyn Subsystem>], reason: &str) {
        let state = self.state.lock();
        if matches!(*state, State::Draining | State::Closed) {
            drop(state);
            lifecycle!("Ignoring {}, health endpoint is shutting down", reason);
            return;
        }

        let checkers = self.registry.populate(subsystems);
        drop(state);

        lifecycle!(
            level = INFO,
            "Health checkers re-populated after {}: {} checker(s)",
            reason,
            checkers
        );
    }

    ///
    /// Stop the endpoint, keeping it reachable for the lameduck period first
    ///
    /// Only the first call does anything; later or concurrent calls return
    /// straight away. Shutting down an endpoint that never started closes it.
    /// If the returned future is dropped during the lameduck period, the
    /// listener stops accepting at that point and the phase becomes
    /// [`Phase::Closed`].
    ///
    /// # Errors
    /// If the server task failed while running.
    ///
    pub async fn shutdown(&self) -> Result<(), HealthError> {
        let running = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, State::Draining) {
                State::Listening(running) => running,
                State::Idle => {
                    *state = State::Closed;
                    return Ok(());
                }
                other => {
                    *state = other;
                    drop(state);
                    lifecycle!("Health endpoint already shutting down");
                    return Ok(());
                }
            }
        };
        let closing = CloseOnDrop(&self.state);

        let lameduck = self.config.lameduck();
        if !lameduck.is_zero() {
            lifecycle!(level = INFO, "Going into lameduck mode for {:?}", lameduck);
            tokio::time::sleep(lameduck).await;
        }

        // The server task may already be gone, in which case its result says why.
        let _ = running.shutdown.send(Signal::Shutdown);
        let result = running
            .task
            .await
            .unwrap_or_else(|e| Err(HealthError::ServerError(e.to_string())));

        drop(closing);
        lifecycle!(level = INFO, "Health endpoint closed");

        result
    }
}

impl Drop for HealthLifecycle {
    fn drop(&mut self) {
        if let State::Listening(running) = self.state.get_mut() {
            running.task.abort();
        }
    }
}

#[async_trait]
impl Lifecycle for HealthLifecycle {
    async fn on_startup(&self, subsystems: &[Arc<dyn Subsystem>]) -> anyhow::Result<()> {
        self.start(subsystems).await?;
        Ok(())
    }

    async fn on_reload(&self, subsystems: &[Arc<dyn Subsystem>]) -> anyhow::Result<()> {
        self.reload(subsystems);
        Ok(())
    }

    async fn on_restart_failed(&self, subsystems: &[Arc<dyn Subsystem>]) -> anyhow::Result<()> {
        self.restart_failed(subsystems);
        Ok(())
    }

    async fn on_final_shutdown(&self) -> anyhow::Result<()> {
        Ok(self.shutdown().await?)
    }
}
