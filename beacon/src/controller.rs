use std::{path::PathBuf, sync::Arc};

use beacon_common::{
    Signal, lifecycle, logging,
    traits::{Lifecycle, Subsystem},
};
use beacon_health::HealthLifecycle;
use tokio::sync::{Mutex, broadcast};

use crate::{config::Config, signals, subsystems};

/// The configuration currently in force and what was built from it
struct Active {
    config: Config,
    subsystems: Vec<Arc<dyn Subsystem>>,
}

/// Runs the subsystems described by one configuration file and fires the
/// lifecycle hooks as that file is loaded, reloaded and finally let go
pub struct Beacon {
    path: PathBuf,
    health: Option<Arc<HealthLifecycle>>,
    hooks: Vec<Arc<dyn Lifecycle>>,
    active: Mutex<Active>,
    signals: broadcast::Sender<Signal>,
}

impl Beacon {
    ///
    /// Load the configuration at `path` and build its subsystems
    ///
    /// # Errors
    /// If the configuration cannot be read, parsed or built
    ///
    pub async fn load(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let config = Config::load(&path).await?;

        Self::from_config(path, config)
    }

    ///
    /// Build from an already parsed configuration; `path` is re-read on reload
    ///
    /// # Errors
    /// If a subsystem fails to build
    ///
    pub fn from_config(path: impl Into<PathBuf>, config: Config) -> anyhow::Result<Self> {
        let subsystems = subsystems::build_all(&config.subsystems)?;

        let health = config
            .health
            .clone()
            .map(|health| Arc::new(HealthLifecycle::new(health)));

        let hooks = health
            .iter()
            .map(|health| Arc::clone(health) as Arc<dyn Lifecycle>)
            .collect();

        let (signals, _) = broadcast::channel(16);

        Ok(Self {
            path: path.into(),
            health,
            hooks,
            active: Mutex::new(Active { config, subsystems }),
            signals,
        })
    }

    /// The health endpoint, when the configuration asks for one
    #[must_use]
    pub const fn health(&self) -> Option<&Arc<HealthLifecycle>> {
        self.health.as_ref()
    }

    /// Sender that drives [`Beacon::run`]; OS signals are forwarded into it
    #[must_use]
    pub fn signals(&self) -> broadcast::Sender<Signal> {
        self.signals.clone()
    }

    ///
    /// Fire the startup hooks for the loaded configuration
    ///
    /// # Errors
    /// If any hook fails, e.g. the health address cannot be bound
    ///
    pub async fn start(&self) -> anyhow::Result<()> {
        let active = self.active.lock().await;

        lifecycle!(
            level = INFO,
            "Starting {} subsystem(s) from {}",
            active.subsystems.len(),
            self.path.display()
        );

        for hook in &self.hooks {
            hook.on_startup(&active.subsystems).await?;
        }

        Ok(())
    }

    ///
    /// Re-read the configuration file and switch to it
    ///
    /// If the file cannot be loaded or a hook rejects it, the restart-failed
    /// hooks run against the configuration that stays active and the error is
    /// returned.
    ///
    /// # Errors
    /// Why the new configuration was not committed
    ///
    pub async fn reload(&self) -> anyhow::Result<()> {
        let mut active = self.active.lock().await;
        lifecycle!(level = INFO, "Reloading {}", self.path.display());

        let reloaded = match self.prepare(&active).await {
            Ok(reloaded) => reloaded,
            Err(err) => {
                self.roll_back(&active).await;
                return Err(err);
            }
        };

        if reloaded.config.health != active.config.health {
            lifecycle!(
                level = WARN,
                "Health settings changed in {}; they take effect on restart",
                self.path.display()
            );
        }

        for hook in &self.hooks {
            if let Err(err) = hook.on_reload(&reloaded.subsystems).await {
                self.roll_back(&active).await;
                return Err(err);
            }
        }

        *active = reloaded;
        lifecycle!(level = INFO, "Reload complete");

        Ok(())
    }

    /// Load the file again and build its subsystems, carrying over unchanged ones
    async fn prepare(&self, active: &Active) -> anyhow::Result<Active> {
        let config = Config::load(&self.path).await?;
        let subsystems = subsystems::rebuild(
            &config.subsystems,
            active.config.subsystems.iter().zip(&active.subsystems),
        )?;

        Ok(Active { config, subsystems })
    }

    async fn roll_back(&self, active: &Active) {
        lifecycle!(level = WARN, "Reload failed, keeping the active configuration");

        for hook in &self.hooks {
            if let Err(err) = hook.on_restart_failed(&active.subsystems).await {
                lifecycle!(level = ERROR, "Restart-failed hook errored: {:#}", err);
            }
        }
    }

    ///
    /// Fire the final shutdown hooks and drop every subsystem
    ///
    /// Blocks for the health endpoint's lameduck period, if any.
    ///
    /// # Errors
    /// The first hook error; every hook still runs
    ///
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        let mut result = Ok(());

        for hook in &self.hooks {
            if let Err(err) = hook.on_final_shutdown().await {
                lifecycle!(level = ERROR, "Shutdown hook errored: {:#}", err);
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }

        self.active.lock().await.subsystems.clear();

        result
    }

    ///
    /// Start, then follow [`Signal`]s until told to shut down
    ///
    /// A second Ctrl+C during shutdown abandons the lameduck wait.
    ///
    /// # Errors
    /// If startup or shutdown fails. Failed reloads are logged and survived.
    ///
    pub async fn run(&self) -> anyhow::Result<()> {
        logging::init();

        let mut receiver = self.signals.subscribe();
        self.start().await?;

        let forwarder = tokio::spawn(signals::forward(self.signals.clone()));

        loop {
            match receiver.recv().await {
                Ok(Signal::Reload) => {
                    if let Err(err) = self.reload().await {
                        lifecycle!(level = ERROR, "Reload failed: {:#}", err);
                    }
                }
                Ok(Signal::Shutdown) | Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(_)) => {}
            }
        }

        lifecycle!(level = INFO, "Shutting down...");

        let ret = tokio::select! {
            r = self.shutdown() => r,
            _ = tokio::signal::ctrl_c() => {
                lifecycle!(level = WARN, "Forcing shutdown");
                Ok(())
            }
        };

        forwarder.abort();

        ret
    }
}
