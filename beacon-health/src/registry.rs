//! The set of health checkers the endpoint consults
//!
//! The registry publishes an immutable snapshot behind an [`ArcSwap`].
//! Population builds a complete new list and swaps it in with a single
//! store, so a request sees either the old list or the new one in full.
//! A request that loaded the old snapshot finishes against it.

use std::sync::Arc;

use arc_swap::ArcSwap;
use beacon_common::traits::Subsystem;

use crate::checker::{Health, NamedChecker, aggregate};

/// Point-in-time list of checkers
pub type Snapshot = Arc<Vec<NamedChecker>>;

#[derive(Debug)]
pub struct Registry {
    snapshot: ArcSwap<Vec<NamedChecker>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// An empty registry, which reports healthy
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// The current snapshot
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.load_full()
    }

    /// Publish `checkers` as the new snapshot
    pub fn replace(&self, checkers: Vec<NamedChecker>) {
        self.snapshot.store(Arc::new(checkers));
    }

    /// Rebuild the snapshot from every subsystem that is a health checker
    ///
    /// Subsystems without the capability are skipped. The enumeration order
    /// of `subsystems` is kept. Returns the number of checkers published.
    pub fn populate(&self, subsystems: &[Arc<dyn Subsystem>]) -> usize {
        let checkers = subsystems
            .iter()
            .filter_map(|subsystem| {
                Arc::clone(subsystem)
                    .health_checker()
                    .map(|checker| NamedChecker::new(subsystem.name(), checker))
            })
            .collect::<Vec<_>>();

        let count = checkers.len();
        tracing::debug!(
            checkers = ?checkers.iter().map(NamedChecker::name).collect::<Vec<_>>(),
            "Health checkers populated"
        );

        self.replace(checkers);
        count
    }

    /// Aggregate the current snapshot
    #[must_use]
    pub fn check(&self) -> Health {
        aggregate(&self.snapshot.load())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use beacon_common::traits::HealthChecker;

    use super::*;

    struct Flagged {
        name: &'static str,
        healthy: AtomicBool,
    }

    impl Flagged {
        fn new(name: &'static str, healthy: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                healthy: AtomicBool::new(healthy),
            })
        }
    }

    impl HealthChecker for Flagged {
        fn healthy(&self) -> bool {
            self.healthy.load(Ordering::Relaxed)
        }
    }

    impl Subsystem for Flagged {
        fn name(&self) -> &str {
            self.name
        }

        fn health_checker(self: Arc<Self>) -> Option<Arc<dyn HealthChecker>> {
            Some(self)
        }
    }

    struct Plain;

    impl Subsystem for Plain {
        fn name(&self) -> &str {
            "plain"
        }
    }

    #[test]
    fn test_empty_registry_is_healthy() {
        let registry = Registry::new();
        assert!(registry.snapshot().is_empty());
        assert_eq!(registry.check(), Health::Healthy);
    }

    #[test]
    fn test_populate_only_picks_health_checkers() {
        let registry = Registry::new();
        let subsystems: Vec<Arc<dyn Subsystem>> = vec![
            Flagged::new("foo", true),
            Arc::new(Plain),
            Flagged::new("bar", false),
        ];

        assert_eq!(registry.populate(&subsystems), 2);

        let names = registry
            .snapshot()
            .iter()
            .map(|nc| nc.name().to_string())
            .collect::<Vec<_>>();
        assert_eq!(names, ["foo", "bar"]);
        assert_eq!(registry.check(), Health::Unhealthy("bar".into()));
    }

    #[test]
    fn test_checkers_are_shared_not_copied() {
        let registry = Registry::new();
        let foo = Flagged::new("foo", true);
        let subsystems: Vec<Arc<dyn Subsystem>> = vec![foo.clone()];
        registry.populate(&subsystems);

        assert_eq!(registry.check(), Health::Healthy);
        foo.healthy.store(false, Ordering::Relaxed);
        assert_eq!(registry.check(), Health::Unhealthy("foo".into()));
    }

    #[test]
    fn test_old_snapshots_survive_replacement() {
        let registry = Registry::new();
        registry.populate(&[Flagged::new("old", false) as Arc<dyn Subsystem>]);

        let held = registry.snapshot();
        registry.populate(&[Flagged::new("new", false) as Arc<dyn Subsystem>]);

        assert_eq!(aggregate(&held), Health::Unhealthy("old".into()));
        assert_eq!(registry.check(), Health::Unhealthy("new".into()));
    }

    #[test]
    fn test_repopulating_with_nothing_clears() {
        let registry = Registry::new();
        registry.populate(&[Flagged::new("foo", false) as Arc<dyn Subsystem>]);
        assert_eq!(registry.populate(&[]), 0);
        assert_eq!(registry.check(), Health::Healthy);
    }
}
