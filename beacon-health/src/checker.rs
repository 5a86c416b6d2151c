//! Health check aggregation

use std::{fmt, sync::Arc};

use beacon_common::traits::HealthChecker;

/// A [`HealthChecker`] paired with the name of the subsystem providing it
#[derive(Clone)]
pub struct NamedChecker {
    name: String,
    checker: Arc<dyn HealthChecker>,
}

impl NamedChecker {
    #[must_use]
    pub fn new(name: impl Into<String>, checker: Arc<dyn HealthChecker>) -> Self {
        Self {
            name: name.into(),
            checker,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn healthy(&self) -> bool {
        self.checker.healthy()
    }
}

impl fmt::Debug for NamedChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedChecker")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Outcome of asking every registered checker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    /// Every checker reported healthy, or there were none
    Healthy,

    /// Comma separated names of the unhealthy checkers, in registration order
    Unhealthy(String),
}

impl Health {
    /// Split into the overall verdict and the detail string
    ///
    /// The detail is empty when healthy.
    #[must_use]
    pub fn into_parts(self) -> (bool, String) {
        match self {
            Self::Healthy => (true, String::new()),
            Self::Unhealthy(names) => (false, names),
        }
    }
}

/// Query every checker in order and collect the ones reporting unhealthy
///
/// Every checker is called, even after one has failed. Names are neither
/// sorted nor deduplicated. A panicking checker is not caught here.
#[must_use]
pub fn aggregate(checkers: &[NamedChecker]) -> Health {
    let unhealthy = checkers
        .iter()
        .filter(|nc| !nc.healthy())
        .map(NamedChecker::name)
        .collect::<Vec<_>>();

    if unhealthy.is_empty() {
        Health::Healthy
    } else {
        tracing::debug!(unhealthy = ?unhealthy, "Health check failed");
        Health::Unhealthy(unhealthy.join(","))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn fixed(name: &str, healthy: bool) -> NamedChecker {
        NamedChecker::new(name, Arc::new(move || healthy))
    }

    #[test]
    fn test_empty_is_healthy() {
        assert_eq!(aggregate(&[]), Health::Healthy);
        assert_eq!(aggregate(&[]).into_parts(), (true, String::new()));
    }

    #[test]
    fn test_all_healthy_is_healthy() {
        let checkers = (0..16)
            .map(|i| fixed(&format!("c{i}"), true))
            .collect::<Vec<_>>();
        assert_eq!(aggregate(&checkers), Health::Healthy);
    }

    #[test]
    fn test_single_unhealthy_is_named() {
        let checkers = [fixed("foo", true), fixed("bar", false)];
        assert_eq!(aggregate(&checkers).into_parts(), (false, "bar".into()));
    }

    #[test]
    fn test_names_keep_registration_order() {
        let checkers = [
            fixed("foo", false),
            fixed("ok", true),
            fixed("bar", false),
            fixed("foo", false),
        ];
        assert_eq!(
            aggregate(&checkers),
            Health::Unhealthy("foo,bar,foo".into())
        );
    }

    #[test]
    fn test_every_checker_is_queried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counting = |healthy: bool| {
            let calls = Arc::clone(&calls);
            move || {
                calls.fetch_add(1, Ordering::Relaxed);
                healthy
            }
        };

        let checkers = [
            NamedChecker::new("a", Arc::new(counting(false))),
            NamedChecker::new("b", Arc::new(counting(false))),
            NamedChecker::new("c", Arc::new(counting(true))),
        ];

        assert_eq!(aggregate(&checkers), Health::Unhealthy("a,b".into()));
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }
}
