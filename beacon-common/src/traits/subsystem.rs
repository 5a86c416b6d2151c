use std::sync::Arc;

use super::HealthChecker;

/// A named unit of work instantiated by the host from its configuration
///
/// Subsystems take part in health reporting by overriding
/// [`Subsystem::health_checker`] to hand back themselves; nothing else needs
/// to be registered anywhere.
///
/// ```
/// use std::sync::Arc;
/// use beacon_common::traits::{HealthChecker, Subsystem};
///
/// struct Cache;
///
/// impl HealthChecker for Cache {
///     fn healthy(&self) -> bool {
///         true
///     }
/// }
///
/// impl Subsystem for Cache {
///     fn name(&self) -> &str {
///         "cache"
///     }
///
///     fn health_checker(self: Arc<Self>) -> Option<Arc<dyn HealthChecker>> {
///         Some(self)
///     }
/// }
///
/// let cache: Arc<dyn Subsystem> = Arc::new(Cache);
/// assert!(cache.health_checker().is_some());
/// ```
pub trait Subsystem: Send + Sync {
    /// The name this subsystem was declared with
    fn name(&self) -> &str;

    /// This subsystem viewed as a [`HealthChecker`], if it is one
    fn health_checker(self: Arc<Self>) -> Option<Arc<dyn HealthChecker>> {
        None
    }
}
