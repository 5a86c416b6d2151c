/// Capability for subsystems that can report their own liveness
///
/// [`HealthChecker::healthy`] is called on every request to the health
/// endpoint, possibly from many tasks at once. Implementations must be safe
/// to call concurrently, must return quickly without blocking I/O, and must
/// not panic. Nothing upstream wraps the call in a timeout or recovers from a
/// panic, so one slow checker delays the whole health response.
pub trait HealthChecker: Send + Sync {
    fn healthy(&self) -> bool;
}

impl<F> HealthChecker for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn healthy(&self) -> bool {
        self()
    }
}
