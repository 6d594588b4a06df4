use std::time::Duration;

#[derive(Clone, PartialEq, Eq, Debug)]
/// Config values for [`CoalescionService`](crate::CoalescionService).
pub struct CoalescionServiceConfig {
    /// How many distinct keys may be running at once
    pub max_concurrent: Option<usize>,
    /// How long a task may run before every waiter is told it timed out
    ///
    /// Requires a Tokio runtime with the time driver enabled.
    pub timeout: Option<Duration>,
}

impl Default for CoalescionServiceConfig {
    fn default() -> Self {
        Self {
            max_concurrent: Some(100),
            timeout: None,
        }
    }
}
