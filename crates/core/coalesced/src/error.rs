use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
/// Coalescion service error.
pub enum Error<E> {
    /// The task itself failed, every waiter receives the same error
    Producer(E),
    /// The key is empty or whitespace
    InvalidKey,
    /// Reached the `max_concurrent` amount of tasks running at once
    MaxConcurrent { max: usize },
    /// The task did not settle within the configured timeout
    Timeout,
    /// The task was dropped or panicked before it could settle
    Abandoned,
}

impl<E> Error<E> {
    /// Take the task error out, if that is what this is
    pub fn into_producer(self) -> Option<E> {
        match self {
            Error::Producer(error) => Some(error),
            _ => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Producer(error) => write!(f, "Task failed: {error}"),
            Error::InvalidKey => write!(f, "Key must not be empty"),
            Error::MaxConcurrent { max } => {
                write!(f, "Max number of tasks running at once ({max})")
            }
            Error::Timeout => write!(f, "Task did not settle in time"),
            Error::Abandoned => write!(f, "Task was dropped before it settled"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for Error<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Producer(error) => Some(error),
            _ => None,
        }
    }
}
