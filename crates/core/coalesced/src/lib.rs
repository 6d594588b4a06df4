mod config;
mod error;
mod registry;
mod service;

pub use config::CoalescionServiceConfig;
pub use error::Error;
pub use registry::{CoalescionKey, Registry};
pub use service::{CoalescionService, CoalescionStatus, InFlight};
