mod auth;
mod service;

pub use auth::*;
pub use service::*;
