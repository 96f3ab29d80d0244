//! Server wiring: configuration, state, caller identity

pub mod caller;
pub mod config;
pub mod state;

pub use caller::Caller;
pub use config::Config;
pub use state::AppState;
