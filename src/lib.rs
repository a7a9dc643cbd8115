pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod server;
pub mod types;

pub use agent::{MessageRouter, Reply, Route, SessionStore, TemplateSelector};
pub use cli::run_cli;
pub use config::Config;
pub use error::{Error, ProviderError, Result};
pub use server::{build_router, run_server, AppState};
