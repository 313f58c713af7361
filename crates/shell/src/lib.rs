//! HTTP shell: serves CampEase routes behind the route guard.

pub mod app;
pub mod config;
pub mod middleware;

pub use app::build_app;
pub use config::{ConfigError, ShellConfig};
pub use middleware::ShellState;
