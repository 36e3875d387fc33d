mod config;
mod error;
mod types;

pub use config::{AuthConfig, Config, DbConfig, ServerConfig, StaticToken};
pub use error::{ConflictInfo, Error};
pub use types::*;
