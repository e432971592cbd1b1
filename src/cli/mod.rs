//! CLI command handling

pub mod auth;
pub mod notion;
pub mod output;
pub mod posts;

pub use auth::*;
pub use notion::*;
pub use output::*;
pub use posts::*;
