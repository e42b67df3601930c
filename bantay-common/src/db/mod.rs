//! Database initialization, settings and contention handling

pub mod init;
pub mod retry;
pub mod settings;

pub use init::*;
pub use retry::*;
pub use settings::*;
