//! Console harness that exercises the message routing end to end.

pub mod config;
pub mod harness;

pub use config::AppConfig;
pub use harness::Harness;
