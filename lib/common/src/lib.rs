//! Ambient pieces shared by the crash analytics crates: run configuration,
//! tracing setup and time formatting.

pub mod config;
pub mod util;
