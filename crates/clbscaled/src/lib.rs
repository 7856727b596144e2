//! clbscaled — daemon wiring for the CLB external scaler.
//!
//! The binary in `main.rs` assembles these pieces; they live in a library
//! so the configuration and the health router can be tested directly.

pub mod config;
pub mod health;

pub use config::Config;
pub use health::{Readiness, build_router};
