//! taskdeck — tagged task runner and project scaffold tooling.
//!
//! Provides a declarative task catalog with interpreter-matrix expansion,
//! git hook patching for virtual environments, and setup/release
//! orchestration for the wrapped project.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod hooks;
pub mod observability;
pub mod release;
pub mod runner;
pub mod setup;
pub mod task;
