//! Hooks — virtual-environment activation patching for pre-commit git hooks.

pub mod venv;

pub use venv::{patch_hooks, EnvDescriptor};
