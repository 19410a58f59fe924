//! Command implementations

pub mod diagnose;
pub mod version;

pub use diagnose::*;
pub use version::*;
