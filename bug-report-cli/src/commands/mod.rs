//! CLI command handlers

pub mod check;
pub mod collect;

pub use check::run_check;
pub use collect::run_collect;
