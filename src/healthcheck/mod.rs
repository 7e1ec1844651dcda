//! Readiness probes.

mod checker;
mod tcp;

pub use checker::*;
pub use tcp::*;
