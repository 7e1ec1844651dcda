//! Configuration parsing and types.
//!
//! - `types` - root [`Config`], readiness and workflow sections
//! - `service` - service entries, port mappings and environment lists
//! - `preset` - built-in service presets
//! - `duration` - "200ms" / "60s" style durations
//! - `parser` - locating and parsing `topology.yaml`
//! - `validation` - whole-config checks

mod duration;
mod parser;
mod preset;
mod service;
mod types;
mod validation;

pub use duration::*;
pub use parser::*;
pub use preset::*;
pub use service::*;
pub use types::*;
