mod context;
mod down;
mod plan;
mod port;
mod run;
mod services;
mod up;
mod validate;

pub use context::Context;
pub use down::run_down;
pub use plan::run_plan;
pub use port::run_port;
pub use run::run_workflow;
pub use services::run_services;
pub use up::run_up;
pub use validate::run_validate;
