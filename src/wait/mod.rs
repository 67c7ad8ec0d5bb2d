pub mod condition;
pub mod engine;
pub mod error;
pub mod gate;
pub mod log;
pub mod poll;

pub use condition::is_satisfied;
pub use engine::{HookContext, WaitHook, build_selector};
pub use error::{Error, Result, WaitError};
pub use gate::WarningGate;
pub use log::{TracingLog, WaitLog};
pub use poll::Poller;
