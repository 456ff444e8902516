//! Terminal UI helpers for the installation operator: a serial device picker
//! and the blocking "running" screen that shows the wall is being driven.

mod device_selector;
mod error;
mod run_until_stop;

pub use device_selector::device_selector;
pub use error::GridGuiError;
pub use run_until_stop::run_until_stop;
