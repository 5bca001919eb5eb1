//! Background processors.
//!
//! - `WithdrawWatcher`: polls withdrawals and advances them using their
//!   wallet gateway
//! - `error_classifier`: decides whether a watcher failure aborts the tick
//! - `error_reporter`: receives every failure before that decision is acted on

pub mod error_classifier;
pub mod error_reporter;
pub mod withdraw_watcher;

pub use error_classifier::{Disposition, WatchError, classify};
pub use error_reporter::{ErrorReporter, FailureContext, TracingReporter};
pub use withdraw_watcher::{TickReport, WatchPhase, WithdrawWatcher};
