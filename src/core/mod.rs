//! Core bench-test logic
//!
//! UI-independent pieces shared by every front-end:
//! - Test session controller (check-port / run-test)
//! - History log watcher
//! - Telemetry buffer and render hook
//! - Engine/propeller catalogs
//! - Message bus and runtime threads
//! - Status log
pub mod bus;
pub mod catalog;
pub mod history;
pub mod logs;
pub mod runtime;
pub mod session;
pub mod telemetry;

pub use bus::{Bus, CoreToUi, UiToCore};
pub use history::{HistoryPoll, HistoryWatcher, TestRecord};
pub use runtime::{CoreHandle, CoreRuntimeConfig};
pub use session::{Action, SessionController, SessionOutcome, Severity};
pub use telemetry::{Renderer, TelemetryBuffer, TelemetryFrame};
