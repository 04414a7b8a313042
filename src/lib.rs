//! Propbench: bench-test console for motor/propeller combinations
//!
//! The library drives a measurement device over a serial line: it enumerates
//! ports, sends the `TEST`/`START` line commands, classifies the replies, and
//! optionally collects the `rpm,moment,thrust` sample stream into a telemetry
//! buffer. Alongside it sits a watcher over the flat test-history log and the
//! engine/propeller catalog files.
//!
//! Front-ends talk to the core through the channel bus in [`core::bus`]; the
//! command-line front-end lives in [`cli`].

#[doc(hidden)]
pub mod boot;
pub mod cli;
pub mod core;
pub mod protocol;
pub mod utils;
