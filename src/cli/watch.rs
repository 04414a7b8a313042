//! Interactive console
//!
//! Starts the core runtime, prints every history refresh and action status,
//! and reads commands from stdin:
//!
//! ```text
//! ports              rescan serial ports
//! select <port>      change the selected port
//! check [port]       send TEST
//! run [port]         send START
//! acquire [port]     send START and plot the sample stream
//! log                show recent status entries
//! quit
//! ```

use anyhow::Result;
use std::{
    io::{self, BufRead},
    sync::Arc,
    thread,
    time::Duration,
};

use crate::{
    cli::{
        config::ConsoleConfig,
        ui::{history_lines, status_line, TextRenderer},
    },
    core::{
        bus::{CoreToUi, UiToCore},
        logs::{LogBuffer, LogEntry, LogLevel, LogMetadata},
        runtime::{initial_selection, CoreHandle},
        session::SessionController,
        telemetry::{Renderer, TelemetryBuffer},
    },
    protocol::{DeviceLink, SerialOpener},
    utils::ports::PortSelection,
};

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Send(UiToCore),
    Rescan,
    Select(PortSelection),
    ShowLog,
    Help,
    Quit,
}

pub fn parse_console_command(line: &str, selected: &PortSelection) -> Option<ConsoleCommand> {
    let line = line.trim();
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    if verb.is_empty() {
        return None;
    }
    // Port names are taken verbatim so the listed sentinel maps back to NoPorts.
    let rest = rest.trim();
    let target = if rest.is_empty() {
        selected.clone()
    } else {
        PortSelection::from_entry(rest)
    };
    let cmd = match verb {
        "ports" => ConsoleCommand::Rescan,
        "select" => ConsoleCommand::Select(target),
        "check" => ConsoleCommand::Send(UiToCore::CheckPort(target)),
        "run" => ConsoleCommand::Send(UiToCore::RunTest {
            selection: target,
            acquire: false,
        }),
        "acquire" => ConsoleCommand::Send(UiToCore::RunTest {
            selection: target,
            acquire: true,
        }),
        "log" => ConsoleCommand::ShowLog,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        _ => return None,
    };
    Some(cmd)
}

fn describe(selection: &PortSelection) -> &str {
    match selection {
        PortSelection::Port(port) => port,
        PortSelection::NoPorts => crate::utils::ports::NO_PORTS_SENTINEL,
    }
}

pub fn start(config: &ConsoleConfig) -> Result<()> {
    let telemetry = Arc::new(TelemetryBuffer::new());
    let controller = SessionController::new(DeviceLink::new(SerialOpener, config.link_settings()));
    let core = CoreHandle::start(
        controller,
        Arc::clone(&telemetry),
        config.history_watcher(),
        config.runtime_config(),
    );

    let mut selected = initial_selection();
    println!("Selected port: {}", describe(&selected));
    println!("Type 'help' for commands.");

    let ui_tx = core.bus.ui_tx.clone();
    let rescan = core.bus.rescan.clone();
    let log_requests = {
        let (tx, rx) = flume::unbounded::<()>();
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match parse_console_command(&line, &selected) {
                    Some(ConsoleCommand::Send(msg)) => {
                        if ui_tx.send(msg).is_err() {
                            return;
                        }
                    }
                    Some(ConsoleCommand::Rescan) => {
                        if rescan.request(&ui_tx).is_err() {
                            return;
                        }
                    }
                    Some(ConsoleCommand::Select(selection)) => {
                        selected = selection;
                        println!("Selected port: {}", describe(&selected));
                    }
                    Some(ConsoleCommand::ShowLog) => {
                        let _ = tx.send(());
                    }
                    Some(ConsoleCommand::Help) => println!("{}", HELP),
                    Some(ConsoleCommand::Quit) => break,
                    None if line.trim().is_empty() => {}
                    None => println!("Unknown command: {}", line.trim()),
                }
            }
            let _ = ui_tx.send(UiToCore::Quit);
        });
        rx
    };

    let mut status_log = LogBuffer::new(config.status_log_capacity);
    loop {
        while log_requests.try_recv().is_ok() {
            if status_log.is_empty() {
                println!("No status entries yet.");
            }
            for entry in status_log.entries() {
                println!("{entry}");
            }
        }
        let msg = match core.bus.core_rx.recv_timeout(Duration::from_millis(200)) {
            Ok(msg) => msg,
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => break,
        };
        match msg {
            CoreToUi::Quit => break,
            CoreToUi::Ports(ports) => {
                println!("Ports:");
                let entries = ports.entries();
                for entry in &entries {
                    println!("  {entry}");
                }
                status_log.push(LogEntry::info(format!("Port scan: {}", entries.join(", "))));
            }
            CoreToUi::Status {
                action,
                selection,
                outcome,
            } => {
                let port = match selection {
                    PortSelection::Port(port) => Some(port),
                    PortSelection::NoPorts => None,
                };
                println!("{}", status_line(&outcome));
                status_log.push(LogEntry::from_outcome(action, port, &outcome));
            }
            CoreToUi::History(records) => {
                println!("Test history:");
                for line in history_lines(&records) {
                    println!("  {line}");
                }
                status_log.push(LogEntry::with_metadata(
                    format!("History refreshed ({} records)", records.len()),
                    LogLevel::Info,
                    LogMetadata::History {
                        records: records.len(),
                    },
                ));
            }
            CoreToUi::HistoryError(message) => {
                eprintln!("History unavailable: {message}");
                status_log.push(LogEntry::error(message));
            }
            CoreToUi::Telemetry(frame) => {
                TextRenderer::new(io::stdout().lock()).render(&frame.panels())?;
            }
        }
    }

    core.shutdown()
}

const HELP: &str = "\
ports              rescan serial ports
select <port>      change the selected port
check [port]       send TEST
run [port]         send START
acquire [port]     send START and plot the sample stream
log                show recent status entries
quit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_default_to_selected_port() {
        let selected = PortSelection::Port("/dev/ttyUSB0".into());
        assert_eq!(
            parse_console_command("check", &selected),
            Some(ConsoleCommand::Send(UiToCore::CheckPort(selected.clone())))
        );
        assert_eq!(
            parse_console_command("run COM4", &selected),
            Some(ConsoleCommand::Send(UiToCore::RunTest {
                selection: PortSelection::Port("COM4".into()),
                acquire: false,
            }))
        );
        assert_eq!(
            parse_console_command("acquire", &PortSelection::NoPorts),
            Some(ConsoleCommand::Send(UiToCore::RunTest {
                selection: PortSelection::NoPorts,
                acquire: true,
            }))
        );
    }

    #[test]
    fn selecting_the_sentinel_selects_nothing() {
        assert_eq!(
            parse_console_command("select No Ports Available", &PortSelection::NoPorts),
            Some(ConsoleCommand::Select(PortSelection::NoPorts))
        );
        assert_eq!(
            parse_console_command("select  /dev/ttyACM0 ", &PortSelection::NoPorts),
            Some(ConsoleCommand::Select(PortSelection::Port("/dev/ttyACM0".into())))
        );
    }

    #[test]
    fn unknown_and_blank_lines() {
        let selected = PortSelection::NoPorts;
        assert_eq!(parse_console_command("", &selected), None);
        assert_eq!(parse_console_command("launch", &selected), None);
        assert_eq!(parse_console_command("quit", &selected), Some(ConsoleCommand::Quit));
        assert_eq!(parse_console_command("ports", &selected), Some(ConsoleCommand::Rescan));
    }
}
