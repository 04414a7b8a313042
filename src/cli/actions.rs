use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::Serialize;
use std::io;

use crate::{
    cli::{
        config::ConsoleConfig,
        ui::{history_lines, status_line, TextRenderer},
    },
    core::{
        catalog::{CatalogKind, CatalogRecord, CatalogStore},
        history::{seed_history, HistoryError, HistoryPoll, HistoryWatcher, TestRecord},
        session::{SessionController, SessionOutcome, Severity},
        telemetry::TelemetryBuffer,
    },
    protocol::{DeviceLink, Opener, SerialOpener},
    utils::ports::{list_ports, PortSelection},
};

#[derive(Serialize)]
struct OutcomeJson<'a> {
    port: &'a str,
    outcome: &'a SessionOutcome,
    severity: Severity,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Run every one-shot action requested on the command line.
///
/// Returns `Ok(None)` when nothing one-shot was asked for, otherwise the exit code.
pub fn run_one_shot(matches: &ArgMatches, config: &ConsoleConfig) -> Result<Option<i32>> {
    let json = matches.get_flag("json");
    let mut handled = false;
    let mut exit_code = 0;

    if matches.get_flag("print-config") {
        print!("{}", config.to_toml().context("Failed to render config")?);
        handled = true;
    }

    if matches.get_flag("seed-history") {
        if seed_history(&config.history_file)
            .with_context(|| format!("Failed to seed {}", config.history_file.display()))?
        {
            println!("Seeded {}", config.history_file.display());
        } else {
            println!("{} already exists", config.history_file.display());
        }
        handled = true;
    }

    let store = config.catalog_store();
    for (flag, kind) in [
        ("add-engine", CatalogKind::Engine),
        ("add-propeller", CatalogKind::Propeller),
    ] {
        if let Some(csv) = matches.get_one::<String>(flag) {
            add_catalog_record(&store, kind, csv)?;
            handled = true;
        }
    }
    for (flag, kind) in [
        ("engines", CatalogKind::Engine),
        ("propellers", CatalogKind::Propeller),
    ] {
        if matches.get_flag(flag) {
            print_catalog(&store, kind, json)?;
            handled = true;
        }
    }

    if matches.get_flag("list-ports") {
        print_ports(json)?;
        handled = true;
    }

    if matches.get_flag("history") {
        let mut watcher = config.history_watcher();
        if !print_history(&mut watcher, json)? {
            exit_code = 1;
        }
        handled = true;
    }

    let controller = SessionController::new(DeviceLink::new(SerialOpener, config.link_settings()));
    if let Some(port) = matches.get_one::<String>("check-port") {
        let outcome = check_port(&controller, port, json)?;
        if !outcome.is_success() {
            exit_code = 1;
        }
        handled = true;
    }
    if let Some(port) = matches.get_one::<String>("run-test") {
        let outcome = if matches.get_flag("acquire") {
            let telemetry = TelemetryBuffer::new();
            run_test_acquiring(&controller, port, config, &telemetry, json)?
        } else {
            run_test(&controller, port, json)?
        };
        if !outcome.is_success() {
            exit_code = 1;
        }
        handled = true;
    }

    Ok(handled.then_some(exit_code))
}

pub fn print_ports(json: bool) -> Result<()> {
    let ports = list_ports();
    if json {
        print_json(&ports.entries())
    } else {
        for entry in ports.entries() {
            println!("{entry}");
        }
        Ok(())
    }
}

fn report_outcome(port: &str, outcome: &SessionOutcome, json: bool) -> Result<()> {
    if json {
        print_json(&OutcomeJson {
            port,
            outcome,
            severity: outcome.severity(),
        })
    } else {
        println!("{}", status_line(outcome));
        Ok(())
    }
}

pub fn check_port<O: Opener>(
    controller: &SessionController<O>,
    port: &str,
    json: bool,
) -> Result<SessionOutcome> {
    let outcome = controller.check_port(&PortSelection::from_entry(port));
    report_outcome(port, &outcome, json)?;
    Ok(outcome)
}

pub fn run_test<O: Opener>(
    controller: &SessionController<O>,
    port: &str,
    json: bool,
) -> Result<SessionOutcome> {
    let outcome = controller.run_test(&PortSelection::from_entry(port));
    report_outcome(port, &outcome, json)?;
    Ok(outcome)
}

pub fn run_test_acquiring<O: Opener>(
    controller: &SessionController<O>,
    port: &str,
    config: &ConsoleConfig,
    telemetry: &TelemetryBuffer,
    json: bool,
) -> Result<SessionOutcome> {
    let (outcome, frame) = controller
        .run_test_acquiring(&PortSelection::from_entry(port), &config.acquisition_limits());
    report_outcome(port, &outcome, json)?;
    if let Some(frame) = frame {
        telemetry.replace(frame);
        if json {
            print_json(&*telemetry.snapshot())?;
        } else {
            telemetry.render_to(&mut TextRenderer::new(io::stdout().lock()))?;
        }
    }
    Ok(outcome)
}

/// Print one history poll. Returns `false` when the log could not be parsed.
pub fn print_history(watcher: &mut HistoryWatcher, json: bool) -> Result<bool> {
    let records: Vec<TestRecord> = match watcher.poll() {
        Ok(HistoryPoll::Refreshed(records)) => records,
        Ok(HistoryPoll::Empty | HistoryPoll::Unchanged) => Vec::new(),
        Err(err @ HistoryError::Corrupt { .. }) => {
            eprintln!("{err}");
            return Ok(false);
        }
        Err(err) => return Err(err.into()),
    };
    if json {
        print_json(&records)?;
    } else {
        for line in history_lines(&records) {
            println!("{line}");
        }
    }
    Ok(true)
}

fn print_catalog(store: &CatalogStore, kind: CatalogKind, json: bool) -> Result<()> {
    let choices = store.names(kind)?;
    if json {
        return print_json(&choices);
    }
    for entry in choices.entries(kind) {
        println!("{entry}");
    }
    Ok(())
}

fn add_catalog_record(store: &CatalogStore, kind: CatalogKind, csv: &str) -> Result<()> {
    let record = CatalogRecord::parse_line(csv);
    anyhow::ensure!(
        !record.name.trim().is_empty(),
        "{kind:?} record needs a name as its first field"
    );
    store.append(kind, &record)?;
    println!(
        "Added {} ({} {}, {} {})",
        record.name,
        record.brand,
        record.model,
        kind.spec_label(),
        record.spec_value
    );
    Ok(())
}
