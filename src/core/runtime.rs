//! Core runtime: the action worker and the history ticker
//!
//! Actions are handled one at a time on the worker thread, each a blocking
//! round trip bounded by the link's read timeout. The history ticker runs on
//! its own thread so a slow device never delays history refreshes.
use anyhow::{anyhow, Result};
use flume::{Receiver, RecvTimeoutError, Sender};
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use super::{
    bus::{Bus, CoreToUi, RescanGate, UiToCore},
    history::HistoryWatcher,
    session::{Action, SessionController},
    telemetry::TelemetryBuffer,
};
use crate::{
    protocol::{acquisition::AcquisitionLimits, Opener},
    utils::ports::{list_ports, PortSelection},
};

pub struct CoreRuntimeConfig {
    /// Interval between history log checks
    pub history_interval: Duration,
    /// Limits for runs started with acquisition
    pub acquisition: AcquisitionLimits,
}

impl Default for CoreRuntimeConfig {
    fn default() -> Self {
        Self {
            history_interval: Duration::from_millis(5000),
            acquisition: AcquisitionLimits::default(),
        }
    }
}

/// Serve UI requests until `Quit` arrives or the UI side disconnects.
pub fn run_core_thread<O: Opener>(
    ui_rx: Receiver<UiToCore>,
    core_tx: Sender<CoreToUi>,
    controller: SessionController<O>,
    telemetry: Arc<TelemetryBuffer>,
    acquisition: AcquisitionLimits,
    rescan: RescanGate,
) -> Result<()> {
    let send = |msg: CoreToUi| {
        core_tx
            .send(msg)
            .map_err(|err| anyhow!("Failed to send to UI: {err}"))
    };

    while let Ok(msg) = ui_rx.recv() {
        match msg {
            UiToCore::Quit => {
                log::info!("Received quit signal");
                send(CoreToUi::Quit)?;
                return Ok(());
            }
            UiToCore::RescanPorts => {
                let ports = list_ports();
                rescan.complete();
                send(CoreToUi::Ports(ports))?;
            }
            UiToCore::CheckPort(selection) => {
                let outcome = controller.check_port(&selection);
                send(CoreToUi::Status {
                    action: Action::CheckPort,
                    selection,
                    outcome,
                })?;
            }
            UiToCore::RunTest { selection, acquire } => {
                if acquire {
                    let (outcome, frame) = controller.run_test_acquiring(&selection, &acquisition);
                    send(CoreToUi::Status {
                        action: Action::RunTest,
                        selection,
                        outcome,
                    })?;
                    if let Some(frame) = frame {
                        telemetry.replace(frame);
                        send(CoreToUi::Telemetry(telemetry.snapshot()))?;
                    }
                } else {
                    let outcome = controller.run_test(&selection);
                    send(CoreToUi::Status {
                        action: Action::RunTest,
                        selection,
                        outcome,
                    })?;
                }
            }
        }
    }

    log::debug!("UI channel closed, core worker exiting");
    Ok(())
}

/// Handle to the periodic history poller.
pub struct HistoryTicker {
    stop_tx: Sender<()>,
    handle: JoinHandle<HistoryWatcher>,
}

impl HistoryTicker {
    /// Stop ticking and hand the watcher back.
    pub fn stop(self) -> Result<HistoryWatcher> {
        let _ = self.stop_tx.send(());
        self.handle
            .join()
            .map_err(|_| anyhow!("history ticker thread panicked"))
    }
}

/// Poll `watcher` immediately and then every `interval`, forwarding changes.
pub fn spawn_history_ticker(
    mut watcher: HistoryWatcher,
    interval: Duration,
    core_tx: Sender<CoreToUi>,
) -> HistoryTicker {
    let (stop_tx, stop_rx) = flume::bounded::<()>(1);
    let handle = thread::spawn(move || {
        loop {
            let msg = match watcher.poll() {
                Ok(poll) => CoreToUi::from_poll(poll),
                Err(err) => {
                    log::error!("history refresh failed: {err}");
                    Some(CoreToUi::HistoryError(err.to_string()))
                }
            };
            if let Some(msg) = msg {
                if core_tx.send(msg).is_err() {
                    log::debug!("UI channel closed, history ticker exiting");
                    break;
                }
            }
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        watcher
    });
    HistoryTicker { stop_tx, handle }
}

/// Running core: worker thread, history ticker and the UI end of the bus.
pub struct CoreHandle {
    pub bus: Bus,
    worker: JoinHandle<Result<()>>,
    ticker: HistoryTicker,
}

impl CoreHandle {
    pub fn start<O: Opener + 'static>(
        controller: SessionController<O>,
        telemetry: Arc<TelemetryBuffer>,
        watcher: HistoryWatcher,
        config: CoreRuntimeConfig,
    ) -> Self {
        let (ui_tx, ui_rx) = flume::unbounded();
        let (core_tx, core_rx) = flume::unbounded();

        let ticker = spawn_history_ticker(watcher, config.history_interval, core_tx.clone());
        let acquisition = config.acquisition;
        let rescan = RescanGate::default();
        let worker_rescan = rescan.clone();
        let worker = thread::spawn(move || {
            run_core_thread(ui_rx, core_tx, controller, telemetry, acquisition, worker_rescan)
        });

        Self {
            bus: Bus::new(core_rx, ui_tx, rescan),
            worker,
            ticker,
        }
    }

    /// Ask the worker to quit and wait for both threads.
    pub fn shutdown(self) -> Result<()> {
        let _ = self.bus.ui_tx.send(UiToCore::Quit);
        self.ticker.stop()?;
        self.worker
            .join()
            .map_err(|_| anyhow!("core worker thread panicked"))?
    }
}

/// Convenience for front-ends that start with the first enumerated port selected.
pub fn initial_selection() -> PortSelection {
    list_ports().first_selection()
}
