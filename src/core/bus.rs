use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use flume::{Receiver, Sender};

use crate::{
    core::{
        history::{HistoryPoll, TestRecord},
        session::{Action, SessionOutcome},
        telemetry::TelemetryFrame,
    },
    utils::ports::{PortSelection, Ports},
};

/// Messages sent from the presentation layer to the core worker thread.
#[derive(Debug, Clone, PartialEq)]
pub enum UiToCore {
    /// Send `TEST` to the selected port.
    CheckPort(PortSelection),
    /// Send `START`; with `acquire` the sample stream is collected too.
    RunTest {
        selection: PortSelection,
        acquire: bool,
    },
    /// Re-enumerate serial ports.
    RescanPorts,
    /// Graceful shutdown request.
    Quit,
}

/// Messages sent from the core back to the presentation layer.
#[derive(Debug, Clone)]
pub enum CoreToUi {
    Ports(Ports),
    Status {
        action: Action,
        selection: PortSelection,
        outcome: SessionOutcome,
    },
    /// History rows changed; an empty list means "no tests yet".
    History(Vec<TestRecord>),
    /// History refresh failed; the previous rows stay on screen.
    HistoryError(String),
    /// A run produced a new frame; already stored in the telemetry buffer.
    Telemetry(Arc<TelemetryFrame>),
    /// Core is shutting down.
    Quit,
}

impl CoreToUi {
    /// `None` for unchanged polls, which the presentation layer never needs to see.
    pub fn from_poll(poll: HistoryPoll) -> Option<Self> {
        match poll {
            HistoryPoll::Unchanged => None,
            HistoryPoll::Empty => Some(CoreToUi::History(Vec::new())),
            HistoryPoll::Refreshed(records) => Some(CoreToUi::History(records)),
        }
    }
}

/// Coalesces port rescans: at most one `RescanPorts` is in flight per bus.
#[derive(Debug, Clone, Default)]
pub struct RescanGate {
    pending: Arc<AtomicBool>,
}

impl RescanGate {
    /// Try to enqueue a port rescan unless one is already pending.
    /// Returns `Ok(true)` when a message was sent, `Ok(false)` when it was coalesced.
    pub fn request(&self, sender: &Sender<UiToCore>) -> Result<bool, flume::SendError<UiToCore>> {
        if self
            .pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(false);
        }

        sender.send(UiToCore::RescanPorts).map(|_| true).inspect_err(|_| {
            self.pending.store(false, Ordering::Release);
        })
    }

    /// Called by the core once the scan result is sent.
    pub fn complete(&self) {
        self.pending.store(false, Ordering::Release);
    }
}

/// Simple holder passed into the UI loop containing the receiving side from core and the sending side to core.
#[derive(Debug, Clone)]
pub struct Bus {
    pub core_rx: Receiver<CoreToUi>,
    pub ui_tx: Sender<UiToCore>,
    pub rescan: RescanGate,
}

impl Bus {
    pub fn new(core_rx: Receiver<CoreToUi>, ui_tx: Sender<UiToCore>, rescan: RescanGate) -> Self {
        Self {
            core_rx,
            ui_tx,
            rescan,
        }
    }

    pub fn request_rescan(&self) -> Result<bool, flume::SendError<UiToCore>> {
        self.rescan.request(&self.ui_tx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_polls_are_not_forwarded() {
        assert!(CoreToUi::from_poll(HistoryPoll::Unchanged).is_none());
        assert!(matches!(
            CoreToUi::from_poll(HistoryPoll::Empty),
            Some(CoreToUi::History(rows)) if rows.is_empty()
        ));
        let rows = vec![TestRecord::new("E", "P", "D")];
        assert!(matches!(
            CoreToUi::from_poll(HistoryPoll::Refreshed(rows.clone())),
            Some(CoreToUi::History(got)) if got == rows
        ));
    }

    #[test]
    fn rescan_requests_coalesce_until_completed() {
        let (tx, rx) = flume::unbounded();
        let gate = RescanGate::default();
        assert_eq!(gate.request(&tx), Ok(true));
        assert_eq!(gate.clone().request(&tx), Ok(false));
        gate.complete();
        assert_eq!(gate.request(&tx), Ok(true));
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn separate_gates_do_not_block_each_other() {
        let (tx, rx) = flume::unbounded();
        let first = RescanGate::default();
        let second = RescanGate::default();
        assert_eq!(first.request(&tx), Ok(true));
        assert_eq!(second.request(&tx), Ok(true));
        assert_eq!(first.request(&tx), Ok(false));
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn failed_send_releases_the_gate() {
        let (tx, rx) = flume::unbounded::<UiToCore>();
        drop(rx);
        let gate = RescanGate::default();
        assert!(gate.request(&tx).is_err());
        let (tx, _rx) = flume::unbounded();
        assert_eq!(gate.request(&tx), Ok(true));
    }
}
