//! Check-port / run-test flows on top of the device link.
//!
//! Each action validates the selected port, performs one exchange and maps the
//! result to a status message. Nothing is kept between actions.
use serde::Serialize;

use crate::{
    core::telemetry::TelemetryFrame,
    protocol::{
        acquisition::AcquisitionLimits, classify, Command, DeviceError, DeviceLink, Opener, Reply,
    },
    utils::ports::PortSelection,
};

pub const NO_PORTS_MESSAGE: &str = "No ports available";
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CheckPort,
    RunTest,
}

impl Action {
    pub fn command(self) -> Command {
        match self {
            Action::CheckPort => Command::Test,
            Action::RunTest => Command::Start,
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Action::CheckPort => "Port is working",
            Action::RunTest => "Test started",
        }
    }
}

/// Presentation hint only: info renders as success, error as failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Error,
}

/// Terminal state of one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SessionOutcome {
    Success(String),
    InvalidResponse(String),
    Error(String),
}

impl SessionOutcome {
    fn no_ports() -> Self {
        SessionOutcome::Error(NO_PORTS_MESSAGE.to_string())
    }

    fn device_error(err: &DeviceError) -> Self {
        SessionOutcome::Error(format!("Error: {err}"))
    }

    pub fn message(&self) -> &str {
        match self {
            SessionOutcome::Success(m)
            | SessionOutcome::InvalidResponse(m)
            | SessionOutcome::Error(m) => m,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SessionOutcome::Success(_) => Severity::Info,
            SessionOutcome::InvalidResponse(_) | SessionOutcome::Error(_) => Severity::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SessionOutcome::Success(_))
    }
}

pub struct SessionController<O: Opener> {
    link: DeviceLink<O>,
}

impl<O: Opener> SessionController<O> {
    pub fn new(link: DeviceLink<O>) -> Self {
        Self { link }
    }

    pub fn check_port(&self, selection: &PortSelection) -> SessionOutcome {
        self.perform(Action::CheckPort, selection)
    }

    pub fn run_test(&self, selection: &PortSelection) -> SessionOutcome {
        self.perform(Action::RunTest, selection)
    }

    /// Run-test that also collects the sample stream following the acknowledgement.
    pub fn run_test_acquiring(
        &self,
        selection: &PortSelection,
        limits: &AcquisitionLimits,
    ) -> (SessionOutcome, Option<TelemetryFrame>) {
        let action = Action::RunTest;
        let PortSelection::Port(port) = selection else {
            return self.report(action, SessionOutcome::no_ports(), None);
        };
        match self
            .link
            .exchange_and_acquire(port, action.command().bytes(), limits)
        {
            Ok((response, frame)) => {
                let outcome = Self::classify_response(action, &response);
                self.report(action, outcome, frame)
            }
            Err(err) => self.report(action, SessionOutcome::device_error(&err), None),
        }
    }

    pub fn perform(&self, action: Action, selection: &PortSelection) -> SessionOutcome {
        let PortSelection::Port(port) = selection else {
            return self.report(action, SessionOutcome::no_ports(), None).0;
        };
        let outcome = match self.link.exchange(port, action.command().bytes()) {
            Ok(response) => Self::classify_response(action, &response),
            Err(err) => SessionOutcome::device_error(&err),
        };
        self.report(action, outcome, None).0
    }

    fn classify_response(action: Action, response: &str) -> SessionOutcome {
        match classify(response) {
            Reply::Ok => SessionOutcome::Success(action.success_message().to_string()),
            Reply::Invalid(other) => {
                log::warn!("{action:?}: unexpected device response {other:?}");
                SessionOutcome::InvalidResponse(INVALID_RESPONSE_MESSAGE.to_string())
            }
        }
    }

    fn report(
        &self,
        action: Action,
        outcome: SessionOutcome,
        frame: Option<TelemetryFrame>,
    ) -> (SessionOutcome, Option<TelemetryFrame>) {
        match &outcome {
            SessionOutcome::Success(m) => log::info!("{action:?}: {m}"),
            SessionOutcome::InvalidResponse(m) => log::warn!("{action:?}: {m}"),
            SessionOutcome::Error(m) => log::error!("{action:?}: {m}"),
        }
        (outcome, frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{link::fake::FakeOpener, LinkSettings};

    fn controller(opener: &FakeOpener) -> SessionController<FakeOpener> {
        SessionController::new(DeviceLink::new(opener.clone(), LinkSettings::default()))
    }

    fn port() -> PortSelection {
        PortSelection::Port("/dev/ttyUSB0".to_string())
    }

    #[test]
    fn sentinel_selection_never_touches_the_device() {
        let opener = FakeOpener::replying("OK\n");
        let ctl = controller(&opener);
        for action in [Action::CheckPort, Action::RunTest] {
            let outcome = ctl.perform(action, &PortSelection::NoPorts);
            assert_eq!(outcome, SessionOutcome::Error("No ports available".into()));
            assert_eq!(outcome.severity(), Severity::Error);
        }
        let (outcome, frame) =
            ctl.run_test_acquiring(&PortSelection::NoPorts, &AcquisitionLimits::default());
        assert_eq!(outcome.message(), "No ports available");
        assert!(frame.is_none());
        assert_eq!(opener.open_count(), 0);
    }

    #[test]
    fn ok_reports_action_specific_success() {
        let opener = FakeOpener::replying("OK\n");
        let ctl = controller(&opener);
        let check = ctl.check_port(&port());
        assert_eq!(check, SessionOutcome::Success("Port is working".into()));
        assert_eq!(check.severity(), Severity::Info);
        assert_eq!(
            ctl.run_test(&port()),
            SessionOutcome::Success("Test started".into())
        );
        assert_eq!(opener.written(), b"TEST\nSTART\n");
        assert_eq!(opener.open_count(), 2);
    }

    #[test]
    fn anything_else_is_invalid_response() {
        for reply in ["FAIL\n", "\n", "", "ok\n", "OK OK\n"] {
            let opener = FakeOpener::replying(reply);
            let outcome = controller(&opener).run_test(&port());
            assert_eq!(
                outcome,
                SessionOutcome::InvalidResponse("Invalid response".into()),
                "reply {reply:?}"
            );
            assert_eq!(outcome.severity(), Severity::Error);
        }
    }

    #[test]
    fn transport_failures_are_prefixed() {
        for opener in [
            FakeOpener::failing_open("Connection refused"),
            FakeOpener::timing_out(),
            FakeOpener::rejecting_writes(),
        ] {
            let outcome = controller(&opener).check_port(&port());
            assert!(matches!(outcome, SessionOutcome::Error(_)));
            assert!(outcome.message().starts_with("Error: "), "{outcome:?}");
        }
        let outcome =
            controller(&FakeOpener::failing_open("Connection refused")).check_port(&port());
        assert_eq!(
            outcome.message(),
            "Error: failed to open /dev/ttyUSB0: Connection refused"
        );
    }

    #[test]
    fn failed_write_is_reported_for_both_actions() {
        let opener = FakeOpener::rejecting_writes();
        let ctl = controller(&opener);
        for outcome in [ctl.check_port(&port()), ctl.run_test(&port())] {
            assert_eq!(
                outcome,
                SessionOutcome::Error(
                    "Error: failed to write to /dev/ttyUSB0: device disconnected".into()
                )
            );
        }
        let (outcome, frame) = ctl.run_test_acquiring(&port(), &AcquisitionLimits::default());
        assert!(outcome.message().starts_with("Error: failed to write to"));
        assert!(frame.is_none());
    }

    #[test]
    fn acquiring_run_returns_frame_on_success() {
        let opener = FakeOpener::replying("OK\n900,0.1,1.5\n950,0.12,1.7\nEND\n");
        let (outcome, frame) =
            controller(&opener).run_test_acquiring(&port(), &AcquisitionLimits::default());
        assert_eq!(outcome, SessionOutcome::Success("Test started".into()));
        assert_eq!(frame.unwrap().rpm, vec![900.0, 950.0]);
        assert_eq!(opener.written(), b"START\n");
    }
}
