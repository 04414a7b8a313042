//! Sample stream that follows an acknowledged `START`.
//!
//! After `OK` the bench controller emits one `rpm,moment,thrust` line per sample
//! and closes the run with `END`. A read timeout or EOF also ends the run; the
//! samples gathered so far are kept.

use std::io::{self, BufRead};

use crate::{
    core::telemetry::TelemetryFrame,
    protocol::link::{decode_line, read_raw_line, DeviceError, DeviceErrorKind},
};

pub const END_MARKER: &str = "END";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionLimits {
    pub max_samples: usize,
}

impl Default for AcquisitionLimits {
    fn default() -> Self {
        Self { max_samples: 10_000 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub rpm: f64,
    pub moment: f64,
    pub thrust: f64,
}

pub fn parse_sample(line: &str) -> Option<Sample> {
    let mut fields = line.split(',').map(|f| f.trim().parse::<f64>());
    let sample = Sample {
        rpm: fields.next()?.ok()?,
        moment: fields.next()?.ok()?,
        thrust: fields.next()?.ok()?,
    };
    if fields.next().is_some() {
        return None;
    }
    Some(sample)
}

pub fn collect<R: BufRead>(
    reader: &mut R,
    port: &str,
    limits: &AcquisitionLimits,
) -> Result<TelemetryFrame, DeviceError> {
    let mut frame = TelemetryFrame::default();
    let mut buf = Vec::with_capacity(64);

    while frame.len() < limits.max_samples {
        match read_raw_line(reader, &mut buf) {
            Ok(0) => {
                log::debug!("[{port}] sample stream closed after {} samples", frame.len());
                break;
            }
            Ok(_) => {}
            Err(err) if err.kind() == io::ErrorKind::TimedOut => {
                log::info!("[{port}] sample stream idle, ending run at {} samples", frame.len());
                break;
            }
            Err(err) => {
                return Err(DeviceError::new(
                    DeviceErrorKind::Read,
                    format!("failed to read samples from {port}: {err}"),
                ));
            }
        }

        let line = match decode_line(&buf, port) {
            Ok(line) => line,
            Err(err) => {
                log::warn!("[{port}] skipping sample line: {err}");
                continue;
            }
        };
        if line == END_MARKER {
            log::info!("[{port}] run finished with {} samples", frame.len());
            break;
        }
        if line.is_empty() {
            continue;
        }
        match parse_sample(&line) {
            Some(sample) => frame.push(sample),
            None => log::warn!("[{port}] skipping malformed sample line {line:?}"),
        }
    }

    if frame.len() >= limits.max_samples {
        log::warn!("[{port}] sample limit {} reached", limits.max_samples);
    }
    Ok(frame)
}
