use chrono::Local;
use log::{LevelFilter, Record};
use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
};

use env_logger::{fmt::Formatter, Builder, Target};

pub const LOG_FILE_ENV: &str = "PROPBENCH_LOG_FILE";

/// Copies every log line to two sinks, e.g. the log file and the terminal.
struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.first.write_all(buf)?;
        self.second.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.first.flush()?;
        self.second.flush()
    }
}

/// Module path without the crate prefix: `core::session`, `protocol::link`, ...
fn component(target: &str) -> &str {
    target.strip_prefix("propbench::").unwrap_or(target)
}

/// `2024-09-08T14:03:11.204 [INFO ] core::session - CheckPort: Port is working`
fn write_record(buf: &mut Formatter, record: &Record) -> io::Result<()> {
    writeln!(
        buf,
        "{} [{:<5}] {} - {}",
        Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
        record.level(),
        component(record.target()),
        record.args()
    )
}

/// Pick the file logger target: the env override, or a timestamped file in debug builds.
pub fn log_file_path() -> Option<String> {
    std::env::var(LOG_FILE_ENV).ok().or_else(|| {
        #[cfg(debug_assertions)]
        {
            Some(format!("./log_{}.log", Local::now().format("%Y%m%d%H%M%S")))
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

fn open_log(path: &str) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn install(target: Target, level: LevelFilter) {
    Builder::new()
        .format(write_record)
        .target(target)
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Logger setup for one-shot commands: the log file when one is configured,
/// otherwise plain `env_logger` on stderr.
pub fn init_common() {
    let Some(path) = log_file_path() else {
        env_logger::init();
        return;
    };
    match open_log(&path) {
        Ok(file) => {
            install(Target::Pipe(Box::new(file)), LevelFilter::Debug);
            log::info!("File logger initialized at {path}");
        }
        Err(err) => {
            eprintln!("Failed to initialize file logger at '{path}': {err}");
            env_logger::init();
        }
    }
}

/// Logger for the interactive console: writes to both `path` and stdout.
pub fn init_watch_logger(path: &str) -> io::Result<()> {
    let tee = Tee {
        first: open_log(path)?,
        second: io::stdout(),
    };
    install(Target::Pipe(Box::new(tee)), LevelFilter::Info);
    log::info!("Console logger initialized - logging to {path} and terminal");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tee_writes_both_sinks() {
        let mut tee = Tee {
            first: Vec::new(),
            second: Vec::new(),
        };
        tee.write_all(b"[INFO ] core::session - CheckPort\n").unwrap();
        tee.flush().unwrap();
        assert_eq!(tee.first, tee.second);
        assert_eq!(tee.first, b"[INFO ] core::session - CheckPort\n");
    }

    #[test]
    fn component_strips_crate_prefix() {
        assert_eq!(component("propbench::core::session"), "core::session");
        assert_eq!(component("serialport"), "serialport");
    }
}
