#![allow(dead_code)]

use parking_lot::Mutex;
use std::{
    io::{self, Cursor, Read, Write},
    path::PathBuf,
    sync::Arc,
};

use propbench::protocol::{
    link::Connection, DeviceError, DeviceErrorKind, LinkSettings, Opener,
};

/// Bench controller stand-in: answers every connection with the same script.
#[derive(Clone, Default)]
pub struct ScriptedDevice {
    script: Vec<u8>,
    refuse: bool,
    reject_writes: bool,
    time_out_at_end: bool,
    written: Arc<Mutex<Vec<u8>>>,
    opens: Arc<Mutex<usize>>,
}

impl ScriptedDevice {
    pub fn answering(script: &str) -> Self {
        Self {
            script: script.as_bytes().to_vec(),
            ..Default::default()
        }
    }

    pub fn silent() -> Self {
        Self {
            time_out_at_end: true,
            ..Default::default()
        }
    }

    pub fn unplugged() -> Self {
        Self {
            refuse: true,
            ..Default::default()
        }
    }

    /// Opens fine, then fails the command write like a cable pulled mid-call.
    pub fn disconnecting() -> Self {
        Self {
            reject_writes: true,
            ..Default::default()
        }
    }

    pub fn then_time_out(mut self) -> Self {
        self.time_out_at_end = true;
        self
    }

    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.written.lock()).into_owned()
    }

    pub fn opens(&self) -> usize {
        *self.opens.lock()
    }
}

struct ScriptedConnection {
    script: Cursor<Vec<u8>>,
    reject_writes: bool,
    time_out_at_end: bool,
    written: Arc<Mutex<Vec<u8>>>,
}

impl Read for ScriptedConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.script.read(buf)?;
        if n == 0 && self.time_out_at_end {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "no data"));
        }
        Ok(n)
    }
}

impl Write for ScriptedConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.reject_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "Broken pipe"));
        }
        self.written.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Opener for ScriptedDevice {
    fn open(&self, port: &str, _settings: &LinkSettings) -> Result<Box<dyn Connection>, DeviceError> {
        *self.opens.lock() += 1;
        if self.refuse {
            return Err(DeviceError::new(
                DeviceErrorKind::Open,
                format!("failed to open {port}: No such file or directory"),
            ));
        }
        Ok(Box::new(ScriptedConnection {
            script: Cursor::new(self.script.clone()),
            reject_writes: self.reject_writes,
            time_out_at_end: self.time_out_at_end,
            written: Arc::clone(&self.written),
        }))
    }
}

pub fn temp_path(stem: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!("propbench_{stem}_{}.{ext}", uuid::Uuid::new_v4()))
}
