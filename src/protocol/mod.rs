pub mod acquisition;
pub mod command;
pub mod link;
pub mod tty;

pub use command::{classify, Command, Reply};
pub use link::{DeviceError, DeviceErrorKind, DeviceLink, LinkSettings, Opener, SerialOpener};
