use strum::{EnumIter, IntoStaticStr};

/// Acknowledgement the bench controller sends back for every accepted command.
pub const ACK: &str = "OK";

/// Commands understood by the bench controller.
///
/// Both commands share the same acceptance rule. `Test` only checks that the
/// device is alive; `Start` additionally arms the hardware-side acquisition.
#[derive(EnumIter, IntoStaticStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    #[strum(serialize = "TEST")]
    Test,
    #[strum(serialize = "START")]
    Start,
}

impl Command {
    /// Literal bytes written to the wire, newline included.
    pub const fn bytes(self) -> &'static [u8] {
        match self {
            Command::Test => b"TEST\n",
            Command::Start => b"START\n",
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Classification of a decoded, trimmed device response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ok,
    /// Anything other than the exact acknowledgement. Not a transport fault.
    Invalid(String),
}

impl Reply {
    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok)
    }
}

/// Exact, case-sensitive match against [`ACK`].
pub fn classify(response: &str) -> Reply {
    if response == ACK {
        Reply::Ok
    } else {
        Reply::Invalid(response.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn command_bytes_are_newline_terminated_names() {
        for cmd in Command::iter() {
            let expected = format!("{}\n", cmd.name());
            assert_eq!(cmd.bytes(), expected.as_bytes());
        }
        assert_eq!(Command::Test.bytes(), b"TEST\n");
        assert_eq!(Command::Start.bytes(), b"START\n");
    }

    #[test]
    fn only_exact_ok_is_accepted() {
        assert_eq!(classify("OK"), Reply::Ok);
        assert_eq!(classify("ok"), Reply::Invalid("ok".to_string()));
        assert_eq!(classify(" OK"), Reply::Invalid(" OK".to_string()));
        assert_eq!(classify("OKAY"), Reply::Invalid("OKAY".to_string()));
        assert_eq!(classify(""), Reply::Invalid(String::new()));
        assert_eq!(classify("FAIL"), Reply::Invalid("FAIL".to_string()));
    }
}
