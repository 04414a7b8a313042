use serde::Serialize;

/// Display entry shown in place of an empty port list.
pub const NO_PORTS_SENTINEL: &str = "No Ports Available";

/// Result of a port scan. An empty scan is its own variant, never an empty list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "ports", rename_all = "snake_case")]
pub enum Ports {
    Available(Vec<String>),
    None,
}

impl Ports {
    pub fn from_names(names: Vec<String>) -> Self {
        if names.is_empty() {
            Ports::None
        } else {
            Ports::Available(names)
        }
    }

    /// Entries for a selection list; always at least one.
    pub fn entries(&self) -> Vec<String> {
        match self {
            Ports::Available(names) => names.clone(),
            Ports::None => vec![NO_PORTS_SENTINEL.to_string()],
        }
    }

    /// Default selection for a freshly populated list.
    pub fn first_selection(&self) -> PortSelection {
        match self {
            Ports::Available(names) => PortSelection::Port(names[0].clone()),
            Ports::None => PortSelection::NoPorts,
        }
    }
}

/// What the user picked from the port list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSelection {
    Port(String),
    NoPorts,
}

impl PortSelection {
    /// Map a selection-list value back to a selection; the sentinel maps to `NoPorts`.
    pub fn from_entry(entry: &str) -> Self {
        let entry = entry.trim();
        if entry.is_empty() || entry == NO_PORTS_SENTINEL {
            PortSelection::NoPorts
        } else {
            PortSelection::Port(entry.to_string())
        }
    }
}

/// Enumerate serial ports on this host. Never fails.
pub fn list_ports() -> Ports {
    let names: Vec<String> = crate::protocol::tty::available_ports_sorted()
        .into_iter()
        .map(|p| p.port_name)
        .collect();
    log::debug!("enumerated {} serial ports", names.len());
    Ports::from_names(names)
}
