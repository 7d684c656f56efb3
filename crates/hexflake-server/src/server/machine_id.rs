//! Machine ID derivation from host network interfaces.
//!
//! The machine ID is computed once at startup and never changes afterwards.
//! It comes either from an explicit override or from the hardware address of
//! the first network interface that has one. Failing to derive it is fatal:
//! the server must not hand out IDs without a machine ID.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Where the machine ID comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineIdSource {
    /// Operator-supplied value.
    Fixed(u64),
    /// Derived from the host's network interfaces, optionally restricted to
    /// one named interface.
    Discover { interface: Option<String> },
}

/// A network interface as seen by machine ID discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    pub name: String,
    pub index: u32,
    /// Textual hardware address (e.g. `02:42:ac:11:00:02`). `None` when the
    /// interface has no address or an all-zero one, such as loopback.
    pub hardware_addr: Option<String>,
}

/// A source of network interfaces, ordered the way discovery should scan
/// them.
pub trait InterfaceSource {
    /// Lists the host's interfaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the interface list cannot be read.
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>>;
}

#[derive(Debug, thiserror::Error)]
pub enum MachineIdError {
    #[error("could not list network interfaces: {0}")]
    Interfaces(#[from] io::Error),

    #[error("no network interfaces found; pass --machine-id to set one explicitly")]
    NoInterfaces,

    #[error("network interface `{name}` not found")]
    InterfaceNotFound { name: String },

    #[error("no interface with a hardware address found among: {names}")]
    NoHardwareAddr { names: String },

    #[error("unable to parse {hex:?} (from hardware address {raw:?}) as an integer")]
    Unparsable { raw: String, hex: String },
}

/// Resolves the machine ID for `source`, scanning `interfaces` if needed.
///
/// # Errors
///
/// Returns an error if discovery fails; see [`discover_machine_id`].
pub fn resolve_machine_id(
    source: &MachineIdSource,
    interfaces: &impl InterfaceSource,
) -> Result<u64, MachineIdError> {
    match source {
        MachineIdSource::Fixed(id) => Ok(*id),
        MachineIdSource::Discover { interface } => {
            discover_machine_id(interfaces, interface.as_deref())
        }
    }
}

/// Picks the first interface exposing a hardware address (or the named one)
/// and turns its address into a machine ID.
///
/// # Errors
///
/// - [`MachineIdError::Interfaces`] if the interfaces cannot be listed
/// - [`MachineIdError::NoInterfaces`] if there are none
/// - [`MachineIdError::InterfaceNotFound`] if `only` names a missing interface
/// - [`MachineIdError::NoHardwareAddr`] if no candidate has an address
/// - [`MachineIdError::Unparsable`] if the address is not a 64-bit hex value
pub fn discover_machine_id(
    source: &impl InterfaceSource,
    only: Option<&str>,
) -> Result<u64, MachineIdError> {
    let interfaces = source.interfaces()?;
    if interfaces.is_empty() {
        return Err(MachineIdError::NoInterfaces);
    }

    if let Some(name) = only {
        if !interfaces.iter().any(|i| i.name == name) {
            return Err(MachineIdError::InterfaceNotFound {
                name: name.to_owned(),
            });
        }
    }

    let selected = interfaces
        .iter()
        .filter(|i| only.is_none_or(|name| i.name == name))
        .find_map(|i| i.hardware_addr.as_deref().map(|addr| (i, addr)));

    match selected {
        Some((interface, addr)) => {
            let id = parse_hardware_addr(addr)?;
            tracing::debug!(
                interface = %interface.name,
                hardware_addr = %addr,
                "derived machine ID from network interface"
            );
            Ok(id)
        }
        None => Err(MachineIdError::NoHardwareAddr {
            names: interfaces
                .iter()
                .map(|i| i.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// Strips every non-hex character from `raw` and parses the rest as a
/// base-16 `u64`.
///
/// # Errors
///
/// Returns [`MachineIdError::Unparsable`] if nothing hex is left or the value
/// does not fit in 64 bits.
pub fn parse_hardware_addr(raw: &str) -> Result<u64, MachineIdError> {
    let hex: String = raw.chars().filter(char::is_ascii_hexdigit).collect();
    u64::from_str_radix(&hex, 16).map_err(|_| MachineIdError::Unparsable {
        raw: raw.to_owned(),
        hex,
    })
}

/// Reads interfaces from Linux sysfs (`/sys/class/net`), ordered by
/// interface index.
#[derive(Debug, Clone)]
pub struct SysfsInterfaces {
    root: PathBuf,
}

impl Default for SysfsInterfaces {
    fn default() -> Self {
        Self::with_root("/sys/class/net")
    }
}

impl SysfsInterfaces {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_interface(path: &Path, name: String) -> NetworkInterface {
        let index = fs::read_to_string(path.join("ifindex"))
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(u32::MAX);
        let hardware_addr = fs::read_to_string(path.join("address"))
            .ok()
            .map(|s| s.trim().to_owned())
            .filter(|addr| !is_zero_addr(addr));

        NetworkInterface {
            name,
            index,
            hardware_addr,
        }
    }
}

impl InterfaceSource for SysfsInterfaces {
    fn interfaces(&self) -> io::Result<Vec<NetworkInterface>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            // Not Linux, or no sysfs mounted.
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut interfaces = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            interfaces.push(Self::read_interface(&entry.path(), name));
        }
        interfaces.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.name.cmp(&b.name)));

        Ok(interfaces)
    }
}

/// Empty and all-zero addresses carry no hardware identity.
fn is_zero_addr(addr: &str) -> bool {
    addr.chars()
        .filter(char::is_ascii_hexdigit)
        .all(|c| c == '0')
}
