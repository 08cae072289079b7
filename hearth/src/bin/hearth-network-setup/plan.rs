//! Which NetworkManager connection each interface gets.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Wired,
    Wireless,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub kind: DeviceKind,
}

/// Parse `nmcli --terse --fields DEVICE,TYPE device`.
///
/// Only ethernet and wifi devices are kept, in the order nmcli reports them.
pub fn parse_devices(output: &str) -> Vec<Device> {
    output
        .lines()
        .filter_map(|line| {
            let (name, kind) = line.trim().rsplit_once(':')?;
            let kind = match kind {
                "ethernet" => DeviceKind::Wired,
                "wifi" => DeviceKind::Wireless,
                _ => return None,
            };
            // nmcli escapes literal colons in terse mode.
            let name = name.replace("\\:", ":");
            (!name.is_empty()).then_some(Device { name, kind })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Internal,
    External,
}

impl Zone {
    pub fn as_str(self) -> &'static str {
        match self {
            Zone::Internal => "internal",
            Zone::External => "external",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// DHCP client.
    Client,
    /// Shares the uplink with whatever is plugged in.
    Shared,
    /// WPA-PSK access point sharing the uplink.
    AccessPoint { ssid: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub device: String,
    pub role: Role,
    pub zone: Zone,
}

impl Connection {
    pub fn name(&self) -> String {
        format!("hearth-{}", self.device)
    }

    /// Arguments to `nmcli` that create this connection.
    pub fn nmcli_args(&self, passphrase: Option<&str>) -> Vec<String> {
        let conn_type = match self.role {
            Role::AccessPoint { .. } => "wifi",
            _ => "ethernet",
        };
        let method = match self.role {
            Role::Client => "auto",
            Role::Shared | Role::AccessPoint { .. } => "shared",
        };
        let name = self.name();
        let mut args: Vec<String> = [
            "connection",
            "add",
            "type",
            conn_type,
            "ifname",
            self.device.as_str(),
            "con-name",
            name.as_str(),
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if let Role::AccessPoint { ssid } = &self.role {
            for arg in [
                "ssid",
                ssid.as_str(),
                "802-11-wireless.mode",
                "ap",
                "802-11-wireless.band",
                "bg",
            ] {
                args.push(arg.to_string());
            }
            if let Some(passphrase) = passphrase {
                for arg in ["wifi-sec.key-mgmt", "wpa-psk", "wifi-sec.psk", passphrase] {
                    args.push(arg.to_string());
                }
            }
        }

        for arg in [
            "ipv4.method",
            method,
            "connection.zone",
            self.zone.as_str(),
            "connection.autoconnect",
            "yes",
        ] {
            args.push(arg.to_string());
        }
        args
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.role {
            Role::Client => write!(f, "{}: DHCP client, zone {}", self.device, self.zone.as_str()),
            Role::Shared => write!(f, "{}: shared, zone {}", self.device, self.zone.as_str()),
            Role::AccessPoint { ssid } => write!(
                f,
                "{}: access point '{ssid}' (WPA-PSK), shared, zone {}",
                self.device,
                self.zone.as_str()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoUplink,
    NoPassphrase,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoUplink => write!(f, "no wired uplink to share"),
            SkipReason::NoPassphrase => write!(f, "no Wi-Fi passphrase given"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub connections: Vec<Connection>,
    pub skipped: Vec<(String, SkipReason)>,
}

pub fn ssid_for(device: &str) -> String {
    format!("Hearth-{device}")
}

pub fn plan(devices: &[Device], have_passphrase: bool) -> Plan {
    let wired: Vec<&Device> = devices.iter().filter(|d| d.kind == DeviceKind::Wired).collect();
    let wireless: Vec<&Device> = devices
        .iter()
        .filter(|d| d.kind == DeviceKind::Wireless)
        .collect();
    let mut plan = Plan::default();

    // A lone wired interface is a plain LAN client.
    if let ([only], []) = (wired.as_slice(), wireless.as_slice()) {
        plan.connections.push(Connection {
            device: only.name.clone(),
            role: Role::Client,
            zone: Zone::Internal,
        });
        return plan;
    }

    let Some((uplink, rest)) = wired.split_first() else {
        for device in wireless {
            plan.skipped.push((device.name.clone(), SkipReason::NoUplink));
        }
        return plan;
    };

    plan.connections.push(Connection {
        device: uplink.name.clone(),
        role: Role::Client,
        zone: Zone::External,
    });
    for device in rest {
        plan.connections.push(Connection {
            device: device.name.clone(),
            role: Role::Shared,
            zone: Zone::Internal,
        });
    }
    for device in wireless {
        if !have_passphrase {
            plan.skipped.push((device.name.clone(), SkipReason::NoPassphrase));
            continue;
        }
        plan.connections.push(Connection {
            device: device.name.clone(),
            role: Role::AccessPoint {
                ssid: ssid_for(&device.name),
            },
            zone: Zone::Internal,
        });
    }
    plan
}
