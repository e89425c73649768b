// Copyright (c) 2026 Fastcomcorp, LLC. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Inform Processor & Parameter Normalizer
//!
//! Two data models coexist in the field: TR-098 (paths rooted at
//! `InternetGatewayDevice.`) and TR-181 (paths rooted at `Device.`). The
//! normalizer detects which model a device speaks, reads each logical field
//! from the right path with per-vendor fallbacks, and aggregates the tabular
//! WiFi/WAN/host parameters into compact JSON blobs for the device record.

use std::collections::HashMap;

use serde::Serialize;

use crate::cwmp::Inform;
use crate::store::db::CpeTelemetry;

pub const DEVICE_TYPE_ROUTER: &str = "router";
pub const DEVICE_TYPE_ONT: &str = "ont";
pub const DEVICE_TYPE_GATEWAY: &str = "gateway";

/// Identify the device type from Inform identity fields.
/// Only consulted on first registration; optical telemetry may later flip
/// an unset type to `ont`.
pub fn detect_device_type(manufacturer: &str, product_class: &str) -> &'static str {
    let m = manufacturer.to_lowercase();
    let p = product_class.to_lowercase();
    if m.contains("zte") {
        DEVICE_TYPE_ONT
    } else if m.contains("huawei") && (p.contains("ont") || p.contains("hg") || p.contains("eg")) {
        DEVICE_TYPE_ONT
    } else if m.contains("fiberhome") || m.contains("an5506") {
        DEVICE_TYPE_ONT
    } else if m.contains("nokia") || m.contains("alcatel") {
        DEVICE_TYPE_ONT
    } else if m.contains("bdcom") || m.contains("cdtc") {
        DEVICE_TYPE_ONT
    } else if p.contains("ont") || p.contains("onu") || p.contains("gpon") || p.contains("epon") {
        DEVICE_TYPE_ONT
    } else {
        DEVICE_TYPE_ROUTER
    }
}

/// Group tag for a parameter path, used to bucket parameter rows
pub fn param_group_tag(name: &str) -> &'static str {
    const TAGS: &[&str] = &[
        "Device.DeviceInfo.",
        "Device.ManagementServer.",
        "Device.InterfaceStack.",
        "Device.Cellular.",
        "Device.Ethernet.",
        "Device.WiFi.",
        "Device.PPP.",
        "Device.IP.",
        "Device.Routing.",
        "Device.Hosts.",
        "Device.DNS.",
        "Device.DHCPv4.",
        "Device.Firewall.",
        "Device.X_MIKROTIK_Interface.",
        "Device.Optical.",
        "Device.DSL.",
    ];
    TAGS.iter().find(|t| name.contains(*t)).copied().unwrap_or("")
}

fn get<'a>(params: &'a HashMap<String, String>, name: &str) -> &'a str {
    params.get(name).map(String::as_str).unwrap_or("")
}

/// Read a logical field trying the TR-181 path first, then the TR-098 path
fn get2<'a>(params: &'a HashMap<String, String>, tr181: &str, tr098: &str) -> &'a str {
    let v = get(params, tr181);
    if v.is_empty() && !tr098.is_empty() {
        get(params, tr098)
    } else {
        v
    }
}

fn set(slot: &mut Option<String>, value: &str) {
    if !value.is_empty() {
        *slot = Some(value.to_string());
    }
}

fn set_i64(slot: &mut Option<i64>, value: &str) {
    if let Ok(v) = value.trim().parse::<i64>() {
        *slot = Some(v);
    }
}

/// Extract telemetry from a full Inform envelope
///
/// Used on the unthrottled Inform path. WiFi/WAN/host aggregation is not
/// done here; Informs rarely carry those subtrees, they arrive through the
/// auto-fetch GetParameterValues cycle instead.
pub fn telemetry_from_inform(inform: &Inform) -> CpeTelemetry {
    let mut t = CpeTelemetry::default();
    let p = &inform.params;

    set(&mut t.manufacturer, &inform.manufacturer);
    set(&mut t.product_class, &inform.product_class);
    set(&mut t.oui, &inform.oui);
    set(&mut t.cwmp_url, inform.connection_request_url());
    set(
        &mut t.software_version,
        get2(
            p,
            "Device.DeviceInfo.SoftwareVersion",
            "InternetGatewayDevice.DeviceInfo.SoftwareVersion",
        ),
    );
    set(
        &mut t.hardware_version,
        get2(
            p,
            "Device.DeviceInfo.HardwareVersion",
            "InternetGatewayDevice.DeviceInfo.HardwareVersion",
        ),
    );
    set(
        &mut t.model,
        get2(
            p,
            "Device.DeviceInfo.ModelName",
            "InternetGatewayDevice.DeviceInfo.ModelName",
        ),
    );
    set_i64(
        &mut t.uptime,
        get2(
            p,
            "Device.DeviceInfo.UpTime",
            "InternetGatewayDevice.DeviceInfo.UpTime",
        ),
    );
    set_i64(
        &mut t.cpu_usage,
        get2(
            p,
            "Device.DeviceInfo.ProcessStatus.CPUUsage",
            "InternetGatewayDevice.DeviceInfo.ProcessStatus.CPUUsage",
        ),
    );
    set_i64(
        &mut t.memory_total,
        get2(
            p,
            "Device.DeviceInfo.MemoryStatus.Total",
            "InternetGatewayDevice.DeviceInfo.MemoryStatus.Total",
        ),
    );
    set_i64(
        &mut t.memory_free,
        get2(
            p,
            "Device.DeviceInfo.MemoryStatus.Free",
            "InternetGatewayDevice.DeviceInfo.MemoryStatus.Free",
        ),
    );

    apply_vendor_fields(&mut t, &inform.manufacturer, p);

    // A device that never reports a PON serial still gets one: the CWMP SN.
    if t.pon_sn_hex.is_none() && !inform.sn.is_empty() {
        t.pon_sn_hex = Some(inform.sn.clone());
    }

    t
}

/// Extract telemetry from a GetParameterValuesResponse snapshot
///
/// This is the full normalizer pass: generic fields, vendor fallbacks, and
/// the WiFi/WAN/LAN-client aggregations.
pub fn telemetry_from_params(
    manufacturer: &str,
    params: &HashMap<String, String>,
) -> CpeTelemetry {
    let mut t = CpeTelemetry::default();

    set(&mut t.cwmp_url, get(params, "Device.ManagementServer.ConnectionRequestURL"));
    set(&mut t.software_version, get(params, "Device.DeviceInfo.SoftwareVersion"));
    set(&mut t.hardware_version, get(params, "Device.DeviceInfo.HardwareVersion"));
    set(&mut t.model, get(params, "Device.DeviceInfo.ModelName"));
    set_i64(&mut t.uptime, get(params, "Device.DeviceInfo.UpTime"));
    set_i64(&mut t.cpu_usage, get(params, "Device.DeviceInfo.ProcessStatus.CPUUsage"));
    set_i64(&mut t.memory_total, get(params, "Device.DeviceInfo.MemoryStatus.Total"));
    set_i64(&mut t.memory_free, get(params, "Device.DeviceInfo.MemoryStatus.Free"));

    apply_vendor_fields(&mut t, manufacturer, params);

    if !manufacturer.to_lowercase().contains("mikrotik") {
        // TR-098 fallbacks for devices that answered with IGD paths
        if t.uptime.is_none() {
            set_i64(&mut t.uptime, get(params, "InternetGatewayDevice.DeviceInfo.UpTime"));
        }
        if t.cpu_usage.is_none() {
            let v = get2(
                params,
                "InternetGatewayDevice.DeviceInfo.ProcessStatus.CPUUsage",
                "InternetGatewayDevice.DeviceInfo.X_CMS_CPUUsage",
            );
            set_i64(&mut t.cpu_usage, v);
        }

        t.wifi_ssid = parse_wifi_ssids(params);
        t.wan_info = parse_wan_connections(params);
        t.lan_clients = parse_host_devices(params);
    }

    t
}

/// Vendor-specific field extraction shared by both normalizer entry points.
/// Mikrotik routers have no optical plant; their branch only reads the
/// proprietary identity fields.
fn apply_vendor_fields(
    t: &mut CpeTelemetry,
    manufacturer: &str,
    params: &HashMap<String, String>,
) {
    let m = manufacturer.to_lowercase();
    if m.contains("mikrotik") {
        set(&mut t.arch_name, get(params, "Device.DeviceInfo.X_MIKROTIK_ArchName"));
        set(
            &mut t.system_name,
            get(params, "Device.DeviceInfo.X_MIKROTIK_SystemIdentity"),
        );
        return;
    }

    set(
        &mut t.system_name,
        get2(
            params,
            "Device.DeviceInfo.ModelName",
            "InternetGatewayDevice.DeviceInfo.ModelName",
        ),
    );
    set(
        &mut t.pon_sn_hex,
        get2(
            params,
            "Device.DeviceInfo.SerialNumber",
            "InternetGatewayDevice.DeviceInfo.SerialNumber",
        ),
    );
    set(
        &mut t.olt_uplink,
        get2(
            params,
            "Device.Optical.Interface.1.UpperLayers",
            "InternetGatewayDevice.DeviceInfo.XponInterface.OLTInfo",
        ),
    );

    let mut rx = get2(
        params,
        "Device.Optical.Interface.1.RxPower",
        "InternetGatewayDevice.DeviceInfo.XponInterface.RXPower",
    );
    if rx.is_empty() {
        rx = get2(
            params,
            "InternetGatewayDevice.WANDevice.1.X_ZTE-COM_WANPONInterfaceConfig.RXPower",
            "InternetGatewayDevice.WANDevice.2.X_ZTE-COM_WANPONInterfaceConfig.RXPower",
        );
    }
    set(&mut t.fiber_rx_power, rx);

    let mut tx = get2(
        params,
        "Device.Optical.Interface.1.TxPower",
        "InternetGatewayDevice.DeviceInfo.XponInterface.TXPower",
    );
    if tx.is_empty() {
        tx = get2(
            params,
            "InternetGatewayDevice.WANDevice.1.X_ZTE-COM_WANPONInterfaceConfig.TXPower",
            "InternetGatewayDevice.WANDevice.2.X_ZTE-COM_WANPONInterfaceConfig.TXPower",
        );
    }
    set(&mut t.fiber_tx_power, tx);

    // Optical telemetry present means the device hangs off a PON port
    if t.fiber_rx_power.is_some() || t.fiber_tx_power.is_some() {
        t.device_type = Some(DEVICE_TYPE_ONT.to_string());
    }
}

#[derive(Debug, Default, Clone, Serialize)]
struct WifiEntry {
    idx: usize,
    ssid: String,
    password: String,
    enable: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    channel: String,
}

const TR098_WLAN_PREFIX: &str = "InternetGatewayDevice.LANDevice.1.WLANConfiguration.";
const TR181_SSID_PREFIX: &str = "Device.WiFi.SSID.";
const TR181_AP_PREFIX: &str = "Device.WiFi.AccessPoint.";

/// Extract WiFi SSIDs, passwords and radio state from a parameter snapshot.
/// Entries are bucketed by the first numeric path index; indices 1..=16 with
/// a non-empty SSID survive. Returns a compact JSON array.
pub fn parse_wifi_ssids(params: &HashMap<String, String>) -> Option<String> {
    let mut entries: HashMap<usize, WifiEntry> = HashMap::new();

    for (name, value) in params {
        if let Some(rest) = name.strip_prefix(TR098_WLAN_PREFIX) {
            let Some((idx, field)) = split_indexed(rest) else {
                continue;
            };
            let e = entries.entry(idx).or_default();
            match field {
                "SSID" => e.ssid = value.clone(),
                "KeyPassphrase" => e.password = value.clone(),
                "Enable" => e.enable = value.clone(),
                "PreSharedKey.1.KeyPassphrase" => {
                    if e.password.is_empty() {
                        e.password = value.clone();
                    }
                }
                "Channel" => e.channel = value.clone(),
                "ChannelsInUse" => {
                    if e.channel.is_empty() || e.channel == "0" {
                        e.channel = value.clone();
                    }
                }
                _ => {}
            }
        }
        if let Some(rest) = name.strip_prefix(TR181_SSID_PREFIX) {
            let Some((idx, field)) = split_indexed(rest) else {
                continue;
            };
            let e = entries.entry(idx).or_default();
            match field {
                "SSID" => e.ssid = value.clone(),
                "Enable" => e.enable = value.clone(),
                _ => {}
            }
        }
        if let Some(rest) = name.strip_prefix(TR181_AP_PREFIX) {
            let Some((idx, field)) = split_indexed(rest) else {
                continue;
            };
            if field == "Security.KeyPassphrase" {
                entries.entry(idx).or_default().password = value.clone();
            }
        }
    }

    let mut result = Vec::new();
    for idx in 1..=16 {
        if let Some(e) = entries.get(&idx) {
            if !e.ssid.is_empty() {
                let mut e = e.clone();
                e.idx = idx;
                result.push(e);
            }
        }
    }
    if result.is_empty() {
        return None;
    }
    serde_json::to_string(&result).ok()
}

#[derive(Debug, Default, Clone, Serialize)]
struct WanEntry {
    name: String,
    service: String,
    ip: String,
    username: String,
    password: String,
    #[serde(rename = "type")]
    conn_type: String,
    enable: String,
    vlan_id: String,
    ipv6_status: String,
    ipv6_ip: String,
    ip_mode: String,
    dev_idx: String,
    conn_idx: String,
}

const WAN_PREFIX: &str = "InternetGatewayDevice.WANDevice.1.WANConnectionDevice.";

const SERVICE_LIST_FIELDS: &[&str] = &[
    "X_CT-COM_ServiceList",
    "X_HW_SERVICELIST",
    "X_ZTE-COM_ServiceList",
    "X_CMCC_ServiceList",
    "ServiceList",
    "X_FH_ServiceList",
    "X_CU_ServiceList",
];

const VLAN_FIELDS: &[&str] = &[
    "X_ZTE-COM_VLANID",
    "X_HW_VLAN",
    "X_CT-COM_VLANIDMark",
    "X_CMCC_VLANIDMark",
    "VLANID",
    "VLAN_ID",
    "X_CT-COM_VLAN",
];

/// Extract WAN connection info from a parameter snapshot. Connections are
/// keyed `devIdx-connIdx-type` so multiple WANConnectionDevice instances
/// keep their PPP and IP children apart. Returns a compact JSON array
/// sorted ascending by composite key.
pub fn parse_wan_connections(params: &HashMap<String, String>) -> Option<String> {
    let mut entries: HashMap<String, WanEntry> = HashMap::new();
    let mut keys: Vec<String> = Vec::new();

    for (name, value) in params {
        let Some(rest) = name.strip_prefix(WAN_PREFIX) else {
            continue;
        };
        let Some((dev_idx, remaining)) = rest.split_once('.') else {
            continue;
        };

        let (conn_type, sub) = if let Some(sub) = remaining.strip_prefix("WANPPPConnection.") {
            ("PPPoE", sub)
        } else if let Some(sub) = remaining.strip_prefix("WANIPConnection.") {
            ("IPoE", sub)
        } else {
            continue;
        };
        let Some((conn_idx, field)) = sub.split_once('.') else {
            continue;
        };

        let key = format!("{dev_idx}-{conn_idx}-{conn_type}");
        let e = entries.entry(key.clone()).or_insert_with(|| {
            keys.push(key);
            WanEntry {
                conn_type: conn_type.to_string(),
                dev_idx: dev_idx.to_string(),
                conn_idx: conn_idx.to_string(),
                ..WanEntry::default()
            }
        });

        match field {
            "Name" => e.name = value.clone(),
            "ExternalIPAddress" => e.ip = value.clone(),
            "Username" => e.username = value.clone(),
            "Password" => e.password = value.clone(),
            "Enable" => e.enable = value.clone(),
            "ConnectionType" => {
                if value == "PPPoE_Bridged" || value == "IP_Bridged" {
                    e.conn_type = "Bridge".to_string();
                }
            }
            "X_CT-COM_IPv6ConnStatus" => e.ipv6_status = value.clone(),
            "X_CT-COM_IPv6IPAddress" => e.ipv6_ip = value.clone(),
            "X_CT-COM_IPMode" => {
                e.ip_mode = match value.as_str() {
                    "1" => "IPv4".to_string(),
                    "2" => "IPv6".to_string(),
                    "3" => "Dual Stack".to_string(),
                    other => other.to_string(),
                }
            }
            f if SERVICE_LIST_FIELDS.contains(&f) => {
                if !value.is_empty() && e.service.is_empty() {
                    e.service = value.clone();
                }
            }
            f if VLAN_FIELDS.contains(&f) => {
                if !value.is_empty() && e.vlan_id.is_empty() {
                    e.vlan_id = value.clone();
                }
            }
            _ => {}
        }
    }

    // Second pass: device-level GPON/EPON link VLAN fills children lacking one
    for (name, value) in params {
        if value.is_empty() {
            continue;
        }
        let Some(rest) = name.strip_prefix(WAN_PREFIX) else {
            continue;
        };
        let Some((dev_idx, field)) = rest.split_once('.') else {
            continue;
        };
        if field == "X_CT-COM_WANGponLinkConfig.VLANIDMark"
            || field == "X_CT-COM_WANEponLinkConfig.VLANIDMark"
        {
            let prefix = format!("{dev_idx}-");
            for (k, e) in entries.iter_mut() {
                if k.starts_with(&prefix) && e.vlan_id.is_empty() {
                    e.vlan_id = value.clone();
                }
            }
        }
    }

    if entries.is_empty() {
        return None;
    }

    keys.sort();
    let mut result = Vec::new();
    for key in keys {
        let Some(e) = entries.get(&key) else { continue };
        if e.name.is_empty() && e.ip.is_empty() && e.service.is_empty() {
            continue;
        }
        let mut e = e.clone();
        if e.ip_mode.is_empty() {
            let has_v4 = !e.ip.is_empty() && e.ip != "0.0.0.0";
            let has_v6 =
                e.ipv6_status == "Connected" || (!e.ipv6_ip.is_empty() && e.ipv6_ip != "::");
            e.ip_mode = match (has_v4, has_v6) {
                (true, true) => "Dual Stack".to_string(),
                (false, true) => "IPv6".to_string(),
                (true, false) => "IPv4".to_string(),
                (false, false) => "-".to_string(),
            };
        }
        result.push(e);
    }
    if result.is_empty() {
        return None;
    }
    serde_json::to_string(&result).ok()
}

#[derive(Debug, Default, Clone, Serialize)]
struct HostEntry {
    hostname: String,
    ip: String,
    mac: String,
    interface: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    rssi: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    ssid: String,
}

#[derive(Debug, Default, Clone)]
struct WifiAssocInfo {
    rssi: String,
    hostname: String,
    ssid: String,
}

const HOSTS_PREFIX: &str = "InternetGatewayDevice.LANDevice.1.Hosts.Host.";

const RSSI_FIELDS: &[&str] = &[
    "AssociatedDeviceRssi",
    "X_HW_RSSI",
    "SignalStrength",
    "X_ZTE-COM_Rssi",
];

const ASSOC_NAME_FIELDS: &[&str] = &[
    "X_ZTE-COM_AssociatedDeviceName",
    "X_HW_AssociatedDevicedescriptions",
];

/// Merge LAN host entries with WiFi associated-device records (joined on
/// lowercase MAC) into one client list. When the Hosts table is absent the
/// associated-device records alone synthesize the list.
pub fn parse_host_devices(params: &HashMap<String, String>) -> Option<String> {
    let mut entries: HashMap<usize, HostEntry> = HashMap::new();
    let mut assoc: HashMap<String, WifiAssocInfo> = HashMap::new();

    for (name, value) in params {
        if let Some(rest) = name.strip_prefix(HOSTS_PREFIX) {
            let Some((idx, field)) = split_indexed(rest) else {
                continue;
            };
            let e = entries.entry(idx).or_default();
            match field {
                "HostName" => e.hostname = value.clone(),
                "IPAddress" => e.ip = value.clone(),
                "MACAddress" => e.mac = value.clone(),
                "InterfaceType" => e.interface = value.clone(),
                _ => {}
            }
            continue;
        }

        if let Some(rest) = name.strip_prefix(TR098_WLAN_PREFIX) {
            // N.AssociatedDevice.M.Field
            let Some((ssid_idx, remaining)) = rest.split_once('.') else {
                continue;
            };
            let Some(ad_rest) = remaining.strip_prefix("AssociatedDevice.") else {
                continue;
            };
            let Some((ad_idx, field)) = ad_rest.split_once('.') else {
                continue;
            };
            let dev_key = format!("{ssid_idx}-{ad_idx}");
            let wi = assoc.entry(dev_key).or_insert_with(|| WifiAssocInfo {
                ssid: ssid_idx.to_string(),
                ..WifiAssocInfo::default()
            });
            if RSSI_FIELDS.contains(&field) {
                if !value.is_empty() && wi.rssi.is_empty() {
                    wi.rssi = value.clone();
                }
            } else if ASSOC_NAME_FIELDS.contains(&field) && !value.is_empty() {
                wi.hostname = value.clone();
            }
        }
    }

    // MAC -> associated-device info lookup
    let mut mac_to_assoc: HashMap<String, (String, WifiAssocInfo)> = HashMap::new();
    for (dev_key, wi) in &assoc {
        let Some((ssid_idx, ad_idx)) = dev_key.split_once('-') else {
            continue;
        };
        let mac_param =
            format!("{TR098_WLAN_PREFIX}{ssid_idx}.AssociatedDevice.{ad_idx}.AssociatedDeviceMACAddress");
        if let Some(mac) = params.get(&mac_param) {
            if !mac.is_empty() {
                mac_to_assoc.insert(mac.to_lowercase(), (dev_key.clone(), wi.clone()));
            }
        }
    }

    if entries.is_empty() {
        // No Hosts table: synthesize from associated-device records alone
        if mac_to_assoc.is_empty() {
            return None;
        }
        let mut macs: Vec<&String> = mac_to_assoc.keys().collect();
        macs.sort();
        let mut result = Vec::new();
        for mac in macs {
            let (dev_key, wi) = &mac_to_assoc[mac];
            let ip = dev_key
                .split_once('-')
                .map(|(ssid_idx, ad_idx)| {
                    format!("{TR098_WLAN_PREFIX}{ssid_idx}.AssociatedDevice.{ad_idx}.AssociatedDeviceIPAddress")
                })
                .and_then(|p| params.get(&p).cloned())
                .unwrap_or_default();
            result.push(HostEntry {
                hostname: wi.hostname.clone(),
                ip,
                mac: mac.clone(),
                interface: "802.11".to_string(),
                rssi: wi.rssi.clone(),
                ssid: wi.ssid.clone(),
            });
        }
        return serde_json::to_string(&result).ok();
    }

    let mut result = Vec::new();
    for idx in 1..=64 {
        let Some(e) = entries.get(&idx) else { continue };
        if e.ip.is_empty() && e.mac.is_empty() {
            continue;
        }
        let mut e = e.clone();
        if !e.mac.is_empty() {
            if let Some((_, wi)) = mac_to_assoc.get(&e.mac.to_lowercase()) {
                e.rssi = wi.rssi.clone();
                e.ssid = wi.ssid.clone();
                if e.hostname.is_empty() && !wi.hostname.is_empty() {
                    e.hostname = wi.hostname.clone();
                }
            }
        }
        result.push(e);
    }
    if result.is_empty() {
        return None;
    }
    serde_json::to_string(&result).ok()
}

/// Split `"N.Rest"` into the numeric index and the remaining field path
fn split_indexed(rest: &str) -> Option<(usize, &str)> {
    let (idx, field) = rest.split_once('.')?;
    let idx = idx.parse::<usize>().ok()?;
    Some((idx, field))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_detect_device_type() {
        assert_eq!(detect_device_type("ZTE", "F680"), DEVICE_TYPE_ONT);
        assert_eq!(detect_device_type("Huawei", "EG8145V5"), DEVICE_TYPE_ONT);
        assert_eq!(detect_device_type("Huawei", "AR617"), DEVICE_TYPE_ROUTER);
        assert_eq!(detect_device_type("FiberHome", "AN5506-04"), DEVICE_TYPE_ONT);
        assert_eq!(detect_device_type("Nokia", "G-140W"), DEVICE_TYPE_ONT);
        assert_eq!(detect_device_type("Acme", "GPON Home Gateway"), DEVICE_TYPE_ONT);
        assert_eq!(detect_device_type("MikroTik", "RB750"), DEVICE_TYPE_ROUTER);
        assert_eq!(detect_device_type("Unknown", "CPE"), DEVICE_TYPE_ROUTER);
    }

    #[test]
    fn test_param_group_tag() {
        assert_eq!(param_group_tag("Device.WiFi.SSID.1.SSID"), "Device.WiFi.");
        assert_eq!(param_group_tag("Device.DeviceInfo.UpTime"), "Device.DeviceInfo.");
        assert_eq!(param_group_tag("Device.DeviceInfo.ModelName"), "Device.DeviceInfo.");
        assert_eq!(param_group_tag("Something.Else"), "");
    }

    #[test]
    fn test_parse_wifi_tr098() {
        let p = params(&[
            ("InternetGatewayDevice.LANDevice.1.WLANConfiguration.1.SSID", "home"),
            ("InternetGatewayDevice.LANDevice.1.WLANConfiguration.1.KeyPassphrase", "secret"),
            ("InternetGatewayDevice.LANDevice.1.WLANConfiguration.1.Enable", "true"),
            ("InternetGatewayDevice.LANDevice.1.WLANConfiguration.1.Channel", "6"),
            ("InternetGatewayDevice.LANDevice.1.WLANConfiguration.5.SSID", "guest"),
            ("InternetGatewayDevice.LANDevice.1.WLANConfiguration.5.PreSharedKey.1.KeyPassphrase", "guestpw"),
            // index without an SSID never surfaces
            ("InternetGatewayDevice.LANDevice.1.WLANConfiguration.2.Enable", "true"),
        ]);
        let json = parse_wifi_ssids(&p).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 2);
        assert_eq!(v[0]["idx"], 1);
        assert_eq!(v[0]["ssid"], "home");
        assert_eq!(v[0]["password"], "secret");
        assert_eq!(v[0]["channel"], "6");
        assert_eq!(v[1]["idx"], 5);
        assert_eq!(v[1]["password"], "guestpw");
    }

    #[test]
    fn test_parse_wifi_channel_tiebreak() {
        let p = params(&[
            ("InternetGatewayDevice.LANDevice.1.WLANConfiguration.1.SSID", "a"),
            ("InternetGatewayDevice.LANDevice.1.WLANConfiguration.1.ChannelsInUse", "11"),
            ("InternetGatewayDevice.LANDevice.1.WLANConfiguration.1.Channel", "1"),
        ]);
        let json = parse_wifi_ssids(&p).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v[0]["channel"], "1");
    }

    #[test]
    fn test_parse_wifi_tr181() {
        let p = params(&[
            ("Device.WiFi.SSID.1.SSID", "fiber-net"),
            ("Device.WiFi.SSID.1.Enable", "true"),
            ("Device.WiFi.AccessPoint.1.Security.KeyPassphrase", "pw181"),
        ]);
        let json = parse_wifi_ssids(&p).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v[0]["ssid"], "fiber-net");
        assert_eq!(v[0]["password"], "pw181");
    }

    #[test]
    fn test_parse_wifi_empty() {
        assert!(parse_wifi_ssids(&params(&[])).is_none());
    }

    #[test]
    fn test_parse_wan_pppoe_with_vendor_fields() {
        let p = params(&[
            ("InternetGatewayDevice.WANDevice.1.WANConnectionDevice.1.WANPPPConnection.1.Name", "INTERNET_R_VID_220"),
            ("InternetGatewayDevice.WANDevice.1.WANConnectionDevice.1.WANPPPConnection.1.Username", "user@isp"),
            ("InternetGatewayDevice.WANDevice.1.WANConnectionDevice.1.WANPPPConnection.1.ExternalIPAddress", "100.64.1.2"),
            ("InternetGatewayDevice.WANDevice.1.WANConnectionDevice.1.WANPPPConnection.1.X_CT-COM_ServiceList", "INTERNET"),
            ("InternetGatewayDevice.WANDevice.1.WANConnectionDevice.1.WANPPPConnection.1.X_ZTE-COM_VLANID", "220"),
            ("InternetGatewayDevice.WANDevice.1.WANConnectionDevice.1.WANPPPConnection.1.Enable", "true"),
        ]);
        let json = parse_wan_connections(&p).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v[0]["type"], "PPPoE");
        assert_eq!(v[0]["service"], "INTERNET");
        assert_eq!(v[0]["vlan_id"], "220");
        assert_eq!(v[0]["ip_mode"], "IPv4");
    }

    #[test]
    fn test_parse_wan_bridge_override_and_device_level_vlan() {
        let p = params(&[
            ("InternetGatewayDevice.WANDevice.1.WANConnectionDevice.2.WANIPConnection.1.Name", "IPTV"),
            ("InternetGatewayDevice.WANDevice.1.WANConnectionDevice.2.WANIPConnection.1.ConnectionType", "IP_Bridged"),
            ("InternetGatewayDevice.WANDevice.1.WANConnectionDevice.2.X_CT-COM_WANGponLinkConfig.VLANIDMark", "45"),
        ]);
        let json = parse_wan_connections(&p).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v[0]["type"], "Bridge");
        assert_eq!(v[0]["vlan_id"], "45");
        assert_eq!(v[0]["ip_mode"], "-");
    }

    #[test]
    fn test_parse_wan_ip_mode_mapping() {
        let p = params(&[
            ("InternetGatewayDevice.WANDevice.1.WANConnectionDevice.1.WANPPPConnection.1.Name", "NET"),
            ("InternetGatewayDevice.WANDevice.1.WANConnectionDevice.1.WANPPPConnection.1.X_CT-COM_IPMode", "3"),
        ]);
        let json = parse_wan_connections(&p).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v[0]["ip_mode"], "Dual Stack");
    }

    #[test]
    fn test_parse_wan_orders_by_composite_key() {
        let p = params(&[
            ("InternetGatewayDevice.WANDevice.1.WANConnectionDevice.2.WANIPConnection.1.Name", "second"),
            ("InternetGatewayDevice.WANDevice.1.WANConnectionDevice.1.WANPPPConnection.1.Name", "first"),
        ]);
        let json = parse_wan_connections(&p).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v[0]["name"], "first");
        assert_eq!(v[1]["name"], "second");
    }

    #[test]
    fn test_parse_hosts_merges_wifi_rssi() {
        let p = params(&[
            ("InternetGatewayDevice.LANDevice.1.Hosts.Host.1.HostName", "laptop"),
            ("InternetGatewayDevice.LANDevice.1.Hosts.Host.1.IPAddress", "192.168.1.10"),
            ("InternetGatewayDevice.LANDevice.1.Hosts.Host.1.MACAddress", "AA:BB:CC:DD:EE:FF"),
            ("InternetGatewayDevice.LANDevice.1.Hosts.Host.1.InterfaceType", "802.11"),
            ("InternetGatewayDevice.LANDevice.1.WLANConfiguration.1.AssociatedDevice.1.AssociatedDeviceMACAddress", "aa:bb:cc:dd:ee:ff"),
            ("InternetGatewayDevice.LANDevice.1.WLANConfiguration.1.AssociatedDevice.1.AssociatedDeviceRssi", "-67"),
        ]);
        let json = parse_host_devices(&p).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v[0]["hostname"], "laptop");
        assert_eq!(v[0]["rssi"], "-67");
        assert_eq!(v[0]["ssid"], "1");
    }

    #[test]
    fn test_parse_hosts_fallback_without_hosts_table() {
        let p = params(&[
            ("InternetGatewayDevice.LANDevice.1.WLANConfiguration.2.AssociatedDevice.1.AssociatedDeviceMACAddress", "11:22:33:44:55:66"),
            ("InternetGatewayDevice.LANDevice.1.WLANConfiguration.2.AssociatedDevice.1.AssociatedDeviceIPAddress", "192.168.1.33"),
            ("InternetGatewayDevice.LANDevice.1.WLANConfiguration.2.AssociatedDevice.1.X_HW_RSSI", "-71"),
        ]);
        let json = parse_host_devices(&p).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v[0]["mac"], "11:22:33:44:55:66");
        assert_eq!(v[0]["ip"], "192.168.1.33");
        assert_eq!(v[0]["interface"], "802.11");
        assert_eq!(v[0]["rssi"], "-71");
    }

    #[test]
    fn test_telemetry_zte_optical_fallback() {
        let p = params(&[
            ("InternetGatewayDevice.WANDevice.1.X_ZTE-COM_WANPONInterfaceConfig.RXPower", "-18.7"),
            ("InternetGatewayDevice.WANDevice.1.X_ZTE-COM_WANPONInterfaceConfig.TXPower", "2.1"),
        ]);
        let t = telemetry_from_params("ZTE", &p);
        assert_eq!(t.fiber_rx_power.as_deref(), Some("-18.7"));
        assert_eq!(t.fiber_tx_power.as_deref(), Some("2.1"));
        assert_eq!(t.device_type.as_deref(), Some(DEVICE_TYPE_ONT));
    }

    #[test]
    fn test_telemetry_mikrotik_skips_optical() {
        let p = params(&[
            ("Device.DeviceInfo.X_MIKROTIK_ArchName", "arm64"),
            ("Device.DeviceInfo.X_MIKROTIK_SystemIdentity", "core-router"),
            ("Device.Optical.Interface.1.RxPower", "-20.0"),
        ]);
        let t = telemetry_from_params("MikroTik", &p);
        assert_eq!(t.arch_name.as_deref(), Some("arm64"));
        assert_eq!(t.system_name.as_deref(), Some("core-router"));
        assert!(t.fiber_rx_power.is_none());
        assert!(t.device_type.is_none());
    }

    #[test]
    fn test_telemetry_from_inform_pon_sn_fallback() {
        let inform = Inform {
            sn: "ZTEG1234".to_string(),
            manufacturer: "ZTE".to_string(),
            ..Inform::default()
        };
        let t = telemetry_from_inform(&inform);
        assert_eq!(t.pon_sn_hex.as_deref(), Some("ZTEG1234"));
    }
}
