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

//! ZTE OLT SNMP Driver
//!
//! Two OID families cover the fleet: C3xx (C300/C320) and C6xx (C620/C650/
//! ZXAN), selected by model prefix match. All reads are SNMPv2c over the
//! blocking `snmp2` session; the poller wraps calls in `spawn_blocking`.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use log::{info, warn};
use snmp2::{Oid, SyncSession, Value};

const OID_SYS_NAME: &[u64] = &[1, 3, 6, 1, 2, 1, 1, 5, 0];
const OID_SYS_DESCR: &[u64] = &[1, 3, 6, 1, 2, 1, 1, 1, 0];
const OID_SYS_UPTIME: &[u64] = &[1, 3, 6, 1, 2, 1, 1, 3, 0];

const OID_IF_NAME: &[u64] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 1];

// C6xx / ZXAN family (C620, C650, ...)
const OID_C6XX_ONU_SERIAL: &[u64] = &[1, 3, 6, 1, 4, 1, 3902, 1082, 500, 10, 2, 3, 3, 1, 6];
const OID_C6XX_ONU_TYPE: &[u64] = &[1, 3, 6, 1, 4, 1, 3902, 1082, 500, 10, 2, 3, 3, 1, 1];
const OID_C6XX_ONU_NAME: &[u64] = &[1, 3, 6, 1, 4, 1, 3902, 1082, 500, 10, 2, 3, 3, 1, 2];
const OID_C6XX_ONU_RX_POWER: &[u64] = &[1, 3, 6, 1, 4, 1, 3902, 1082, 500, 20, 2, 2, 2, 1, 10];
const OID_C6XX_ONU_PHASE_STATE: &[u64] = &[1, 3, 6, 1, 4, 1, 3902, 1082, 500, 10, 2, 3, 8, 1, 4];
const OID_C6XX_ONU_LAST_ONLINE: &[u64] = &[1, 3, 6, 1, 4, 1, 3902, 1082, 500, 10, 2, 3, 8, 1, 5];
const OID_C6XX_ONU_LAST_OFFLINE: &[u64] = &[1, 3, 6, 1, 4, 1, 3902, 1082, 500, 10, 2, 3, 8, 1, 6];

// C3xx family (C300, C320)
const OID_C3XX_ONU_SERIAL: &[u64] = &[1, 3, 6, 1, 4, 1, 3902, 1012, 3, 28, 1, 1, 5];
const OID_C3XX_ONU_TYPE: &[u64] = &[1, 3, 6, 1, 4, 1, 3902, 1012, 3, 28, 1, 1, 1];
const OID_C3XX_ONU_NAME: &[u64] = &[1, 3, 6, 1, 4, 1, 3902, 1012, 3, 28, 1, 1, 3];
const OID_C3XX_ONU_RX_POWER: &[u64] = &[1, 3, 6, 1, 4, 1, 3902, 1012, 3, 50, 12, 1, 1, 10];
const OID_C3XX_ONU_PHASE_STATE: &[u64] = &[1, 3, 6, 1, 4, 1, 3902, 1012, 3, 28, 2, 1, 4];
const OID_C3XX_ONU_LAST_ONLINE: &[u64] = &[1, 3, 6, 1, 4, 1, 3902, 1012, 3, 28, 2, 1, 8];
const OID_C3XX_ONU_LAST_OFFLINE: &[u64] = &[1, 3, 6, 1, 4, 1, 3902, 1012, 3, 28, 2, 1, 9];

struct OidSet {
    serial: &'static [u64],
    onu_type: &'static [u64],
    name: &'static [u64],
    rx_power: &'static [u64],
    phase_state: &'static [u64],
    last_online: &'static [u64],
    last_offline: &'static [u64],
}

const C3XX_OIDS: OidSet = OidSet {
    serial: OID_C3XX_ONU_SERIAL,
    onu_type: OID_C3XX_ONU_TYPE,
    name: OID_C3XX_ONU_NAME,
    rx_power: OID_C3XX_ONU_RX_POWER,
    phase_state: OID_C3XX_ONU_PHASE_STATE,
    last_online: OID_C3XX_ONU_LAST_ONLINE,
    last_offline: OID_C3XX_ONU_LAST_OFFLINE,
};

const C6XX_OIDS: OidSet = OidSet {
    serial: OID_C6XX_ONU_SERIAL,
    onu_type: OID_C6XX_ONU_TYPE,
    name: OID_C6XX_ONU_NAME,
    rx_power: OID_C6XX_ONU_RX_POWER,
    phase_state: OID_C6XX_ONU_PHASE_STATE,
    last_online: OID_C6XX_ONU_LAST_ONLINE,
    last_offline: OID_C6XX_ONU_LAST_OFFLINE,
};

/// Polled per-ONU data
#[derive(Debug, Clone, Default)]
pub struct OnuData {
    pub if_index: i32,
    pub onu_id: i32,
    pub serial_number: String,
    pub name: String,
    pub onu_type: String,
    pub phase_state: String,
    pub rx_power: f64,
    pub pon_port: String,
    pub online_time: String,
    pub offline_time: String,
}

/// Basic OLT system info
#[derive(Debug, Clone, Default)]
pub struct OltInfo {
    pub sys_name: String,
    pub sys_descr: String,
    pub uptime: String,
}

/// ONU phase-state names indexed by the integer the MIB reports
pub fn phase_state_name(value: i64) -> String {
    match value {
        1 => "logging".to_string(),
        2 => "los".to_string(),
        3 => "syncMib".to_string(),
        4 => "working".to_string(),
        5 => "dyingGasp".to_string(),
        6 => "authFailed".to_string(),
        7 => "offline".to_string(),
        other => format!("unknown({other})"),
    }
}

/// Convert the raw unsigned 16-bit RX power reading to dBm.
/// Readings above 32767 are two's-complement negative.
pub fn rx_power_dbm(raw: i64) -> f64 {
    if (0..=32767).contains(&raw) {
        raw as f64 * 0.002 - 30.0
    } else if raw > 32767 {
        (raw - 65536) as f64 * 0.002 - 30.0
    } else {
        -40.0
    }
}

/// Decode an ONU serial number. Printable ASCII passes through; otherwise
/// the first 4 bytes are the ASCII vendor prefix and the rest is hex.
pub fn decode_serial(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return String::new();
    }
    if bytes.iter().all(|&b| (32..=126).contains(&b)) {
        return String::from_utf8_lossy(bytes).trim().to_string();
    }
    if bytes.len() >= 8 {
        let vendor = String::from_utf8_lossy(&bytes[..4]).to_string();
        return format!("{}{}", vendor, hex::encode_upper(&bytes[4..]));
    }
    hex::encode_upper(bytes)
}

/// Decode the 7-byte SNMP DateAndTime format
pub fn decode_datetime(bytes: &[u8]) -> String {
    if bytes.len() < 7 {
        return String::new();
    }
    let year = ((bytes[0] as u16) << 8) + bytes[1] as u16;
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year, bytes[2], bytes[3], bytes[4], bytes[5], bytes[6]
    )
}

/// Decompose a ZTE ifIndex into shelf/slot/port (same layout on both
/// families); falls back to the raw index when all components are zero.
pub fn if_index_to_pon_port(if_index: i32) -> String {
    let shelf = (if_index >> 16) & 0xff;
    let slot = (if_index >> 8) & 0xff;
    let port = if_index & 0xff;
    if shelf == 0 && slot == 0 && port == 0 {
        format!("ifIndex-{if_index}")
    } else {
        format!("gpon_olt-{shelf}/{slot}/{port}")
    }
}

/// Render sysUpTime hundredths-of-seconds as days/hours/minutes
pub fn format_uptime(ticks: u32) -> String {
    let mut secs = ticks / 100;
    let days = secs / 86400;
    secs %= 86400;
    let hours = secs / 3600;
    secs %= 3600;
    let mins = secs / 60;
    format!("{days}d {hours}h {mins}m")
}

/// Owned SNMP value extracted from a response varbind
#[derive(Debug, Clone)]
enum OwnedValue {
    Int(i64),
    Uint(u64),
    Bytes(Vec<u8>),
    EndOfMib,
    Other,
}

impl OwnedValue {
    fn from_value(value: &Value<'_>) -> Self {
        match value {
            Value::Integer(i) => OwnedValue::Int(*i),
            Value::Counter32(u) => OwnedValue::Uint(*u as u64),
            Value::Unsigned32(u) => OwnedValue::Uint(*u as u64),
            Value::Timeticks(u) => OwnedValue::Uint(*u as u64),
            Value::Counter64(u) => OwnedValue::Uint(*u),
            Value::OctetString(b) => OwnedValue::Bytes(b.to_vec()),
            Value::EndOfMibView => OwnedValue::EndOfMib,
            _ => OwnedValue::Other,
        }
    }

    fn as_i64(&self) -> i64 {
        match self {
            OwnedValue::Int(i) => *i,
            OwnedValue::Uint(u) => *u as i64,
            _ => 0,
        }
    }

    fn as_string(&self) -> String {
        match self {
            OwnedValue::Bytes(b) => String::from_utf8_lossy(b).trim().to_string(),
            OwnedValue::Int(i) => i.to_string(),
            OwnedValue::Uint(u) => u.to_string(),
            _ => String::new(),
        }
    }
}

/// SNMP driver for ZTE OLTs (C3xx and C6xx families)
#[derive(Debug, Clone)]
pub struct ZteDriver {
    target: String,
    port: u16,
    community: String,
    model: String,
}

impl ZteDriver {
    pub fn new(ip: &str, port: u16, community: &str, model: &str) -> Self {
        ZteDriver {
            target: ip.to_string(),
            port,
            community: community.to_string(),
            model: model.to_uppercase(),
        }
    }

    fn is_c3xx(&self) -> bool {
        self.model.contains("C300") || self.model.contains("C320")
    }

    fn oids(&self) -> &'static OidSet {
        if self.is_c3xx() {
            &C3XX_OIDS
        } else {
            &C6XX_OIDS
        }
    }

    fn platform(&self) -> &'static str {
        if self.is_c3xx() {
            "C3xx"
        } else {
            "C6xx"
        }
    }

    fn open(&self) -> Result<SyncSession> {
        let addr = format!("{}:{}", self.target, self.port);
        SyncSession::new_v2c(
            addr.as_str(),
            self.community.as_bytes(),
            Some(Duration::from_secs(10)),
            0,
        )
        .map_err(|e| anyhow!("SNMP connect to {} failed: {:?}", addr, e))
    }

    fn get_one(&self, sess: &mut SyncSession, oid: &[u64]) -> Result<OwnedValue> {
        let oid = Oid::from(oid).map_err(|e| anyhow!("bad OID: {:?}", e))?;
        let pdu = sess
            .get(&oid)
            .map_err(|e| anyhow!("SNMP get failed: {:?}", e))?;
        for (_oid, value) in pdu.varbinds {
            return Ok(OwnedValue::from_value(&value));
        }
        Ok(OwnedValue::Other)
    }

    /// Read sysName/sysDescr/sysUptime; doubles as the reachability probe
    pub fn test_connection(&self) -> Result<OltInfo> {
        let mut sess = self.open()?;
        let mut info = OltInfo::default();
        info.sys_name = self.get_one(&mut sess, OID_SYS_NAME)?.as_string();
        info.sys_descr = self.get_one(&mut sess, OID_SYS_DESCR)?.as_string();
        if let OwnedValue::Uint(ticks) = self.get_one(&mut sess, OID_SYS_UPTIME)? {
            info.uptime = format_uptime(ticks as u32);
        }
        Ok(info)
    }

    /// Walk a subtree via repeated getnext; returns (index-suffix, value)
    /// pairs relative to the base OID.
    fn walk(&self, sess: &mut SyncSession, base: &[u64]) -> Result<Vec<(Vec<i64>, OwnedValue)>> {
        let base_str = base
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(".");
        let base_prefix = format!("{base_str}.");

        let mut out = Vec::new();
        let mut current = base_str;
        loop {
            let components: Vec<u64> = current
                .split('.')
                .filter_map(|p| p.parse().ok())
                .collect();
            let oid = Oid::from(components.as_slice())
                .map_err(|e| anyhow!("bad OID {}: {:?}", current, e))?;

            let mut step: Option<(String, OwnedValue)> = None;
            {
                let pdu = sess
                    .getnext(&oid)
                    .map_err(|e| anyhow!("SNMP getnext failed: {:?}", e))?;
                for (roid, value) in pdu.varbinds {
                    step = Some((roid.to_string(), OwnedValue::from_value(&value)));
                    break;
                }
            }

            let Some((oid_str, value)) = step else { break };
            if matches!(value, OwnedValue::EndOfMib) || !oid_str.starts_with(&base_prefix) {
                break;
            }
            let suffix: Vec<i64> = oid_str[base_prefix.len()..]
                .split('.')
                .filter_map(|p| p.parse().ok())
                .collect();
            out.push((suffix, value));
            current = oid_str;
        }
        Ok(out)
    }

    /// Poll every registered ONU from the OLT
    pub fn poll_onus(&self) -> Result<Vec<OnuData>> {
        let mut sess = self.open()?;
        let oids = self.oids();
        info!(
            "[ZTE/{}] polling ONUs on {} (model: {})",
            self.platform(),
            self.target,
            self.model
        );

        // PON port names for ifIndex -> name mapping
        let mut pon_ports: HashMap<i64, String> = HashMap::new();
        match self.walk(&mut sess, OID_IF_NAME) {
            Ok(rows) => {
                for (suffix, value) in rows {
                    let name = value.as_string();
                    let lower = name.to_lowercase();
                    if lower.contains("gpon") || lower.contains("pon_olt") || lower.contains("pon-olt")
                    {
                        if let Some(&if_index) = suffix.last() {
                            pon_ports.insert(if_index, name);
                        }
                    }
                }
            }
            Err(e) => warn!("[ZTE] ifName walk failed: {e}"),
        }

        // Serial numbers drive the key set: ifIndex.onuId
        let mut serials: HashMap<(i64, i64), String> = HashMap::new();
        for (suffix, value) in self.walk(&mut sess, oids.serial)? {
            let Some(key) = two_part_key(&suffix) else { continue };
            if let OwnedValue::Bytes(bytes) = &value {
                let sn = decode_serial(bytes);
                if !sn.is_empty() {
                    serials.insert(key, sn);
                }
            }
        }
        info!("[ZTE/{}] found {} ONUs by SN", self.platform(), serials.len());

        let mut types: HashMap<(i64, i64), String> = HashMap::new();
        for (suffix, value) in self.walk(&mut sess, oids.onu_type).unwrap_or_default() {
            if let Some(key) = two_part_key(&suffix) {
                types.insert(key, value.as_string());
            }
        }

        let mut names: HashMap<(i64, i64), String> = HashMap::new();
        for (suffix, value) in self.walk(&mut sess, oids.name).unwrap_or_default() {
            if let Some(key) = two_part_key(&suffix) {
                names.insert(key, value.as_string());
            }
        }

        let mut states: HashMap<(i64, i64), String> = HashMap::new();
        for (suffix, value) in self.walk(&mut sess, oids.phase_state).unwrap_or_default() {
            if let Some(key) = two_part_key(&suffix) {
                states.insert(key, phase_state_name(value.as_i64()));
            }
        }

        // RX power rows use a 3-part index: ifIndex.onuId.serviceIndex
        let mut rx_powers: HashMap<(i64, i64), f64> = HashMap::new();
        for (suffix, value) in self.walk(&mut sess, oids.rx_power).unwrap_or_default() {
            if suffix.len() < 3 {
                continue;
            }
            let key = (suffix[suffix.len() - 3], suffix[suffix.len() - 2]);
            rx_powers.insert(key, rx_power_dbm(value.as_i64()));
        }

        let mut online_times: HashMap<(i64, i64), String> = HashMap::new();
        for (suffix, value) in self.walk(&mut sess, oids.last_online).unwrap_or_default() {
            if let Some(key) = two_part_key(&suffix) {
                if let OwnedValue::Bytes(bytes) = &value {
                    online_times.insert(key, decode_datetime(bytes));
                }
            }
        }
        let mut offline_times: HashMap<(i64, i64), String> = HashMap::new();
        for (suffix, value) in self.walk(&mut sess, oids.last_offline).unwrap_or_default() {
            if let Some(key) = two_part_key(&suffix) {
                if let OwnedValue::Bytes(bytes) = &value {
                    offline_times.insert(key, decode_datetime(bytes));
                }
            }
        }

        let mut onus = Vec::with_capacity(serials.len());
        for ((if_index, onu_id), serial_number) in serials {
            let key = (if_index, onu_id);
            let pon_port = pon_ports
                .get(&if_index)
                .cloned()
                .unwrap_or_else(|| if_index_to_pon_port(if_index as i32));
            onus.push(OnuData {
                if_index: if_index as i32,
                onu_id: onu_id as i32,
                serial_number,
                name: names.get(&key).cloned().unwrap_or_default(),
                onu_type: types.get(&key).cloned().unwrap_or_default(),
                phase_state: states.get(&key).cloned().unwrap_or_default(),
                rx_power: rx_powers.get(&key).copied().unwrap_or(0.0),
                pon_port,
                online_time: online_times.get(&key).cloned().unwrap_or_default(),
                offline_time: offline_times.get(&key).cloned().unwrap_or_default(),
            });
        }
        Ok(onus)
    }
}

fn two_part_key(suffix: &[i64]) -> Option<(i64, i64)> {
    if suffix.len() < 2 {
        return None;
    }
    Some((suffix[suffix.len() - 2], suffix[suffix.len() - 1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rx_power_conversion() {
        // 12500 * 0.002 - 30 = -5.0
        assert!((rx_power_dbm(12500) - (-5.0)).abs() < 1e-9);
        // (40000 - 65536) * 0.002 - 30 = -81.072
        assert!((rx_power_dbm(40000) - (-81.072)).abs() < 1e-9);
        assert!((rx_power_dbm(0) - (-30.0)).abs() < 1e-9);
        assert!((rx_power_dbm(-5) - (-40.0)).abs() < 1e-9);
    }

    #[test]
    fn test_phase_state_names() {
        assert_eq!(phase_state_name(1), "logging");
        assert_eq!(phase_state_name(4), "working");
        assert_eq!(phase_state_name(7), "offline");
        assert_eq!(phase_state_name(42), "unknown(42)");
    }

    #[test]
    fn test_decode_serial_printable() {
        assert_eq!(decode_serial(b"ZTEG12345678"), "ZTEG12345678");
        assert_eq!(decode_serial(b"  ABCD99  "), "ABCD99");
    }

    #[test]
    fn test_decode_serial_binary() {
        // 4-byte ASCII vendor prefix + hex of remaining bytes
        let raw = [b'Z', b'T', b'E', b'G', 0x12, 0x34, 0x56, 0x78];
        assert_eq!(decode_serial(&raw), "ZTEG12345678");
        // fully binary and short: all hex
        assert_eq!(decode_serial(&[0x01, 0x02]), "0102");
        // zero-length bytes yield the empty string
        assert_eq!(decode_serial(&[]), "");
    }

    #[test]
    fn test_if_index_to_pon_port() {
        let if_index = (1 << 16) | (2 << 8) | 9;
        assert_eq!(if_index_to_pon_port(if_index), "gpon_olt-1/2/9");
        assert_eq!(if_index_to_pon_port(0), "ifIndex-0");
    }

    #[test]
    fn test_decode_datetime() {
        let raw = [0x07, 0xE9, 3, 14, 15, 9, 26];
        assert_eq!(decode_datetime(&raw), "2025-03-14 15:09:26");
        assert_eq!(decode_datetime(&[1, 2, 3]), "");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(8640000), "1d 0h 0m");
        assert_eq!(format_uptime(360000), "0d 1h 0m");
    }
}
