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

//! CWMP Message Types
//!
//! The closed set of TR-069 RPC envelopes this ACS understands, modeled as a
//! tagged union so every consumer pattern-matches exhaustively. The envelope
//! ID travels unchanged between a request and its response; it is the only
//! request/response correlation mechanism on the wire.

use std::collections::HashMap;

/// TR-069 event codes carried in Inform messages
pub const EVENT_BOOTSTRAP: &str = "0 BOOTSTRAP";
pub const EVENT_BOOT: &str = "1 BOOT";
pub const EVENT_PERIODIC: &str = "2 PERIODIC";
pub const EVENT_SCHEDULED: &str = "3 SCHEDULED";
pub const EVENT_VALUE_CHANGE: &str = "4 VALUE CHANGE";
pub const EVENT_CONNECTION_REQUEST: &str = "6 CONNECTION REQUEST";
pub const EVENT_TRANSFER_COMPLETE: &str = "7 TRANSFER COMPLETE";

/// A typed parameter value as carried in SetParameterValues
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamValue {
    /// XML schema type, e.g. "xsd:string", "xsd:boolean", "xsd:unsignedInt"
    pub xsd_type: String,
    pub value: String,
}

impl ParamValue {
    pub fn string(value: impl Into<String>) -> Self {
        ParamValue {
            xsd_type: "xsd:string".to_string(),
            value: value.into(),
        }
    }

    pub fn boolean(value: bool) -> Self {
        ParamValue {
            xsd_type: "xsd:boolean".to_string(),
            value: value.to_string(),
        }
    }

    pub fn unsigned_int(value: impl Into<String>) -> Self {
        ParamValue {
            xsd_type: "xsd:unsignedInt".to_string(),
            value: value.into(),
        }
    }
}

/// One entry of the Inform EventStruct list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventCode {
    pub code: String,
    pub command_key: String,
}

/// The first envelope of every CWMP session, carrying device identity,
/// the event list that triggered the session, and a parameter snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Inform {
    pub id: String,
    pub sn: String,
    pub oui: String,
    pub manufacturer: String,
    pub product_class: String,
    pub max_envelopes: u32,
    pub retry_count: u32,
    pub events: Vec<EventCode>,
    pub params: HashMap<String, String>,
}

impl Inform {
    /// True if the Inform carries the given event code (e.g. "0 BOOTSTRAP")
    pub fn is_event(&self, code: &str) -> bool {
        self.events.iter().any(|e| e.code == code)
    }

    /// Parameter lookup by full dotted path; empty string when absent
    pub fn get_param(&self, name: &str) -> &str {
        self.params.get(name).map(String::as_str).unwrap_or("")
    }

    /// First non-empty CommandKey among the events
    pub fn command_key(&self) -> &str {
        self.events
            .iter()
            .map(|e| e.command_key.as_str())
            .find(|k| !k.is_empty())
            .unwrap_or("")
    }

    pub fn software_version(&self) -> &str {
        let v = self.get_param("Device.DeviceInfo.SoftwareVersion");
        if v.is_empty() {
            self.get_param("InternetGatewayDevice.DeviceInfo.SoftwareVersion")
        } else {
            v
        }
    }

    pub fn connection_request_url(&self) -> &str {
        let v = self.get_param("Device.ManagementServer.ConnectionRequestURL");
        if v.is_empty() {
            self.get_param("InternetGatewayDevice.ManagementServer.ConnectionRequestURL")
        } else {
            v
        }
    }

    /// True when the device speaks the TR-098 data model
    /// (paths rooted at `InternetGatewayDevice.`), false for TR-181.
    pub fn uses_tr098(&self) -> bool {
        self.params
            .keys()
            .any(|name| name.starts_with("InternetGatewayDevice."))
    }

    /// Root prefix of the ManagementServer subtree for this device's model
    pub fn management_server_prefix(&self) -> &'static str {
        if self.uses_tr098() {
            "InternetGatewayDevice.ManagementServer."
        } else {
            "Device.ManagementServer."
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InformResponse {
    pub id: String,
    pub max_envelopes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetParameterValues {
    pub id: String,
    pub parameter_names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetParameterValuesResponse {
    pub id: String,
    pub values: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetParameterValues {
    pub id: String,
    pub params: HashMap<String, ParamValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetParameterValuesResponse {
    pub id: String,
    /// 0 = applied, 1 = applied but a reboot is required
    pub status: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetParameterNames {
    pub id: String,
    pub parameter_path: String,
    pub next_level: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    pub name: String,
    pub writable: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetParameterNamesResponse {
    pub id: String,
    pub params: Vec<ParameterInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub id: String,
    pub command_key: String,
    /// e.g. "1 Firmware Upgrade Image", "3 Vendor Configuration File"
    pub file_type: String,
    pub url: String,
    pub username: String,
    pub password: String,
    pub file_size: u64,
    pub target_file_name: String,
    pub delay_seconds: u32,
    pub success_url: String,
    pub failure_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResponse {
    pub id: String,
    pub status: i32,
    pub start_time: String,
    pub complete_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub id: String,
    pub command_key: String,
    /// e.g. "2 Vendor Log File", "1 Vendor Configuration File"
    pub file_type: String,
    pub url: String,
    pub username: String,
    pub password: String,
    pub delay_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    pub id: String,
    pub status: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferComplete {
    pub id: String,
    pub command_key: String,
    pub fault_code: i32,
    pub fault_string: String,
    pub start_time: String,
    pub complete_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCompleteResponse {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRPCMethods {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRPCMethodsResponse {
    pub id: String,
    pub methods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reboot {
    pub id: String,
    pub command_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebootResponse {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryReset {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactoryResetResponse {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleInform {
    pub id: String,
    pub delay_seconds: u32,
    pub command_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleInformResponse {
    pub id: String,
}

/// A SOAP fault from the CPE. The CWMP detail block, when present, carries
/// the interesting code (9001..9899 range); the bare SOAP faultstring is the
/// fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub id: String,
    pub code: i32,
    pub string: String,
}

/// The closed CWMP message set
#[derive(Debug, Clone, PartialEq)]
pub enum CwmpMessage {
    Inform(Inform),
    InformResponse(InformResponse),
    GetParameterValues(GetParameterValues),
    GetParameterValuesResponse(GetParameterValuesResponse),
    SetParameterValues(SetParameterValues),
    SetParameterValuesResponse(SetParameterValuesResponse),
    GetParameterNames(GetParameterNames),
    GetParameterNamesResponse(GetParameterNamesResponse),
    Download(Download),
    DownloadResponse(DownloadResponse),
    Upload(Upload),
    UploadResponse(UploadResponse),
    TransferComplete(TransferComplete),
    TransferCompleteResponse(TransferCompleteResponse),
    GetRPCMethods(GetRPCMethods),
    GetRPCMethodsResponse(GetRPCMethodsResponse),
    Reboot(Reboot),
    RebootResponse(RebootResponse),
    FactoryReset(FactoryReset),
    FactoryResetResponse(FactoryResetResponse),
    ScheduleInform(ScheduleInform),
    ScheduleInformResponse(ScheduleInformResponse),
    Fault(Fault),
}

impl CwmpMessage {
    /// Wire name of the message (the first element inside the SOAP Body)
    pub fn name(&self) -> &'static str {
        match self {
            CwmpMessage::Inform(_) => "Inform",
            CwmpMessage::InformResponse(_) => "InformResponse",
            CwmpMessage::GetParameterValues(_) => "GetParameterValues",
            CwmpMessage::GetParameterValuesResponse(_) => "GetParameterValuesResponse",
            CwmpMessage::SetParameterValues(_) => "SetParameterValues",
            CwmpMessage::SetParameterValuesResponse(_) => "SetParameterValuesResponse",
            CwmpMessage::GetParameterNames(_) => "GetParameterNames",
            CwmpMessage::GetParameterNamesResponse(_) => "GetParameterNamesResponse",
            CwmpMessage::Download(_) => "Download",
            CwmpMessage::DownloadResponse(_) => "DownloadResponse",
            CwmpMessage::Upload(_) => "Upload",
            CwmpMessage::UploadResponse(_) => "UploadResponse",
            CwmpMessage::TransferComplete(_) => "TransferComplete",
            CwmpMessage::TransferCompleteResponse(_) => "TransferCompleteResponse",
            CwmpMessage::GetRPCMethods(_) => "GetRPCMethods",
            CwmpMessage::GetRPCMethodsResponse(_) => "GetRPCMethodsResponse",
            CwmpMessage::Reboot(_) => "Reboot",
            CwmpMessage::RebootResponse(_) => "RebootResponse",
            CwmpMessage::FactoryReset(_) => "FactoryReset",
            CwmpMessage::FactoryResetResponse(_) => "FactoryResetResponse",
            CwmpMessage::ScheduleInform(_) => "ScheduleInform",
            CwmpMessage::ScheduleInformResponse(_) => "ScheduleInformResponse",
            CwmpMessage::Fault(_) => "Fault",
        }
    }

    /// Envelope ID (empty when the CPE sent none)
    pub fn id(&self) -> &str {
        match self {
            CwmpMessage::Inform(m) => &m.id,
            CwmpMessage::InformResponse(m) => &m.id,
            CwmpMessage::GetParameterValues(m) => &m.id,
            CwmpMessage::GetParameterValuesResponse(m) => &m.id,
            CwmpMessage::SetParameterValues(m) => &m.id,
            CwmpMessage::SetParameterValuesResponse(m) => &m.id,
            CwmpMessage::GetParameterNames(m) => &m.id,
            CwmpMessage::GetParameterNamesResponse(m) => &m.id,
            CwmpMessage::Download(m) => &m.id,
            CwmpMessage::DownloadResponse(m) => &m.id,
            CwmpMessage::Upload(m) => &m.id,
            CwmpMessage::UploadResponse(m) => &m.id,
            CwmpMessage::TransferComplete(m) => &m.id,
            CwmpMessage::TransferCompleteResponse(m) => &m.id,
            CwmpMessage::GetRPCMethods(m) => &m.id,
            CwmpMessage::GetRPCMethodsResponse(m) => &m.id,
            CwmpMessage::Reboot(m) => &m.id,
            CwmpMessage::RebootResponse(m) => &m.id,
            CwmpMessage::FactoryReset(m) => &m.id,
            CwmpMessage::FactoryResetResponse(m) => &m.id,
            CwmpMessage::ScheduleInform(m) => &m.id,
            CwmpMessage::ScheduleInformResponse(m) => &m.id,
            CwmpMessage::Fault(m) => &m.id,
        }
    }
}
