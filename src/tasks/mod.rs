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

//! Preset-Task Engine
//!
//! Durable units of CWMP work. Tasks come from three sources: the operator
//! surface (reboot, set-parameter, factory reset, firmware download,
//! set-WiFi, set-WAN), the bootstrap flow (management-auth,
//! periodic-inform), and scheduled events woken by CPE SCHEDULED Informs.
//!
//! Lifecycle: pending -> sent -> {success, failure}. Terminal statuses are
//! never reopened. Matching is by envelope ID or command key. A task with
//! on-failure = retry re-enters pending with attempts + 1 and an
//! exponential backoff, up to the configured cap.
//!
//! WiFi and WAN set operations are decomposed into a chain of small tasks
//! because real devices reject compound envelopes.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Local, Utc};
use log::{error, info, warn};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::cwmp::auth_client::{connection_request, md5_hex};
use crate::metrics::Metrics;
use crate::cwmp::{
    codec, CwmpMessage, Download, FactoryReset, GetParameterNames, GetParameterValues,
    GetRPCMethods, ParamValue, Reboot, SetParameterValues, Upload,
};
use crate::error::AcsResult;
use crate::registry::{CpeEntry, CwmpEventData};
use crate::store::db::{next_id, CwmpPresetTask, DatabaseQueries, NetCpe};
use crate::store::{
    SharedState, CONFIG_CPE_CONNECTION_REQUEST_PASSWORD, CONFIG_TR069_ACCESS_ADDRESS,
};

/// Event tags attached to preset tasks
pub const BOOTSTRAP_EVENT: &str = "bootstrap";
pub const BOOT_EVENT: &str = "boot";
pub const PERIODIC_EVENT: &str = "periodic";
pub const SCHEDULED_EVENT: &str = "scheduled";

/// Admin-facing success envelope: `{code: 0, msg}`
pub fn rest_success(msg: &str) -> Value {
    json!({ "code": 0, "msg": msg })
}

/// Admin-facing failure envelope: `{code: 1, msg}`; never a raw exception
pub fn rest_error(msg: &str) -> Value {
    json!({ "code": 1, "msg": msg })
}

/// Session id for a new unit of work
pub fn new_session(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// Per-session file token, valid for the current calendar day only
pub fn file_token(session: &str, secret: &str) -> String {
    let day = Local::now().format("%Y%m%d");
    md5_hex(&format!("{session}{secret}{day}"))
}

/// Persist a pending preset task carrying a rendered RPC. `order` staggers
/// created_at so chained tasks drain oldest-first.
pub async fn create_preset_task(
    state: &SharedState,
    sn: &str,
    event: &str,
    name: &str,
    onfail: &str,
    session: &str,
    message: &CwmpMessage,
    order: u32,
) -> AcsResult<()> {
    let now = Utc::now();
    let task = CwmpPresetTask {
        id: next_id(),
        preset_id: 0,
        sn: sn.to_string(),
        session: session.to_string(),
        event: event.to_string(),
        name: name.to_string(),
        onfail: onfail.to_string(),
        request: codec::emit(message),
        content: String::new(),
        status: "pending".to_string(),
        attempts: 0,
        exec_time: now,
        created_at: now + Duration::seconds(order as i64),
        updated_at: now,
    };
    DatabaseQueries::insert_preset_task(state.pool(), &task).await?;
    Ok(())
}

/// Park a scheduled-event task; it becomes pending when the CPE reports the
/// matching SCHEDULED Inform (the session doubles as the command key).
pub async fn create_scheduled_task(
    state: &SharedState,
    sn: &str,
    name: &str,
    session: &str,
    message: &CwmpMessage,
) -> AcsResult<()> {
    let now = Utc::now();
    let task = CwmpPresetTask {
        id: next_id(),
        preset_id: 0,
        sn: sn.to_string(),
        session: session.to_string(),
        event: SCHEDULED_EVENT.to_string(),
        name: name.to_string(),
        onfail: "ignore".to_string(),
        request: codec::emit(message),
        content: String::new(),
        status: "scheduled".to_string(),
        attempts: 0,
        exec_time: now,
        created_at: now,
        updated_at: now,
    };
    DatabaseQueries::insert_preset_task(state.pool(), &task).await?;
    Ok(())
}

/// Wake parked scheduled tasks for a device. With a command key only the
/// matching task moves to pending; without, all of them do (BOOT recovery).
pub async fn activate_sched_tasks(
    state: &SharedState,
    sn: &str,
    command_key: Option<&str>,
) -> AcsResult<u64> {
    let woken = DatabaseQueries::activate_sched_tasks(state.pool(), sn, command_key).await?;
    if woken > 0 {
        info!("activated {woken} scheduled task(s) for {sn}");
    }
    Ok(woken)
}

/// Claim the oldest pending task for a device, marking it sent
pub async fn next_pending_task(
    state: &SharedState,
    sn: &str,
) -> Option<CwmpPresetTask> {
    match DatabaseQueries::take_next_pending_task(state.pool(), sn).await {
        Ok(task) => task,
        Err(e) => {
            error!("pending task lookup for {sn} failed: {e}");
            None
        }
    }
}

/// Drive task lifecycle from a CPE response envelope.
///
/// SetParameterValuesResponse and Download/UploadResponse match the task by
/// envelope ID; TransferComplete matches by command key; a SOAP Fault fails
/// the task matching its envelope ID.
pub async fn update_task_status_by_response(
    state: &SharedState,
    msg: &CwmpMessage,
    max_attempts: i32,
) {
    let (session, failed, detail) = match msg {
        CwmpMessage::SetParameterValuesResponse(m) => (m.id.clone(), false, String::new()),
        CwmpMessage::DownloadResponse(m) => (m.id.clone(), false, String::new()),
        CwmpMessage::UploadResponse(m) => (m.id.clone(), false, String::new()),
        CwmpMessage::TransferComplete(m) => (
            m.command_key.clone(),
            m.fault_code != 0,
            m.fault_string.clone(),
        ),
        CwmpMessage::Fault(m) => (m.id.clone(), true, m.string.clone()),
        _ => return,
    };
    if session.is_empty() {
        return;
    }

    let task = match DatabaseQueries::get_task_by_session(state.pool(), &session).await {
        Ok(Some(task)) => task,
        Ok(None) => return,
        Err(e) => {
            error!("task lookup by session {session} failed: {e}");
            return;
        }
    };

    if failed {
        warn!(
            "task {} ({}) for {} failed: {}",
            task.name, task.session, task.sn, detail
        );
        fail_task(state, &task, max_attempts).await;
    } else if let Err(e) = DatabaseQueries::complete_task(state.pool(), task.id, "success").await {
        error!("task {} completion failed: {e}", task.id);
    }
}

/// Apply the on-failure policy to a sent task
async fn fail_task(state: &SharedState, task: &CwmpPresetTask, max_attempts: i32) {
    let result = match task.onfail.as_str() {
        "retry" if task.attempts + 1 < max_attempts => {
            let backoff = Duration::minutes(1i64 << task.attempts.clamp(0, 16));
            DatabaseQueries::requeue_task(state.pool(), task.id, backoff).await
        }
        "ignore" => DatabaseQueries::complete_task(state.pool(), task.id, "ignored")
            .await
            .map(|_| ()),
        _ => DatabaseQueries::complete_task(state.pool(), task.id, "failure")
            .await
            .map(|_| ()),
    };
    if let Err(e) = result {
        error!("task {} failure handling error: {e}", task.id);
    }
}

/// Fire a connection request at the device's management URL without
/// blocking the caller. Username is the SN per the provisioning contract.
pub fn connect_device(state: SharedState, metrics: Arc<Metrics>, sn: String, cwmp_url: String) {
    if cwmp_url.is_empty() {
        info!("no connection request url for {sn}");
        return;
    }
    tokio::spawn(async move {
        let password = state
            .tr069_setting_or(CONFIG_CPE_CONNECTION_REQUEST_PASSWORD, "")
            .await;
        metrics.increment_connection_requests();
        match connection_request(&sn, &password, &cwmp_url).await {
            Ok(true) => info!("connection request to {cwmp_url} accepted"),
            Ok(false) => info!("connection request to {cwmp_url} rejected (not 200)"),
            Err(e) => warn!("connection request to {cwmp_url} failed: {e}"),
        }
    });
}

/// Queue a reboot for the device and wake it up
pub async fn reboot_device(
    state: &SharedState,
    metrics: &Arc<Metrics>,
    entry: &CpeEntry,
    dev: &NetCpe,
    session: &str,
) -> AcsResult<()> {
    entry
        .send_event(
            CwmpEventData {
                session: session.to_string(),
                sn: dev.sn.clone(),
                message: CwmpMessage::Reboot(Reboot {
                    id: session.to_string(),
                    command_key: session.to_string(),
                }),
            },
            5000,
            true,
        )
        .await?;
    connect_device(
        state.clone(),
        Arc::clone(metrics),
        dev.sn.clone(),
        dev.cwmp_url.clone(),
    );
    Ok(())
}

/// Queue a factory reset for the device and wake it up
pub async fn factory_reset_device(
    state: &SharedState,
    metrics: &Arc<Metrics>,
    entry: &CpeEntry,
    dev: &NetCpe,
    session: &str,
) -> AcsResult<()> {
    entry
        .send_event(
            CwmpEventData {
                session: session.to_string(),
                sn: dev.sn.clone(),
                message: CwmpMessage::FactoryReset(FactoryReset {
                    id: session.to_string(),
                }),
            },
            5000,
            true,
        )
        .await?;
    connect_device(
        state.clone(),
        Arc::clone(metrics),
        dev.sn.clone(),
        dev.cwmp_url.clone(),
    );
    Ok(())
}

/// Queue a device-information refresh (DeviceInfo + ManagementServer)
pub async fn request_device_info(
    state: &SharedState,
    metrics: &Arc<Metrics>,
    entry: &CpeEntry,
    dev: &NetCpe,
    session: &str,
) -> AcsResult<()> {
    entry
        .send_event(
            CwmpEventData {
                session: session.to_string(),
                sn: dev.sn.clone(),
                message: CwmpMessage::GetParameterValues(GetParameterValues {
                    id: session.to_string(),
                    parameter_names: vec![
                        "Device.DeviceInfo.".to_string(),
                        "Device.ManagementServer.".to_string(),
                    ],
                }),
            },
            5000,
            true,
        )
        .await?;
    connect_device(
        state.clone(),
        Arc::clone(metrics),
        dev.sn.clone(),
        dev.cwmp_url.clone(),
    );
    Ok(())
}

/// Queue a parameter-name discovery walk rooted at "Device."
pub async fn request_parameter_names(
    state: &SharedState,
    metrics: &Arc<Metrics>,
    entry: &CpeEntry,
    dev: &NetCpe,
    session: &str,
) -> AcsResult<()> {
    entry
        .send_event(
            CwmpEventData {
                session: session.to_string(),
                sn: dev.sn.clone(),
                message: CwmpMessage::GetParameterNames(GetParameterNames {
                    id: session.to_string(),
                    parameter_path: "Device.".to_string(),
                    next_level: true,
                }),
            },
            5000,
            true,
        )
        .await?;
    connect_device(
        state.clone(),
        Arc::clone(metrics),
        dev.sn.clone(),
        dev.cwmp_url.clone(),
    );
    Ok(())
}

/// Queue a GetRPCMethods probe
pub async fn request_rpc_methods(
    state: &SharedState,
    metrics: &Arc<Metrics>,
    entry: &CpeEntry,
    dev: &NetCpe,
    session: &str,
) -> AcsResult<()> {
    entry
        .send_event(
            CwmpEventData {
                session: session.to_string(),
                sn: dev.sn.clone(),
                message: CwmpMessage::GetRPCMethods(GetRPCMethods {
                    id: session.to_string(),
                }),
            },
            5000,
            true,
        )
        .await?;
    connect_device(
        state.clone(),
        Arc::clone(metrics),
        dev.sn.clone(),
        dev.cwmp_url.clone(),
    );
    Ok(())
}

/// Queue a device-log upload to the token-gated upload route
pub async fn upload_device_log(
    state: &SharedState,
    metrics: &Arc<Metrics>,
    entry: &CpeEntry,
    dev: &NetCpe,
    session: &str,
    secret: &str,
) -> AcsResult<()> {
    let token = file_token(session, secret);
    let base = state.tr069_setting_or(CONFIG_TR069_ACCESS_ADDRESS, "").await;
    let filename = format!("{}_{}.log", dev.sn, Local::now().format("%Y%m%d"));
    entry
        .send_event(
            CwmpEventData {
                session: session.to_string(),
                sn: dev.sn.clone(),
                message: CwmpMessage::Upload(Upload {
                    id: session.to_string(),
                    command_key: session.to_string(),
                    file_type: "2 Vendor Log File".to_string(),
                    url: format!("{base}/cwmpupload/{session}/{token}/{filename}"),
                    username: String::new(),
                    password: String::new(),
                    delay_seconds: 5,
                }),
            },
            5000,
            true,
        )
        .await?;
    connect_device(
        state.clone(),
        Arc::clone(metrics),
        dev.sn.clone(),
        dev.cwmp_url.clone(),
    );
    Ok(())
}

/// Queue a configuration backup upload
pub async fn backup_device_config(
    state: &SharedState,
    metrics: &Arc<Metrics>,
    entry: &CpeEntry,
    dev: &NetCpe,
    session: &str,
    secret: &str,
) -> AcsResult<()> {
    let token = file_token(session, secret);
    let base = state.tr069_setting_or(CONFIG_TR069_ACCESS_ADDRESS, "").await;
    let filename = format!("{}_{}.rsc", dev.sn, Local::now().format("%Y%m%d"));
    entry
        .send_event(
            CwmpEventData {
                session: session.to_string(),
                sn: dev.sn.clone(),
                message: CwmpMessage::Upload(Upload {
                    id: session.to_string(),
                    command_key: session.to_string(),
                    file_type: "1 Vendor Configuration File".to_string(),
                    url: format!("{base}/cwmpupload/{session}/{token}/{filename}"),
                    username: String::new(),
                    password: String::new(),
                    delay_seconds: 5,
                }),
            },
            5000,
            true,
        )
        .await?;
    connect_device(
        state.clone(),
        Arc::clone(metrics),
        dev.sn.clone(),
        dev.cwmp_url.clone(),
    );
    Ok(())
}

/// Queue a firmware download served from the workdir firmware route
#[allow(clippy::too_many_arguments)]
pub async fn push_firmware(
    state: &SharedState,
    metrics: &Arc<Metrics>,
    entry: &CpeEntry,
    dev: &NetCpe,
    session: &str,
    filename: &str,
    file_size: u64,
) -> AcsResult<()> {
    let base = state.tr069_setting_or(CONFIG_TR069_ACCESS_ADDRESS, "").await;
    let message = CwmpMessage::Download(Download {
        id: session.to_string(),
        command_key: session.to_string(),
        file_type: "1 Firmware Upgrade Image".to_string(),
        url: format!("{base}/cwmpfiles/download/{filename}"),
        username: String::new(),
        password: String::new(),
        file_size,
        target_file_name: filename.to_string(),
        delay_seconds: 5,
        success_url: String::new(),
        failure_url: String::new(),
    });
    // Firmware pushes are tracked durably; TransferComplete closes the task
    // by command key.
    create_preset_task(
        state,
        &dev.sn,
        "custom",
        "FirmwareUpgrade",
        "abort",
        session,
        &message,
        0,
    )
    .await?;
    entry
        .send_event(
            CwmpEventData {
                session: session.to_string(),
                sn: dev.sn.clone(),
                message,
            },
            5000,
            true,
        )
        .await?;
    connect_device(
        state.clone(),
        Arc::clone(metrics),
        dev.sn.clone(),
        dev.cwmp_url.clone(),
    );
    Ok(())
}

/// One step of a decomposed set-parameter chain
#[derive(Debug, Clone)]
pub struct ChainStep {
    pub name: &'static str,
    pub event: &'static str,
    pub params: HashMap<String, ParamValue>,
}

/// Decompose a WiFi update into single-purpose steps. Devices in the field
/// reject envelopes that mix SSID, channel and radio-enable writes.
pub fn wifi_task_chain(
    ssid_idx: u32,
    ssid: &str,
    password: &str,
    channel: &str,
    enable: &str,
) -> Vec<ChainStep> {
    let prefix = format!("InternetGatewayDevice.LANDevice.1.WLANConfiguration.{ssid_idx}.");
    let mut steps = Vec::new();

    let mut ssid_params = HashMap::new();
    if !ssid.is_empty() {
        ssid_params.insert(format!("{prefix}SSID"), ParamValue::string(ssid));
    }
    if !password.is_empty() {
        ssid_params.insert(format!("{prefix}KeyPassphrase"), ParamValue::string(password));
    }
    if !ssid_params.is_empty() {
        steps.push(ChainStep {
            name: "SetWifiSSID",
            event: "wifi-ssid",
            params: ssid_params,
        });
    }

    if !channel.is_empty() {
        let mut params = HashMap::new();
        params.insert(format!("{prefix}Channel"), ParamValue::unsigned_int(channel));
        params.insert(
            format!("{prefix}AutoChannelEnable"),
            ParamValue::boolean(channel == "0"),
        );
        steps.push(ChainStep {
            name: "SetWifiChannel",
            event: "wifi-channel",
            params,
        });
    }

    if enable == "true" || enable == "false" {
        let mut params = HashMap::new();
        params.insert(format!("{prefix}Enable"), ParamValue::string(enable));
        if enable == "true" {
            params.insert(format!("{prefix}BeaconType"), ParamValue::string("WPAand11i"));
        }
        steps.push(ChainStep {
            name: "SetWifiEnable",
            event: "wifi-enable",
            params,
        });
    }

    steps
}

/// Decompose a WAN update into single-purpose steps
#[allow(clippy::too_many_arguments)]
pub fn wan_task_chain(
    dev_idx: u32,
    conn_idx: u32,
    conn_type: &str,
    username: &str,
    password: &str,
    enable: &str,
    ip_mode: &str,
    vlan_id: &str,
) -> Vec<ChainStep> {
    let conn_path = if conn_type == "PPPoE" {
        format!(
            "InternetGatewayDevice.WANDevice.1.WANConnectionDevice.{dev_idx}.WANPPPConnection.{conn_idx}."
        )
    } else {
        format!(
            "InternetGatewayDevice.WANDevice.1.WANConnectionDevice.{dev_idx}.WANIPConnection.{conn_idx}."
        )
    };
    let dev_path = format!("InternetGatewayDevice.WANDevice.1.WANConnectionDevice.{dev_idx}.");
    let mut steps = Vec::new();

    if conn_type == "PPPoE" && (!username.is_empty() || !password.is_empty()) {
        let mut params = HashMap::new();
        if !username.is_empty() {
            params.insert(format!("{conn_path}Username"), ParamValue::string(username));
        }
        if !password.is_empty() {
            params.insert(format!("{conn_path}Password"), ParamValue::string(password));
        }
        steps.push(ChainStep {
            name: "SetWanAuth",
            event: "wan-auth",
            params,
        });
    }

    if !vlan_id.is_empty() {
        let mut params = HashMap::new();
        params.insert(
            format!("{dev_path}X_CT-COM_WANGponLinkConfig.VLANIDMark"),
            ParamValue::unsigned_int(vlan_id),
        );
        params.insert(
            format!("{conn_path}X_CT-COM_VLANIDMark"),
            ParamValue::unsigned_int(vlan_id),
        );
        steps.push(ChainStep {
            name: "SetWanVLAN",
            event: "wan-vlan",
            params,
        });
    }

    if !ip_mode.is_empty() {
        let mut params = HashMap::new();
        params.insert(
            format!("{conn_path}X_CT-COM_IPMode"),
            ParamValue::unsigned_int(ip_mode),
        );
        steps.push(ChainStep {
            name: "SetWanIPMode",
            event: "wan-ipmode",
            params,
        });
    }

    if enable == "true" || enable == "false" {
        let mut params = HashMap::new();
        params.insert(format!("{conn_path}Enable"), ParamValue::string(enable));
        steps.push(ChainStep {
            name: "SetWanEnable",
            event: "wan-enable",
            params,
        });
    }

    steps
}

/// Execute a decomposed chain: every step is queued high-priority for
/// immediate delivery and persisted as a pending task for tracking, with
/// created_at staggered to keep the drain order.
pub async fn run_task_chain(
    state: &SharedState,
    metrics: &Arc<Metrics>,
    entry: &CpeEntry,
    dev: &NetCpe,
    steps: Vec<ChainStep>,
) -> AcsResult<usize> {
    if steps.is_empty() {
        return Err(crate::error::AcsError::InvalidInput(
            "no params to set".to_string(),
        ));
    }
    let count = steps.len();

    for (order, step) in steps.into_iter().enumerate() {
        let session = new_session(step.name);
        let message = CwmpMessage::SetParameterValues(SetParameterValues {
            id: session.clone(),
            params: step.params,
        });
        if let Err(e) = entry
            .send_event(
                CwmpEventData {
                    session: session.clone(),
                    sn: dev.sn.clone(),
                    message: message.clone(),
                },
                5000,
                true,
            )
            .await
        {
            warn!("queue {} for {} failed: {}", step.name, dev.sn, e);
        }
        create_preset_task(
            state,
            &dev.sn,
            step.event,
            step.name,
            "ignore",
            &session,
            &message,
            order as u32,
        )
        .await?;
    }

    info!("created {} chained task(s) for {}", count, dev.sn);
    connect_device(
        state.clone(),
        Arc::clone(metrics),
        dev.sn.clone(),
        dev.cwmp_url.clone(),
    );
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wifi_chain_decomposition() {
        let steps = wifi_task_chain(1, "home", "secret", "6", "true");
        let names: Vec<_> = steps.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["SetWifiSSID", "SetWifiChannel", "SetWifiEnable"]);

        // SSID and passphrase travel together, channel separately
        assert!(steps[0]
            .params
            .contains_key("InternetGatewayDevice.LANDevice.1.WLANConfiguration.1.SSID"));
        assert!(steps[0]
            .params
            .contains_key("InternetGatewayDevice.LANDevice.1.WLANConfiguration.1.KeyPassphrase"));
        assert!(!steps[0]
            .params
            .contains_key("InternetGatewayDevice.LANDevice.1.WLANConfiguration.1.Channel"));
    }

    #[test]
    fn test_wifi_chain_auto_channel() {
        let steps = wifi_task_chain(2, "", "", "0", "");
        assert_eq!(steps.len(), 1);
        let auto = steps[0]
            .params
            .get("InternetGatewayDevice.LANDevice.1.WLANConfiguration.2.AutoChannelEnable")
            .unwrap();
        assert_eq!(auto.value, "true");
    }

    #[test]
    fn test_wifi_chain_enable_adds_beacon() {
        let steps = wifi_task_chain(1, "", "", "", "true");
        assert_eq!(steps[0].name, "SetWifiEnable");
        assert!(steps[0]
            .params
            .contains_key("InternetGatewayDevice.LANDevice.1.WLANConfiguration.1.BeaconType"));

        let steps = wifi_task_chain(1, "", "", "", "false");
        assert!(!steps[0]
            .params
            .contains_key("InternetGatewayDevice.LANDevice.1.WLANConfiguration.1.BeaconType"));
    }

    #[test]
    fn test_wan_chain_pppoe() {
        let steps = wan_task_chain(1, 2, "PPPoE", "user@isp", "pw", "true", "3", "220");
        let names: Vec<_> = steps.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec!["SetWanAuth", "SetWanVLAN", "SetWanIPMode", "SetWanEnable"]
        );
        // VLAN lands on both the link config and the connection
        assert_eq!(steps[1].params.len(), 2);
        assert!(steps[0].params.keys().all(|k| k.contains("WANPPPConnection.2.")));
    }

    #[test]
    fn test_wan_chain_ipoe_skips_auth() {
        let steps = wan_task_chain(1, 1, "IPoE", "user", "pw", "", "", "");
        assert!(steps.is_empty());
    }

    #[test]
    fn test_rest_envelopes() {
        assert_eq!(rest_success("ok")["code"], 0);
        assert_eq!(rest_error("boom")["code"], 1);
        assert_eq!(rest_error("boom")["msg"], "boom");
    }

    #[test]
    fn test_file_token_is_deterministic_per_day() {
        let a = file_token("sess", "secret");
        let b = file_token("sess", "secret");
        assert_eq!(a, b);
        assert_ne!(a, file_token("sess", "other"));
        assert_eq!(a.len(), 32);
    }
}
