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

//! Device Registry
//!
//! One runtime entry per CPE serial number, created lazily on first
//! reference and kept for the process lifetime. The entry buffers outbound
//! work between the admin plane and the CPE-facing plane on two bounded
//! queues: a normal queue and a capacity-1 high-priority queue that encodes
//! the pre-emption contract for operator-initiated commands. Consumers
//! always poll high-priority first.

pub mod inform;
pub mod vendor;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{error, info};
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::cwmp::auth_client::md5_hex;
use crate::cwmp::{CwmpMessage, Inform, ParamValue, SetParameterValues};
use crate::error::{AcsError, AcsResult};
use crate::registry::inform::{detect_device_type, param_group_tag};
use crate::registry::vendor::{web_credential_params, WebCredentials};
use crate::store::db::DatabaseQueries;
use crate::store::{
    SharedState, CONFIG_CPE_AUTO_REGISTER, CONFIG_CPE_CONNECTION_REQUEST_PASSWORD,
    CONFIG_CPE_PERIODIC_INFORM_INTERVAL, CONFIG_ONT_WEB_ADMIN_PASSWORD,
    CONFIG_ONT_WEB_ADMIN_USERNAME, CONFIG_ONT_WEB_USER_PASSWORD, CONFIG_ONT_WEB_USER_USERNAME,
};

const NORMAL_QUEUE_CAPACITY: usize = 512;
const HIGH_PRIORITY_QUEUE_CAPACITY: usize = 1;

/// Seconds between full normalizer runs for a device; within the window
/// only the online-status fields move.
pub const DATA_NOTIFY_THROTTLE_SECS: i64 = 300;

/// One outbound unit of work: moved from the admin plane to the dispatcher,
/// dequeued at most once and emitted as the HTTP response body.
#[derive(Debug, Clone)]
pub struct CwmpEventData {
    pub session: String,
    pub sn: String,
    pub message: CwmpMessage,
}

/// Process-wide SN -> runtime entry table
pub struct CpeRegistry {
    entries: Mutex<HashMap<String, Arc<CpeEntry>>>,
}

impl CpeRegistry {
    pub fn new() -> Self {
        CpeRegistry {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the runtime entry for a serial number, creating it on first
    /// reference. Creation reads the registration flag from persistence.
    pub async fn get(&self, sn: &str, state: &SharedState) -> AcsResult<Arc<CpeEntry>> {
        if sn.trim().is_empty() || sn == "N/A" {
            return Err(AcsError::InvalidInput("serial number is empty".to_string()));
        }

        if let Some(entry) = self.entries.lock().unwrap().get(sn) {
            return Ok(Arc::clone(entry));
        }

        let registered = DatabaseQueries::count_cpe_by_sn(state.pool(), sn)
            .await
            .unwrap_or(0)
            > 0;

        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .entry(sn.to_string())
            .or_insert_with(|| Arc::new(CpeEntry::new(sn, registered)));
        Ok(Arc::clone(entry))
    }

    pub fn size(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Snapshot of currently known serial numbers
    pub fn list_sn(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }

    /// Drop a runtime entry entirely (administrative reset)
    pub fn clear(&self, sn: &str) {
        self.entries.lock().unwrap().remove(sn);
    }

    /// Drop only the cached task-tag list for a device
    pub fn clear_cache(&self, sn: &str) {
        if let Some(entry) = self.entries.lock().unwrap().get(sn) {
            entry.runtime.lock().unwrap().task_tags = None;
        }
    }
}

impl Default for CpeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct CpeRuntime {
    last_inform: Option<Inform>,
    last_update: Option<DateTime<Utc>>,
    last_data_notify: Option<DateTime<Utc>>,
    manufacturer: String,
    oui: String,
    product_class: String,
    software_version: String,
    is_register: bool,
    task_tags: Option<Vec<String>>,
}

struct EventQueue {
    tx: mpsc::Sender<CwmpEventData>,
    rx: tokio::sync::Mutex<mpsc::Receiver<CwmpEventData>>,
}

impl EventQueue {
    fn bounded(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        EventQueue {
            tx,
            rx: tokio::sync::Mutex::new(rx),
        }
    }
}

/// In-memory sibling of the persisted device record, owned by the registry.
/// The dispatcher borrows an entry for the duration of one HTTP request;
/// the queues are the only cross-task channel.
pub struct CpeEntry {
    pub sn: String,
    runtime: Mutex<CpeRuntime>,
    queue: EventQueue,
    hp_queue: EventQueue,
}

impl CpeEntry {
    pub fn new(sn: &str, is_register: bool) -> Self {
        CpeEntry {
            sn: sn.to_string(),
            runtime: Mutex::new(CpeRuntime {
                is_register,
                ..CpeRuntime::default()
            }),
            queue: EventQueue::bounded(NORMAL_QUEUE_CAPACITY),
            hp_queue: EventQueue::bounded(HIGH_PRIORITY_QUEUE_CAPACITY),
        }
    }

    fn select_queue(&self, hp: bool) -> &EventQueue {
        if hp {
            &self.hp_queue
        } else {
            &self.queue
        }
    }

    /// Enqueue an outbound event, waiting at most `timeout_ms` for space
    pub async fn send_event(
        &self,
        data: CwmpEventData,
        timeout_ms: u64,
        hp: bool,
    ) -> AcsResult<()> {
        let queue = self.select_queue(hp);
        match timeout(Duration::from_millis(timeout_ms), queue.tx.send(data)).await {
            Ok(Ok(())) => Ok(()),
            _ => Err(AcsError::QueueFullTimeout),
        }
    }

    /// Dequeue one outbound event, waiting at most `timeout_ms`
    pub async fn recv_event(&self, timeout_ms: u64, hp: bool) -> AcsResult<CwmpEventData> {
        let queue = self.select_queue(hp);
        let mut rx = queue.rx.lock().await;
        match timeout(Duration::from_millis(timeout_ms), rx.recv()).await {
            Ok(Some(data)) => Ok(data),
            _ => Err(AcsError::QueueEmptyTimeout),
        }
    }

    /// Poll both queues in strict priority order with the same budget each.
    /// This is how operator commands pre-empt background work everywhere.
    pub async fn next_queued(&self, timeout_ms: u64) -> Option<CwmpEventData> {
        match self.recv_event(timeout_ms, true).await {
            Ok(data) => Some(data),
            Err(_) => self.recv_event(timeout_ms, false).await.ok(),
        }
    }

    /// Refresh volatile identity fields from a parsed Inform
    pub fn update_status(&self, msg: &Inform) {
        let mut rt = self.runtime.lock().unwrap();
        if !msg.product_class.is_empty() {
            rt.product_class = msg.product_class.clone();
        }
        if !msg.oui.is_empty() {
            rt.oui = msg.oui.clone();
        }
        if !msg.manufacturer.is_empty() {
            rt.manufacturer = msg.manufacturer.clone();
        }
        let sw = msg.software_version();
        if !sw.is_empty() {
            rt.software_version = sw.to_string();
        }
        rt.last_inform = Some(msg.clone());
        rt.last_update = Some(Utc::now());
    }

    pub fn last_inform(&self) -> Option<Inform> {
        self.runtime.lock().unwrap().last_inform.clone()
    }

    pub fn manufacturer(&self) -> String {
        self.runtime.lock().unwrap().manufacturer.clone()
    }

    pub fn is_register(&self) -> bool {
        self.runtime.lock().unwrap().is_register
    }

    /// Decide whether this Inform warrants a full normalizer pass. True at
    /// most once per throttle window unless forced; deciding also advances
    /// the throttle clock.
    pub fn should_full_notify(&self, force: bool) -> bool {
        let mut rt = self.runtime.lock().unwrap();
        let due = match rt.last_data_notify {
            Some(last) => (Utc::now() - last).num_seconds() > DATA_NOTIFY_THROTTLE_SECS,
            None => true,
        };
        if force || due {
            rt.last_data_notify = Some(Utc::now());
            true
        } else {
            false
        }
    }

    /// Cached task-tag list, loaded from the device record on first use
    pub async fn task_tags(&self, state: &SharedState) -> Vec<String> {
        if let Some(tags) = &self.runtime.lock().unwrap().task_tags {
            return tags.clone();
        }
        let raw = DatabaseQueries::get_cpe_task_tags(state.pool(), &self.sn)
            .await
            .unwrap_or_default();
        let tags: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        if !tags.is_empty() {
            self.runtime.lock().unwrap().task_tags = Some(tags.clone());
        }
        tags
    }

    /// Create the device record on first contact when auto-registration is
    /// enabled. The detected device type sticks; later optical telemetry may
    /// still flip a router to an ONT.
    pub async fn check_register(&self, ip: &str, msg: &Inform, state: &SharedState) {
        if state
            .tr069_setting(CONFIG_CPE_AUTO_REGISTER)
            .await
            .as_deref()
            != Some("enabled")
        {
            return;
        }
        if self.is_register() {
            return;
        }

        let device_type = detect_device_type(&msg.manufacturer, &msg.product_class);
        match DatabaseQueries::create_cpe(
            state.pool(),
            &msg.sn,
            &msg.manufacturer,
            &msg.oui,
            &msg.product_class,
            device_type,
            msg.connection_request_url(),
            &format!("first register from {ip}"),
        )
        .await
        {
            Ok(()) => {
                info!("auto registered new device {} (type: {})", msg.sn, device_type);
                self.runtime.lock().unwrap().is_register = true;
            }
            Err(e) => error!("auto register {} failed: {}", msg.sn, e),
        }
    }

    /// Build the SetParameterValues that provisions connection-request
    /// credentials and periodic inform on the device, using whichever data
    /// model the device last spoke.
    pub async fn management_auth_message(
        &self,
        session: &str,
        state: &SharedState,
    ) -> CwmpMessage {
        let prefix = self
            .last_inform()
            .map(|i| i.management_server_prefix())
            .unwrap_or("Device.ManagementServer.");

        let password = state
            .tr069_setting_or(CONFIG_CPE_CONNECTION_REQUEST_PASSWORD, "")
            .await;
        let interval = state
            .tr069_setting_or(CONFIG_CPE_PERIODIC_INFORM_INTERVAL, "60")
            .await;

        let mut params = HashMap::new();
        params.insert(
            format!("{prefix}ConnectionRequestUsername"),
            ParamValue::string(&self.sn),
        );
        params.insert(
            format!("{prefix}ConnectionRequestPassword"),
            ParamValue::string(&password),
        );
        params.insert(
            format!("{prefix}PeriodicInformEnable"),
            ParamValue::boolean(true),
        );
        params.insert(
            format!("{prefix}PeriodicInformInterval"),
            ParamValue::unsigned_int(interval),
        );

        CwmpMessage::SetParameterValues(SetParameterValues {
            id: session.to_string(),
            params,
        })
    }

    /// Queue the management-auth provisioning push
    pub async fn update_management_auth(
        &self,
        session: &str,
        state: &SharedState,
        timeout_ms: u64,
        hp: bool,
    ) -> AcsResult<()> {
        let message = self.management_auth_message(session, state).await;
        self.send_event(
            CwmpEventData {
                session: session.to_string(),
                sn: self.sn.clone(),
                message,
            },
            timeout_ms,
            hp,
        )
        .await
    }

    /// Queue a periodic-inform (re)provisioning push
    pub async fn push_periodic_inform(
        &self,
        session: &str,
        state: &SharedState,
        timeout_ms: u64,
        hp: bool,
    ) -> AcsResult<()> {
        let prefix = self
            .last_inform()
            .map(|i| i.management_server_prefix())
            .unwrap_or("Device.ManagementServer.");
        let interval = state
            .tr069_setting_or(CONFIG_CPE_PERIODIC_INFORM_INTERVAL, "60")
            .await;

        let mut params = HashMap::new();
        params.insert(
            format!("{prefix}PeriodicInformEnable"),
            ParamValue::boolean(true),
        );
        params.insert(
            format!("{prefix}PeriodicInformInterval"),
            ParamValue::unsigned_int(interval),
        );

        self.send_set_params(session, params, timeout_ms, hp).await
    }

    /// Queue the ONT web-credential push. Vendors without a working path
    /// set are skipped silently; that is not an error surface.
    pub async fn push_web_credentials(
        &self,
        session: &str,
        state: &SharedState,
        timeout_ms: u64,
        hp: bool,
    ) -> AcsResult<()> {
        let creds = WebCredentials {
            admin_username: state
                .tr069_setting_or(CONFIG_ONT_WEB_ADMIN_USERNAME, "")
                .await,
            admin_password: state
                .tr069_setting_or(CONFIG_ONT_WEB_ADMIN_PASSWORD, "")
                .await,
            user_username: state
                .tr069_setting_or(CONFIG_ONT_WEB_USER_USERNAME, "")
                .await,
            user_password: state
                .tr069_setting_or(CONFIG_ONT_WEB_USER_PASSWORD, "")
                .await,
        };
        if creds.is_empty() {
            return Ok(());
        }

        let params = web_credential_params(&self.manufacturer(), &creds);
        if params.is_empty() {
            return Ok(());
        }

        self.send_set_params(session, params, timeout_ms, hp).await
    }

    async fn send_set_params(
        &self,
        session: &str,
        params: HashMap<String, ParamValue>,
        timeout_ms: u64,
        hp: bool,
    ) -> AcsResult<()> {
        self.send_event(
            CwmpEventData {
                session: session.to_string(),
                sn: self.sn.clone(),
                message: CwmpMessage::SetParameterValues(SetParameterValues {
                    id: session.to_string(),
                    params,
                }),
            },
            timeout_ms,
            hp,
        )
        .await
    }

    /// Record which parameters the device reports writable; only invoked
    /// for bootstrap-session discovery responses.
    pub async fn process_parameter_names_response(
        &self,
        state: &SharedState,
        msg: &crate::cwmp::GetParameterNamesResponse,
    ) {
        for param in &msg.params {
            if param.writable.is_empty() {
                continue;
            }
            if let Err(e) = DatabaseQueries::set_cpe_param_writable(
                state.pool(),
                &self.sn,
                &param.name,
                &param.writable,
            )
            .await
            {
                error!("set writable flag for {} {}: {}", self.sn, param.name, e);
            }
        }
    }

    /// Full-normalizer inform path: merge telemetry into the device record
    pub async fn on_inform_update(&self, state: &SharedState) {
        let Some(msg) = self.last_inform() else {
            return;
        };
        let telemetry = inform::telemetry_from_inform(&msg);
        if let Err(e) =
            DatabaseQueries::update_cpe_telemetry(state.pool(), &self.sn, &telemetry).await
        {
            error!("inform update for {} failed: {}", self.sn, e);
        }
    }

    /// Throttled inform path: only online status and last-inform move
    pub async fn on_inform_update_online(&self, state: &SharedState) {
        if let Err(e) = DatabaseQueries::set_cpe_online(state.pool(), &self.sn).await {
            error!("inform online update for {} failed: {}", self.sn, e);
        }
    }

    /// GetParameterValuesResponse path: run the full normalizer over the
    /// returned snapshot and upsert every parameter row.
    pub async fn on_params_update(&self, state: &SharedState, values: &HashMap<String, String>) {
        let telemetry = inform::telemetry_from_params(&self.manufacturer(), values);
        if let Err(e) =
            DatabaseQueries::update_cpe_telemetry(state.pool(), &self.sn, &telemetry).await
        {
            error!("params update for {} failed: {}", self.sn, e);
        }
        update_cpe_rundata(state, &self.sn, values).await;
    }
}

/// Upsert one parameter row per returned path. Identity is md5(sn || path)
/// so repeated snapshots converge on one row per parameter.
pub async fn update_cpe_rundata(
    state: &SharedState,
    sn: &str,
    values: &HashMap<String, String>,
) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut stored = 0usize;
    for (name, value) in values {
        let id = md5_hex(&format!("{sn}{name}"));
        if !seen.insert(id.clone()) {
            continue;
        }
        let tag = param_group_tag(name);
        if let Err(e) =
            DatabaseQueries::upsert_cpe_param(state.pool(), &id, sn, tag, name, value).await
        {
            error!("param upsert for {sn} failed: {e}");
            return;
        }
        stored += 1;
    }
    info!("stored {stored} parameter rows for {sn}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> CpeEntry {
        CpeEntry::new("ABC123", false)
    }

    fn event(session: &str) -> CwmpEventData {
        CwmpEventData {
            session: session.to_string(),
            sn: "ABC123".to_string(),
            message: CwmpMessage::Reboot(crate::cwmp::Reboot {
                id: session.to_string(),
                command_key: session.to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_queue_round_trip() {
        let cpe = entry();
        cpe.send_event(event("s1"), 100, false).await.unwrap();
        let got = cpe.recv_event(100, false).await.unwrap();
        assert_eq!(got.session, "s1");
    }

    #[tokio::test]
    async fn test_high_priority_queue_saturation() {
        let cpe = entry();
        cpe.send_event(event("hp1"), 50, true).await.unwrap();
        // capacity 1: the second send must time out without corrupting state
        let err = cpe.send_event(event("hp2"), 50, true).await.unwrap_err();
        assert!(matches!(err, AcsError::QueueFullTimeout));

        // the ordinary queue remains usable
        cpe.send_event(event("n1"), 50, false).await.unwrap();
        assert_eq!(cpe.recv_event(50, true).await.unwrap().session, "hp1");
        assert_eq!(cpe.recv_event(50, false).await.unwrap().session, "n1");
    }

    #[tokio::test]
    async fn test_high_priority_preempts_normal() {
        let cpe = entry();
        cpe.send_event(event("normal"), 50, false).await.unwrap();
        cpe.send_event(event("urgent"), 50, true).await.unwrap();

        let first = cpe.next_queued(50).await.unwrap();
        assert_eq!(first.session, "urgent");
        let second = cpe.next_queued(50).await.unwrap();
        assert_eq!(second.session, "normal");
    }

    #[tokio::test]
    async fn test_recv_empty_times_out() {
        let cpe = entry();
        let err = cpe.recv_event(20, false).await.unwrap_err();
        assert!(matches!(err, AcsError::QueueEmptyTimeout));
    }

    #[tokio::test]
    async fn test_normal_queue_is_fifo() {
        let cpe = entry();
        for i in 0..5 {
            cpe.send_event(event(&format!("s{i}")), 50, false).await.unwrap();
        }
        for i in 0..5 {
            assert_eq!(
                cpe.recv_event(50, false).await.unwrap().session,
                format!("s{i}")
            );
        }
    }

    #[test]
    fn test_update_status_keeps_nonempty_identity() {
        let cpe = entry();
        cpe.update_status(&Inform {
            sn: "ABC123".to_string(),
            manufacturer: "ZTE".to_string(),
            product_class: "F680".to_string(),
            ..Inform::default()
        });
        // a later Inform with empty identity fields must not erase them
        cpe.update_status(&Inform {
            sn: "ABC123".to_string(),
            ..Inform::default()
        });
        assert_eq!(cpe.manufacturer(), "ZTE");
    }

    #[test]
    fn test_throttle_window() {
        let cpe = entry();
        assert!(cpe.should_full_notify(false));
        // second decision inside the window is throttled
        assert!(!cpe.should_full_notify(false));
        // VALUE CHANGE forces a full pass regardless
        assert!(cpe.should_full_notify(true));
    }
}
