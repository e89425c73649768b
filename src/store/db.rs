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

//! Database Query Layer
//!
//! Type-safe queries for the device inventory, parameter snapshots, preset
//! tasks, configuration sessions, settings, and OLT/ONU topology. Conflicts
//! resolve by last-writer-wins on parameter records and by monotonic status
//! on preset tasks; no distributed locking is used.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, PgPool};

/// Device record, keyed by globally unique serial number
#[derive(Debug, Clone, FromRow)]
pub struct NetCpe {
    pub id: i64,
    pub sn: String,
    pub name: String,
    pub system_name: String,
    pub arch_name: String,
    pub software_version: String,
    pub hardware_version: String,
    pub model: String,
    pub oui: String,
    pub manufacturer: String,
    pub product_class: String,
    /// Administrative status: enabled | disabled
    pub status: String,
    /// router | ont | gateway
    pub device_type: String,
    pub task_tags: String,
    pub uptime: i64,
    pub memory_total: i64,
    pub memory_free: i64,
    pub cpu_usage: i64,
    pub cwmp_status: String,
    pub cwmp_url: String,
    /// PON serial number (hex form)
    pub pon_sn_hex: String,
    /// Optical RX power (dBm)
    pub fiber_rx_power: String,
    /// Optical TX power (dBm)
    pub fiber_tx_power: String,
    pub olt_uplink: String,
    /// WiFi SSIDs (JSON)
    pub wifi_ssid: String,
    /// WAN connections (JSON)
    pub wan_info: String,
    /// Connected LAN/WiFi devices (JSON)
    pub lan_clients: String,
    pub cwmp_last_inform: Option<DateTime<Utc>>,
    pub remark: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One normalized CPE parameter row; identity = md5(sn || name)
#[derive(Debug, Clone, FromRow)]
pub struct NetCpeParam {
    pub id: String,
    pub sn: String,
    pub tag: String,
    pub name: String,
    pub value: String,
    pub writable: String,
    pub updated_at: DateTime<Utc>,
}

/// Durable unit of CWMP work for a specific CPE
#[derive(Debug, Clone, FromRow)]
pub struct CwmpPresetTask {
    pub id: i64,
    pub preset_id: i64,
    pub sn: String,
    /// Session id, doubles as the envelope ID of the rendered RPC
    pub session: String,
    /// bootstrap | boot | periodic | scheduled | custom event tags
    pub event: String,
    pub name: String,
    /// ignore | retry | abort
    pub onfail: String,
    /// Rendered RPC envelope to send verbatim
    pub request: String,
    /// Optional file payload served by the preset file route
    pub content: String,
    /// pending | sent | success | failure | ignored | scheduled
    pub status: String,
    pub attempts: i32,
    pub exec_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Vendor config push session backing the token-gated file route
#[derive(Debug, Clone, FromRow)]
pub struct CwmpConfigSession {
    pub id: i64,
    pub sn: String,
    pub session: String,
    pub name: String,
    pub content: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One settings row; TR-069 knobs live under type = "tr069"
#[derive(Debug, Clone, FromRow)]
pub struct SysConfig {
    pub id: i64,
    #[sqlx(rename = "type")]
    pub config_type: String,
    pub name: String,
    pub value: String,
    pub sort: i32,
}

/// OLT device registered for SNMP polling
#[derive(Debug, Clone, FromRow)]
pub struct OltDevice {
    pub id: i64,
    pub name: String,
    pub ip_address: String,
    pub snmp_port: i32,
    pub snmp_community: String,
    pub manufacturer: String,
    /// C620, C320, C300, ZXAN ...
    pub model: String,
    pub status: String,
    pub sys_name: String,
    pub sys_descr: String,
    pub sys_uptime: String,
    pub last_poll_at: Option<DateTime<Utc>>,
}

/// ONU topology row polled from an OLT; unique on (olt_id, serial_number)
#[derive(Debug, Clone, FromRow)]
pub struct OltOnuData {
    pub id: i64,
    pub olt_id: i64,
    pub serial_number: String,
    pub pon_port: String,
    pub onu_id: i32,
    pub onu_name: String,
    pub onu_type: String,
    pub phase_state: String,
    pub rx_power: f64,
    pub online_time: String,
    pub offline_time: String,
    pub if_index: i32,
}

/// Telemetry fields extracted from an Inform or a parameter snapshot.
/// `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default)]
pub struct CpeTelemetry {
    pub manufacturer: Option<String>,
    pub product_class: Option<String>,
    pub oui: Option<String>,
    pub cwmp_url: Option<String>,
    pub software_version: Option<String>,
    pub hardware_version: Option<String>,
    pub model: Option<String>,
    pub system_name: Option<String>,
    pub arch_name: Option<String>,
    pub uptime: Option<i64>,
    pub cpu_usage: Option<i64>,
    pub memory_total: Option<i64>,
    pub memory_free: Option<i64>,
    pub fiber_rx_power: Option<String>,
    pub fiber_tx_power: Option<String>,
    pub pon_sn_hex: Option<String>,
    pub olt_uplink: Option<String>,
    pub device_type: Option<String>,
    pub wifi_ssid: Option<String>,
    pub wan_info: Option<String>,
    pub lan_clients: Option<String>,
}

/// Random non-negative identifier for new rows
pub fn next_id() -> i64 {
    (rand::random::<u64>() >> 1) as i64
}

/// Database query helper functions
pub struct DatabaseQueries;

impl DatabaseQueries {
    pub async fn get_cpe_by_sn(pool: &PgPool, sn: &str) -> Result<Option<NetCpe>> {
        let cpe = sqlx::query_as::<_, NetCpe>("SELECT * FROM net_cpe WHERE sn = $1")
            .bind(sn)
            .fetch_optional(pool)
            .await?;
        Ok(cpe)
    }

    pub async fn count_cpe_by_sn(pool: &PgPool, sn: &str) -> Result<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM net_cpe WHERE sn = $1")
                .bind(sn)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }

    /// Insert a freshly auto-registered device; a concurrent insert for the
    /// same SN wins silently (the unique index arbitrates).
    #[allow(clippy::too_many_arguments)]
    pub async fn create_cpe(
        pool: &PgPool,
        sn: &str,
        manufacturer: &str,
        oui: &str,
        product_class: &str,
        device_type: &str,
        cwmp_url: &str,
        remark: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO net_cpe
               (id, sn, name, model, oui, manufacturer, product_class, device_type,
                status, remark, cwmp_url, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, '', $9, $10, $11, $11)
             ON CONFLICT (sn) DO NOTHING",
        )
        .bind(next_id())
        .bind(sn)
        .bind(format!("Device-{sn}"))
        .bind(product_class)
        .bind(oui)
        .bind(manufacturer)
        .bind(product_class)
        .bind(device_type)
        .bind(remark)
        .bind(cwmp_url)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Merge extracted telemetry into the device row; absent fields keep
    /// their stored value. Also stamps cwmp_status = online.
    pub async fn update_cpe_telemetry(pool: &PgPool, sn: &str, t: &CpeTelemetry) -> Result<()> {
        sqlx::query(
            "UPDATE net_cpe SET
               cwmp_status = 'online',
               cwmp_last_inform = $2,
               updated_at = $2,
               manufacturer = COALESCE($3, manufacturer),
               product_class = COALESCE($4, product_class),
               oui = COALESCE($5, oui),
               cwmp_url = COALESCE($6, cwmp_url),
               software_version = COALESCE($7, software_version),
               hardware_version = COALESCE($8, hardware_version),
               model = COALESCE($9, model),
               system_name = COALESCE($10, system_name),
               arch_name = COALESCE($11, arch_name),
               uptime = COALESCE($12, uptime),
               cpu_usage = COALESCE($13, cpu_usage),
               memory_total = COALESCE($14, memory_total),
               memory_free = COALESCE($15, memory_free),
               fiber_rx_power = COALESCE($16, fiber_rx_power),
               fiber_tx_power = COALESCE($17, fiber_tx_power),
               pon_sn_hex = COALESCE($18, pon_sn_hex),
               olt_uplink = COALESCE($19, olt_uplink),
               device_type = COALESCE($20, device_type),
               wifi_ssid = COALESCE($21, wifi_ssid),
               wan_info = COALESCE($22, wan_info),
               lan_clients = COALESCE($23, lan_clients)
             WHERE sn = $1",
        )
        .bind(sn)
        .bind(Utc::now())
        .bind(&t.manufacturer)
        .bind(&t.product_class)
        .bind(&t.oui)
        .bind(&t.cwmp_url)
        .bind(&t.software_version)
        .bind(&t.hardware_version)
        .bind(&t.model)
        .bind(&t.system_name)
        .bind(&t.arch_name)
        .bind(t.uptime)
        .bind(t.cpu_usage)
        .bind(t.memory_total)
        .bind(t.memory_free)
        .bind(&t.fiber_rx_power)
        .bind(&t.fiber_tx_power)
        .bind(&t.pon_sn_hex)
        .bind(&t.olt_uplink)
        .bind(&t.device_type)
        .bind(&t.wifi_ssid)
        .bind(&t.wan_info)
        .bind(&t.lan_clients)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Throttled inform path: only online status and last-inform move
    pub async fn set_cpe_online(pool: &PgPool, sn: &str) -> Result<()> {
        sqlx::query(
            "UPDATE net_cpe SET cwmp_status = 'online', cwmp_last_inform = $2 WHERE sn = $1",
        )
        .bind(sn)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn get_cpe_task_tags(pool: &PgPool, sn: &str) -> Result<String> {
        let tags: Option<(String,)> =
            sqlx::query_as("SELECT task_tags FROM net_cpe WHERE sn = $1")
                .bind(sn)
                .fetch_optional(pool)
                .await?;
        Ok(tags.map(|(t,)| t).unwrap_or_default())
    }

    pub async fn upsert_cpe_param(
        pool: &PgPool,
        id: &str,
        sn: &str,
        tag: &str,
        name: &str,
        value: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO net_cpe_param (id, sn, tag, name, value, writable, updated_at)
             VALUES ($1, $2, $3, $4, $5, '', $6)
             ON CONFLICT (id) DO UPDATE
               SET value = EXCLUDED.value, tag = EXCLUDED.tag, updated_at = EXCLUDED.updated_at",
        )
        .bind(id)
        .bind(sn)
        .bind(tag)
        .bind(name)
        .bind(value)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn set_cpe_param_writable(
        pool: &PgPool,
        sn: &str,
        name: &str,
        writable: &str,
    ) -> Result<()> {
        sqlx::query("UPDATE net_cpe_param SET writable = $3 WHERE sn = $1 AND name = $2")
            .bind(sn)
            .bind(name)
            .bind(writable)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn get_setting(pool: &PgPool, config_type: &str, name: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM sys_config WHERE type = $1 AND name = $2")
                .bind(config_type)
                .bind(name)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|(v,)| v))
    }

    pub async fn insert_preset_task(pool: &PgPool, task: &CwmpPresetTask) -> Result<()> {
        sqlx::query(
            "INSERT INTO cwmp_preset_task
               (id, preset_id, sn, session, event, name, onfail, request, content,
                status, attempts, exec_time, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(task.id)
        .bind(task.preset_id)
        .bind(&task.sn)
        .bind(&task.session)
        .bind(&task.event)
        .bind(&task.name)
        .bind(&task.onfail)
        .bind(&task.request)
        .bind(&task.content)
        .bind(&task.status)
        .bind(task.attempts)
        .bind(task.exec_time)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Atomically claim the oldest eligible pending task for a device and
    /// mark it sent. Order is created_at ascending, id as tiebreak; at most
    /// one task is returned per call.
    pub async fn take_next_pending_task(
        pool: &PgPool,
        sn: &str,
    ) -> Result<Option<CwmpPresetTask>> {
        let task = sqlx::query_as::<_, CwmpPresetTask>(
            "UPDATE cwmp_preset_task SET status = 'sent', updated_at = $2
             WHERE id = (SELECT id FROM cwmp_preset_task
                          WHERE sn = $1 AND status = 'pending' AND exec_time <= $2
                          ORDER BY created_at ASC, id ASC
                          LIMIT 1)
             RETURNING *",
        )
        .bind(sn)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?;
        Ok(task)
    }

    pub async fn get_task_by_session(
        pool: &PgPool,
        session: &str,
    ) -> Result<Option<CwmpPresetTask>> {
        let task = sqlx::query_as::<_, CwmpPresetTask>(
            "SELECT * FROM cwmp_preset_task WHERE session = $1",
        )
        .bind(session)
        .fetch_optional(pool)
        .await?;
        Ok(task)
    }

    /// Close a sent task. Terminal statuses are never reopened, so the
    /// predicate keeps the transition monotonic even under racing updates.
    pub async fn complete_task(pool: &PgPool, id: i64, status: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE cwmp_preset_task SET status = $2, updated_at = $3
             WHERE id = $1 AND status IN ('pending', 'sent')",
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Re-queue a failed task for another attempt with a backoff delay
    pub async fn requeue_task(pool: &PgPool, id: i64, backoff: Duration) -> Result<()> {
        sqlx::query(
            "UPDATE cwmp_preset_task
             SET status = 'pending', attempts = attempts + 1, exec_time = $2, updated_at = $3
             WHERE id = $1 AND status = 'sent'",
        )
        .bind(id)
        .bind(Utc::now() + backoff)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Flip parked scheduled-event tasks to pending for a device. When a
    /// command key is given only the matching task wakes up.
    pub async fn activate_sched_tasks(
        pool: &PgPool,
        sn: &str,
        command_key: Option<&str>,
    ) -> Result<u64> {
        let result = match command_key {
            Some(key) => {
                sqlx::query(
                    "UPDATE cwmp_preset_task SET status = 'pending', updated_at = $3
                     WHERE sn = $1 AND event = 'scheduled' AND status = 'scheduled' AND session = $2",
                )
                .bind(sn)
                .bind(key)
                .bind(Utc::now())
                .execute(pool)
                .await?
            }
            None => {
                sqlx::query(
                    "UPDATE cwmp_preset_task SET status = 'pending', updated_at = $2
                     WHERE sn = $1 AND event = 'scheduled' AND status = 'scheduled'",
                )
                .bind(sn)
                .bind(Utc::now())
                .execute(pool)
                .await?
            }
        };
        Ok(result.rows_affected())
    }

    pub async fn get_config_session(
        pool: &PgPool,
        session: &str,
    ) -> Result<Option<CwmpConfigSession>> {
        let row = sqlx::query_as::<_, CwmpConfigSession>(
            "SELECT * FROM cwmp_config_session WHERE session = $1",
        )
        .bind(session)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    pub async fn update_config_session_status(
        pool: &PgPool,
        session: &str,
        status: &str,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE cwmp_config_session SET status = $2, updated_at = $3 WHERE session = $1",
        )
        .bind(session)
        .bind(status)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn list_enabled_olts(pool: &PgPool) -> Result<Vec<OltDevice>> {
        let olts = sqlx::query_as::<_, OltDevice>(
            "SELECT * FROM olt_device WHERE status != 'disabled'",
        )
        .fetch_all(pool)
        .await?;
        Ok(olts)
    }

    pub async fn mark_olt_offline(pool: &PgPool, id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE olt_device SET status = 'offline', last_poll_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update_olt_sysinfo(
        pool: &PgPool,
        id: i64,
        sys_name: &str,
        sys_descr: &str,
        sys_uptime: &str,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE olt_device
             SET status = 'online', sys_name = $2, sys_descr = $3, sys_uptime = $4,
                 last_poll_at = $5
             WHERE id = $1",
        )
        .bind(id)
        .bind(sys_name)
        .bind(sys_descr)
        .bind(sys_uptime)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Upsert one polled ONU row by (olt_id, serial_number)
    pub async fn upsert_onu(pool: &PgPool, onu: &OltOnuData) -> Result<()> {
        sqlx::query(
            "INSERT INTO olt_onu_data
               (id, olt_id, serial_number, pon_port, onu_id, onu_name, onu_type,
                phase_state, rx_power, online_time, offline_time, if_index,
                created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
             ON CONFLICT (olt_id, serial_number) DO UPDATE SET
               pon_port = EXCLUDED.pon_port,
               onu_id = EXCLUDED.onu_id,
               onu_name = EXCLUDED.onu_name,
               onu_type = EXCLUDED.onu_type,
               phase_state = EXCLUDED.phase_state,
               rx_power = EXCLUDED.rx_power,
               online_time = EXCLUDED.online_time,
               offline_time = EXCLUDED.offline_time,
               if_index = EXCLUDED.if_index,
               updated_at = EXCLUDED.updated_at",
        )
        .bind(next_id())
        .bind(onu.olt_id)
        .bind(&onu.serial_number)
        .bind(&onu.pon_port)
        .bind(onu.onu_id)
        .bind(&onu.onu_name)
        .bind(&onu.onu_type)
        .bind(&onu.phase_state)
        .bind(onu.rx_power)
        .bind(&onu.online_time)
        .bind(&onu.offline_time)
        .bind(onu.if_index)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }
}
