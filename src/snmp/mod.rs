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

//! OLT SNMP Poller
//!
//! Periodic background task that enriches CPE records with optical-line-
//! terminal topology. Every enabled OLT gets a reachability probe and an
//! ONU table walk; results upsert by (OLT id, serial number). Poll errors
//! are logged and the poller continues on the next tick.

pub mod zte;

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::time::sleep;

use crate::metrics::Metrics;
use crate::snmp::zte::ZteDriver;
use crate::store::db::{DatabaseQueries, OltDevice, OltOnuData};
use crate::store::SharedState;

/// Delay before the first poll after process start
const INITIAL_POLL_DELAY: Duration = Duration::from_secs(10);

/// Background SNMP poller over all registered OLTs
pub struct OltPoller {
    interval: Duration,
    state: SharedState,
    metrics: Arc<Metrics>,
}

impl OltPoller {
    pub fn new(interval_minutes: u64, state: SharedState, metrics: Arc<Metrics>) -> Self {
        let minutes = if interval_minutes == 0 { 5 } else { interval_minutes };
        OltPoller {
            interval: Duration::from_secs(minutes * 60),
            state,
            metrics,
        }
    }

    /// Run until the process exits
    pub async fn run(self) {
        info!("OLT poller started (interval: {:?})", self.interval);
        sleep(INITIAL_POLL_DELAY).await;
        loop {
            self.poll_all().await;
            sleep(self.interval).await;
        }
    }

    async fn poll_all(&self) {
        self.metrics.increment_snmp_polls();
        let olts = match DatabaseQueries::list_enabled_olts(self.state.pool()).await {
            Ok(olts) => olts,
            Err(e) => {
                error!("failed to fetch OLT list: {e}");
                return;
            }
        };
        info!("polling {} OLT(s)", olts.len());

        for olt in olts {
            let state = self.state.clone();
            tokio::spawn(async move {
                poll_olt(state, olt).await;
            });
        }
    }
}

async fn poll_olt(state: SharedState, olt: OltDevice) {
    let driver = ZteDriver::new(
        &olt.ip_address,
        olt.snmp_port as u16,
        &olt.snmp_community,
        &olt.model,
    );

    let probe = {
        let driver = driver.clone();
        tokio::task::spawn_blocking(move || driver.test_connection()).await
    };
    let info = match probe {
        Ok(Ok(info)) => info,
        Ok(Err(e)) => {
            warn!("{} ({}) offline: {}", olt.name, olt.ip_address, e);
            if let Err(e) = DatabaseQueries::mark_olt_offline(state.pool(), olt.id).await {
                error!("mark OLT {} offline failed: {e}", olt.id);
            }
            return;
        }
        Err(e) => {
            error!("OLT probe task for {} panicked: {e}", olt.name);
            return;
        }
    };

    if let Err(e) = DatabaseQueries::update_olt_sysinfo(
        state.pool(),
        olt.id,
        &info.sys_name,
        &info.sys_descr,
        &info.uptime,
    )
    .await
    {
        error!("OLT {} sysinfo update failed: {e}", olt.id);
    }

    let walk = {
        let driver = driver.clone();
        tokio::task::spawn_blocking(move || driver.poll_onus()).await
    };
    let onus = match walk {
        Ok(Ok(onus)) => onus,
        Ok(Err(e)) => {
            warn!("{} ONU poll failed: {}", olt.name, e);
            return;
        }
        Err(e) => {
            error!("ONU poll task for {} panicked: {e}", olt.name);
            return;
        }
    };
    info!("{}: {} ONUs polled", olt.name, onus.len());

    for onu in onus {
        let row = OltOnuData {
            id: 0,
            olt_id: olt.id,
            serial_number: onu.serial_number,
            pon_port: onu.pon_port,
            onu_id: onu.onu_id,
            onu_name: onu.name,
            onu_type: onu.onu_type,
            phase_state: onu.phase_state,
            rx_power: onu.rx_power,
            online_time: onu.online_time,
            offline_time: onu.offline_time,
            if_index: onu.if_index,
        };
        if let Err(e) = DatabaseQueries::upsert_onu(state.pool(), &row).await {
            error!("ONU upsert for {} failed: {e}", row.serial_number);
        }
    }
}
