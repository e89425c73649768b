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

//! Shared State Management
//!
//! Thread-safe shared state for the ACS: the database connection pool and a
//! short-lived cache over the TR-069 settings table. The database
//! exclusively owns persistent records; runtime entries live in the device
//! registry.

pub mod db;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use dashmap::DashMap;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::DatabaseConfig;
use crate::store::db::DatabaseQueries;

/// Settings knob names stored in the sys_config table under type "tr069"
pub const CONFIG_TR069_ACCESS_ADDRESS: &str = "TR069AccessAddress";
pub const CONFIG_TR069_ACCESS_PASSWORD: &str = "TR069AccessPassword";
pub const CONFIG_CPE_CONNECTION_REQUEST_PASSWORD: &str = "CpeConnectionRequestPassword";
pub const CONFIG_CPE_AUTO_REGISTER: &str = "CpeAutoRegister";
pub const CONFIG_CPE_PERIODIC_INFORM_INTERVAL: &str = "CpePeriodicInformInterval";
pub const CONFIG_ONT_WEB_ADMIN_USERNAME: &str = "OntWebAdminUsername";
pub const CONFIG_ONT_WEB_ADMIN_PASSWORD: &str = "OntWebAdminPassword";
pub const CONFIG_ONT_WEB_USER_USERNAME: &str = "OntWebUserUsername";
pub const CONFIG_ONT_WEB_USER_PASSWORD: &str = "OntWebUserPassword";

const SETTINGS_CACHE_TTL: Duration = Duration::from_secs(30);

/// Shared state container accessible across all ACS components
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<State>,
}

struct State {
    database: DatabaseLayer,
    settings: DashMap<String, CachedSetting>,
}

struct CachedSetting {
    value: Option<String>,
    fetched_at: Instant,
}

/// Encapsulates the async SQLx connection pool.
pub struct DatabaseLayer {
    pub pool: PgPool,
}

impl DatabaseLayer {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let conn_str = format!(
            "postgres://{}:{}@{}:{}/{}",
            config.user, config.password, config.host, config.port, config.name
        );
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&conn_str)
            .await?;
        Ok(DatabaseLayer { pool })
    }
}

impl SharedState {
    pub async fn build(db_config: &DatabaseConfig) -> Result<Self> {
        let database = DatabaseLayer::connect(db_config).await?;

        Ok(SharedState {
            inner: Arc::new(State {
                database,
                settings: DashMap::new(),
            }),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.inner.database.pool
    }

    /// Read a TR-069 settings knob, caching hits briefly. Settings are read
    /// on every Inform; the short TTL keeps operator edits visible without
    /// a round-trip per message.
    pub async fn tr069_setting(&self, name: &str) -> Option<String> {
        if let Some(entry) = self.inner.settings.get(name) {
            if entry.fetched_at.elapsed() < SETTINGS_CACHE_TTL {
                return entry.value.clone();
            }
        }

        let value = DatabaseQueries::get_setting(self.pool(), "tr069", name)
            .await
            .unwrap_or_default();
        self.inner.settings.insert(
            name.to_string(),
            CachedSetting {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
        );
        value
    }

    /// Settings knob with a fallback default for empty/missing values
    pub async fn tr069_setting_or(&self, name: &str, default: &str) -> String {
        match self.tr069_setting(name).await {
            Some(v) if !v.is_empty() => v,
            _ => default.to_string(),
        }
    }
}
