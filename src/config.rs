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

use serde::Deserialize;
use std::{fs, path::Path};

/// Main application configuration structure
#[derive(Debug, Deserialize)]
pub struct IdrisConfig {
    /// Core ACS engine configuration
    pub core: CoreConfig,
    /// Database connection configuration
    pub database: DatabaseConfig,
    /// TR-069 protocol configuration
    #[serde(default)]
    pub tr069: Tr069Config,
    /// OLT SNMP poller configuration
    #[serde(default)]
    pub snmp: SnmpConfig,
}

/// Core ACS engine configuration
#[derive(Debug, Deserialize)]
pub struct CoreConfig {
    /// CPE-facing CWMP port (typically 7547)
    pub tr069_port: u16,
    /// Optional metrics port for Prometheus exporter
    pub metrics_port: Option<u16>,
    /// Working directory for firmware and uploaded CPE files
    pub workdir: String,
}

/// Database connection configuration
#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    /// Database hostname
    pub host: String,
    /// Database port (typically 5432 for PostgreSQL)
    pub port: u16,
    /// Database username
    pub user: String,
    /// Database password
    pub password: String,
    /// Database name
    pub name: String,
}

/// TR-069 protocol configuration
#[derive(Debug, Deserialize)]
pub struct Tr069Config {
    /// Shared secret used for per-session file download/upload tokens
    pub secret: String,
    /// Log request/response headers for every CWMP exchange
    #[serde(default)]
    pub debug: bool,
    /// Reject Informs whose serial number disagrees with an existing
    /// tr069-session cookie. Off by default: deployed CPE fleets are known
    /// to re-use stale cookies across reboots.
    #[serde(default)]
    pub strict_session: bool,
    /// Maximum delivery attempts for preset tasks with on-failure = retry
    #[serde(default = "default_task_max_attempts")]
    pub task_max_attempts: i32,
}

fn default_task_max_attempts() -> i32 {
    3
}

/// OLT SNMP poller configuration
#[derive(Debug, Deserialize)]
pub struct SnmpConfig {
    /// Polling interval in minutes (default 5)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_minutes: u64,
}

fn default_poll_interval() -> u64 {
    5
}

impl IdrisConfig {
    /// Load configuration from a YAML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Returns
    ///
    /// Returns the parsed configuration, or an error if loading/parsing fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// use idris::config::IdrisConfig;
    /// let config = IdrisConfig::load("config/idris.yaml").unwrap();
    /// ```
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config: IdrisConfig = serde_yaml::from_str(&contents)?;
        if config.core.metrics_port.is_none() {
            config.core.metrics_port = Some(9090);
        }
        if config.snmp.poll_interval_minutes == 0 {
            config.snmp.poll_interval_minutes = default_poll_interval();
        }
        Ok(config)
    }
}

impl Default for IdrisConfig {
    fn default() -> Self {
        IdrisConfig {
            core: CoreConfig::default(),
            database: DatabaseConfig::default(),
            tr069: Tr069Config::default(),
            snmp: SnmpConfig::default(),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            tr069_port: 7547,
            metrics_port: Some(9090),
            workdir: "/var/idris".to_string(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: "password".to_string(),
            name: "idris_db".to_string(),
        }
    }
}

impl Default for Tr069Config {
    fn default() -> Self {
        Tr069Config {
            secret: "idris-tr069".to_string(),
            debug: false,
            strict_session: false,
            task_max_attempts: default_task_max_attempts(),
        }
    }
}

impl Default for SnmpConfig {
    fn default() -> Self {
        SnmpConfig {
            poll_interval_minutes: default_poll_interval(),
        }
    }
}
