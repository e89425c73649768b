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

use idris::config::IdrisConfig;

#[test]
fn test_config_loading() {
    let config = IdrisConfig::load("config/idris.yaml").unwrap();
    assert_eq!(config.core.tr069_port, 7547);
    assert_eq!(config.core.metrics_port, Some(9090));
    assert_eq!(config.snmp.poll_interval_minutes, 5);
    assert_eq!(config.tr069.task_max_attempts, 3);
    assert!(!config.tr069.strict_session);
}

#[test]
fn test_config_defaults() {
    let config = IdrisConfig::default();
    assert_eq!(config.core.tr069_port, 7547);
    assert_eq!(config.database.port, 5432);
    assert_eq!(config.snmp.poll_interval_minutes, 5);
}

#[test]
fn test_minimal_config_fills_optional_sections() {
    let yaml = r#"
core:
  tr069_port: 7547
  workdir: "/tmp/idris"
database:
  host: "db"
  port: 5432
  user: "acs"
  password: "pw"
  name: "acs"
"#;
    let config: IdrisConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.tr069.task_max_attempts, 3);
    assert!(!config.tr069.strict_session);
    assert_eq!(config.snmp.poll_interval_minutes, 5);
}
