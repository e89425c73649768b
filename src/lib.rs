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

//! Idris ACS
//!
//! A TR-069/CWMP Auto-Configuration Server: the CWMP session dispatcher
//! correlates short CPE HTTP sessions with pending administrative commands,
//! the per-device registry buffers operations between the admin plane and
//! the CPE-facing plane, and the parameter normalizer turns vendor- and
//! data-model-specific paths into a vendor-neutral telemetry record. An OLT
//! SNMP poller enriches CPE records with optical topology.

pub mod config;
pub mod core;
pub mod cwmp;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod snmp;
pub mod store;
pub mod tasks;
