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

//! ACS Core
//!
//! The engine wires configuration, shared state, the device registry and
//! the metrics plane into one context object that every handler receives
//! explicitly; there is no package-global application handle.

pub mod engine;
pub mod session;

pub use engine::AcsCore;

use std::sync::Arc;

use crate::config::IdrisConfig;
use crate::metrics::Metrics;
use crate::registry::CpeRegistry;
use crate::store::SharedState;

/// Everything a request handler or background task needs
pub struct AcsContext {
    /// Application configuration
    pub config: Arc<IdrisConfig>,
    /// Shared application state (database pool, settings cache)
    pub state: SharedState,
    /// Per-SN runtime entries and queues
    pub registry: CpeRegistry,
    /// Process metrics
    pub metrics: Arc<Metrics>,
}
