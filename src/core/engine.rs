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

//! ACS Core Engine
//!
//! Coordinates the CPE-facing HTTP listener, the device registry, and the
//! background OLT poller.
//!
//! The `AcsCore` is responsible for:
//! - Building shared state (database pool) and the runtime registry
//! - Serving the CWMP session dispatcher
//! - Spawning the OLT SNMP poller
//! - Graceful shutdown handling on SIGINT

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use tokio::net::TcpListener;
use tokio::signal;

use crate::config::IdrisConfig;
use crate::core::{session, AcsContext};
use crate::metrics::Metrics;
use crate::registry::CpeRegistry;
use crate::snmp::OltPoller;
use crate::store::SharedState;

/// Main ACS engine that owns the process lifecycle
pub struct AcsCore {
    context: Arc<AcsContext>,
}

impl AcsCore {
    pub async fn new(config: IdrisConfig) -> Result<Self> {
        let config = Arc::new(config);
        let state = SharedState::build(&config.database)
            .await
            .context("failed to connect to the database")?;

        let context = Arc::new(AcsContext {
            config: Arc::clone(&config),
            state,
            registry: CpeRegistry::new(),
            metrics: Arc::new(Metrics::new()),
        });

        Ok(AcsCore { context })
    }

    /// Runs the ACS until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot bind or serving fails
    /// catastrophically; request-scoped errors never propagate here.
    pub async fn run(self) -> Result<()> {
        let poller = OltPoller::new(
            self.context.config.snmp.poll_interval_minutes,
            self.context.state.clone(),
            Arc::clone(&self.context.metrics),
        );
        tokio::spawn(poller.run());

        let addr = format!("0.0.0.0:{}", self.context.config.core.tr069_port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind CWMP listener on {addr}"))?;
        info!("Idris ACS listening on {addr}");

        let router = session::router(Arc::clone(&self.context));
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = signal::ctrl_c().await;
                info!("shutdown signal received");
            })
            .await?;

        info!("Idris ACS stopped gracefully");
        Ok(())
    }
}
