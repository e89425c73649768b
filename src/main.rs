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

//! Idris ACS - Main Entry Point
//!
//! Initializes logging, loads configuration, and starts the ACS core.
//! The application runs until interrupted by a shutdown signal (SIGINT).

use anyhow::Context;
use clap::Parser;

use idris::config::IdrisConfig;
use idris::core::AcsCore;

/// Command-line arguments for Idris ACS
#[derive(Parser)]
#[command(name = "Idris ACS", about = "TR-069/CWMP Auto-Configuration Server in Rust")]
struct Args {
    /// Path to the configuration file (YAML)
    #[arg(short, long, default_value = "config/idris.yaml")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config =
        IdrisConfig::load(&args.config).context("failed to load Idris configuration")?;

    let core = AcsCore::new(config).await?;
    core.run().await?;
    Ok(())
}
