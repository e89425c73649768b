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

//! Process Metrics
//!
//! Relaxed atomic counters for the CWMP and SNMP planes, scraped as
//! Prometheus text on the CPE-facing port. The online-CPE gauge is not
//! tracked here at all: the registry already knows how many runtime
//! entries exist, so the scrape handler passes that number in.

use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct Metrics {
    cwmp_messages_total: AtomicU64,
    cwmp_informs_total: AtomicU64,
    cwmp_rpcs_sent_total: AtomicU64,
    cwmp_errors_total: AtomicU64,
    connection_requests_total: AtomicU64,
    snmp_polls_total: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            cwmp_messages_total: AtomicU64::new(0),
            cwmp_informs_total: AtomicU64::new(0),
            cwmp_rpcs_sent_total: AtomicU64::new(0),
            cwmp_errors_total: AtomicU64::new(0),
            connection_requests_total: AtomicU64::new(0),
            snmp_polls_total: AtomicU64::new(0),
        }
    }

    pub fn increment_messages(&self) {
        self.cwmp_messages_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_informs(&self) {
        self.cwmp_informs_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rpcs_sent(&self) {
        self.cwmp_rpcs_sent_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_errors(&self) {
        self.cwmp_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_connection_requests(&self) {
        self.connection_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_snmp_polls(&self) {
        self.snmp_polls_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Render the exposition text for one scrape. `online_cpes` comes from
    /// the registry so the gauge never drifts from the real entry count.
    pub fn export_prometheus(&self, online_cpes: u64) -> String {
        let counters = [
            (
                "idris_cwmp_messages_total",
                "CWMP envelopes received",
                self.cwmp_messages_total.load(Ordering::Relaxed),
            ),
            (
                "idris_cwmp_informs_total",
                "Inform envelopes received",
                self.cwmp_informs_total.load(Ordering::Relaxed),
            ),
            (
                "idris_cwmp_rpcs_sent_total",
                "RPCs emitted to CPEs",
                self.cwmp_rpcs_sent_total.load(Ordering::Relaxed),
            ),
            (
                "idris_cwmp_errors_total",
                "Malformed or failed CWMP exchanges",
                self.cwmp_errors_total.load(Ordering::Relaxed),
            ),
            (
                "idris_connection_requests_total",
                "Connection requests fired at CPEs",
                self.connection_requests_total.load(Ordering::Relaxed),
            ),
            (
                "idris_snmp_polls_total",
                "OLT SNMP poll rounds",
                self.snmp_polls_total.load(Ordering::Relaxed),
            ),
        ];

        let mut out = String::with_capacity(1024);
        for (name, help, value) in counters {
            let _ = writeln!(out, "# HELP {name} {help}");
            let _ = writeln!(out, "# TYPE {name} counter");
            let _ = writeln!(out, "{name} {value}");
        }
        let _ = writeln!(out, "# HELP idris_online_cpes CPEs with a live runtime entry");
        let _ = writeln!(out, "# TYPE idris_online_cpes gauge");
        let _ = writeln!(out, "idris_online_cpes {online_cpes}");
        out
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_reflects_counts() {
        let metrics = Metrics::new();
        metrics.increment_informs();
        metrics.increment_connection_requests();
        metrics.increment_connection_requests();

        let text = metrics.export_prometheus(3);
        assert!(text.contains("idris_cwmp_informs_total 1"));
        assert!(text.contains("idris_connection_requests_total 2"));
        assert!(text.contains("idris_cwmp_messages_total 0"));
        assert!(text.contains("idris_online_cpes 3"));
    }
}
