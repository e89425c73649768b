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

//! ACS Error Types
//!
//! Request-scoped errors convert to an HTTP status and a log entry; they
//! never abort the process. Background errors are logged by their task and
//! the task continues on the next tick.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use thiserror::Error;

pub type AcsResult<T> = std::result::Result<T, AcsError>;

/// Error kinds surfaced by the CWMP core
#[derive(Debug, Error)]
pub enum AcsError {
    /// Malformed SOAP/XML or an unknown message element
    #[error("cwmp protocol error: {0}")]
    Protocol(String),

    /// Missing session cookie, bad file token, or digest failure
    #[error("authentication error: {0}")]
    Auth(String),

    /// The chosen per-device queue stayed full for the whole wall-clock budget
    #[error("cwmp event channel full, write timeout")]
    QueueFullTimeout,

    /// The chosen per-device queue stayed empty for the whole wall-clock budget
    #[error("read cwmp event channel timeout")]
    QueueEmptyTimeout,

    /// Persistence failure
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    /// A push would target a parameter path known not to work for the
    /// device's vendor. Skipped by callers, never reported to the CPE.
    #[error("vendor unsupported: {0}")]
    VendorUnsupported(String),

    /// Outbound request (connection request) timed out
    #[error("request timeout")]
    RequestTimeout,

    /// Caller passed an invalid argument (e.g. empty serial number)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Anything else
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AcsError {
    fn into_response(self) -> Response {
        let status = match self {
            AcsError::Protocol(_) | AcsError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AcsError::Auth(_) => StatusCode::UNAUTHORIZED,
            AcsError::QueueFullTimeout | AcsError::QueueEmptyTimeout => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("request failed: {}", self);
        }

        (status, self.to_string()).into_response()
    }
}
