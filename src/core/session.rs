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

//! CWMP Session Dispatcher
//!
//! The CPE-facing HTTP surface. A single POST path accepts SOAP bodies;
//! session identity is carried by the `tr069-session` cookie whose value is
//! the device serial number issued on the first Inform. A handful of
//! token-gated file routes serve per-session config blobs, preset bodies
//! and firmware, and accept CPE uploads.
//!
//! Ordering contract per device: the Inform is always processed before any
//! queued task on the same session; DB preset tasks precede in-memory
//! queued commands; the high-priority queue strictly pre-empts the normal
//! one.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use log::{error, info, warn};
use uuid::Uuid;

use crate::core::AcsContext;
use crate::cwmp::{
    codec, CwmpMessage, GetParameterValues, GetRPCMethodsResponse, Inform, InformResponse,
    TransferCompleteResponse, EVENT_BOOT, EVENT_BOOTSTRAP, EVENT_SCHEDULED, EVENT_VALUE_CHANGE,
};
use crate::error::AcsError;
use crate::registry::{CpeEntry, CwmpEventData};
use crate::store::db::DatabaseQueries;
use crate::tasks;

pub const TR069_COOKIE_NAME: &str = "tr069-session";

/// Build the CPE-facing router
pub fn router(ctx: Arc<AcsContext>) -> Router {
    Router::new()
        .route("/", post(cwmp_index))
        .route("/cwmpfiles/{session}/{token}/{filename}", get(config_file))
        .route(
            "/cwmpfiles/preset/{session}/{token}/{filename}",
            get(preset_file),
        )
        .route("/cwmpfiles/download/{filename}", get(firmware_download))
        .route(
            "/cwmpupload/{session}/{token}/{filename}",
            put(cpe_upload).post(cpe_upload),
        )
        .route("/metrics", get(metrics_export))
        .with_state(ctx)
}

/// RPC responses go out as XML on a kept-alive connection
fn xml_response(body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
            (header::CONNECTION, "keep-alive"),
        ],
        body,
    )
        .into_response()
}

/// Same as `xml_response`, also issuing the session cookie
fn xml_response_with_cookie(body: String, sn: &str) -> Response {
    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/xml; charset=utf-8".to_string(),
            ),
            (header::CONNECTION, "keep-alive".to_string()),
            (header::SET_COOKIE, format!("{TR069_COOKIE_NAME}={sn}")),
        ],
        body,
    )
        .into_response()
}

/// 204: no further work for this session
fn no_content() -> Response {
    (
        StatusCode::NO_CONTENT,
        [(header::CONNECTION, "keep-alive")],
    )
        .into_response()
}

/// Extract the session serial number from the request cookies
fn cookie_sn(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        if let Some((name, value)) = pair.trim().split_once('=') {
            if name == TR069_COOKIE_NAME && !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Best-effort client address for registration audit remarks
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

async fn metrics_export(State(ctx): State<Arc<AcsContext>>) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        ctx.metrics.export_prometheus(ctx.registry.size() as u64),
    )
        .into_response()
}

/// The single CWMP POST endpoint
async fn cwmp_index(
    State(ctx): State<Arc<AcsContext>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    ctx.metrics.increment_messages();
    let session_sn = cookie_sn(&headers);

    if body.is_empty() {
        return empty_post(&ctx, session_sn).await;
    }

    let msg = match codec::parse(&body) {
        Ok(msg) => msg,
        Err(e) => {
            ctx.metrics.increment_errors();
            warn!("cwmp read xml error: {e}");
            return e.into_response();
        }
    };
    info!("recv CPE {} message, id={}", msg.name(), msg.id());

    let msg = match msg {
        CwmpMessage::Inform(inform) => {
            return process_inform(&ctx, &headers, session_sn, inform).await
        }
        other => other,
    };

    // Everything except Inform resolves the device by cookie
    let Some(sn) = session_sn else {
        return AcsError::Auth("no cookie sn".to_string()).into_response();
    };
    let entry = match ctx.registry.get(&sn, &ctx.state).await {
        Ok(entry) => entry,
        Err(e) => return e.into_response(),
    };
    if entry.last_inform().is_none() {
        return AcsError::Auth("no cookie cpe data".to_string()).into_response();
    }

    match msg {
        CwmpMessage::GetParameterValuesResponse(gm) => {
            entry.on_params_update(&ctx.state, &gm.values).await;
            next_work(&ctx, &entry, 500).await
        }
        CwmpMessage::SetParameterValuesResponse(_) => {
            tasks::update_task_status_by_response(
                &ctx.state,
                &msg,
                ctx.config.tr069.task_max_attempts,
            )
            .await;
            next_work(&ctx, &entry, 100).await
        }
        CwmpMessage::DownloadResponse(_) | CwmpMessage::UploadResponse(_) => {
            tasks::update_task_status_by_response(
                &ctx.state,
                &msg,
                ctx.config.tr069.task_max_attempts,
            )
            .await;
            next_work(&ctx, &entry, 100).await
        }
        CwmpMessage::GetParameterNamesResponse(gm) => {
            if gm.id.starts_with("bootstrap-session") {
                let ctx = Arc::clone(&ctx);
                let entry = Arc::clone(&entry);
                tokio::spawn(async move {
                    entry
                        .process_parameter_names_response(&ctx.state, &gm)
                        .await;
                });
            } else {
                info!("parameter names response for {} ({} names)", sn, gm.params.len());
            }
            no_content()
        }
        CwmpMessage::TransferComplete(ref tc) => {
            let response = CwmpMessage::TransferCompleteResponse(TransferCompleteResponse {
                id: tc.id.clone(),
            });
            let command_key = tc.command_key.clone();
            let msg = msg.clone();
            let ctx2 = Arc::clone(&ctx);
            tokio::spawn(async move {
                if !command_key.is_empty() {
                    tasks::update_task_status_by_response(
                        &ctx2.state,
                        &msg,
                        ctx2.config.tr069.task_max_attempts,
                    )
                    .await;
                    let status = if matches!(&msg, CwmpMessage::TransferComplete(tc) if tc.fault_code == 0)
                    {
                        "success"
                    } else {
                        "failure"
                    };
                    if let Err(e) = DatabaseQueries::update_config_session_status(
                        ctx2.state.pool(),
                        &command_key,
                        status,
                    )
                    .await
                    {
                        error!("config session status update failed: {e}");
                    }
                }
            });
            xml_response(codec::emit(&response))
        }
        CwmpMessage::GetRPCMethods(gm) => {
            let response = CwmpMessage::GetRPCMethodsResponse(GetRPCMethodsResponse {
                id: gm.id,
                methods: Vec::new(),
            });
            xml_response(codec::emit(&response))
        }
        CwmpMessage::Fault(_) => {
            ctx.metrics.increment_errors();
            tasks::update_task_status_by_response(
                &ctx.state,
                &msg,
                ctx.config.tr069.task_max_attempts,
            )
            .await;
            no_content()
        }
        other => {
            info!("unhandled message type {} from {}", other.name(), sn);
            no_content()
        }
    }
}

/// Inform handling: update the runtime entry, run the event pipeline in the
/// background, then answer with queued work or a plain InformResponse.
async fn process_inform(
    ctx: &Arc<AcsContext>,
    headers: &HeaderMap,
    session_sn: Option<String>,
    inform: Inform,
) -> Response {
    ctx.metrics.increment_informs();

    if ctx.config.tr069.strict_session {
        if let Some(cookie) = &session_sn {
            if *cookie != inform.sn {
                warn!("cookie sn {} disagrees with inform sn {}", cookie, inform.sn);
                return AcsError::Auth("session/device mismatch".to_string()).into_response();
            }
        }
    }

    let entry = match ctx.registry.get(&inform.sn, &ctx.state).await {
        Ok(entry) => entry,
        Err(e) => return e.into_response(),
    };
    entry.update_status(&inform);

    // The event pipeline runs off-request; a panic in the normalizer is
    // contained and logged against the offending SN.
    let ip = client_ip(headers);
    let sn = inform.sn.clone();
    let pipeline = {
        let ctx = Arc::clone(ctx);
        let entry = Arc::clone(&entry);
        let inform = inform.clone();
        tokio::spawn(async move {
            process_inform_event(ctx, entry, inform, ip).await;
        })
    };
    tokio::spawn(async move {
        if let Err(e) = pipeline.await {
            if e.is_panic() {
                error!("inform processing panicked for {sn}");
            }
        }
    });

    // Short peek lets operator commands ride the Inform exchange instead of
    // waiting for the empty-POST drain.
    if let Some(event) = entry.next_queued(100).await {
        ctx.metrics.increment_rpcs_sent();
        info!("sending queued {} to {} on inform", event.message.name(), inform.sn);
        return xml_response_with_cookie(codec::emit(&event.message), &inform.sn);
    }

    let response = CwmpMessage::InformResponse(InformResponse {
        id: inform.id.clone(),
        max_envelopes: inform.max_envelopes.max(1),
    });
    xml_response_with_cookie(codec::emit(&response), &inform.sn)
}

async fn process_inform_event(
    ctx: Arc<AcsContext>,
    entry: Arc<CpeEntry>,
    inform: Inform,
    ip: String,
) {
    entry.check_register(&ip, &inform, &ctx.state).await;

    let force = inform.is_event(EVENT_VALUE_CHANGE) && inform.retry_count == 0;
    if entry.should_full_notify(force) {
        entry.on_inform_update(&ctx.state).await;
    } else {
        entry.on_inform_update_online(&ctx.state).await;
    }

    if inform.retry_count == 0 {
        if inform.is_event(EVENT_BOOTSTRAP) || inform.is_event(EVENT_BOOT) {
            if inform.is_event(EVENT_BOOT) {
                if let Err(e) = tasks::activate_sched_tasks(&ctx.state, &inform.sn, None).await {
                    error!("scheduled task activation for {} failed: {e}", inform.sn);
                }
            }

            let session = format!("bootstrap-session-{}", Uuid::new_v4());
            let event_tag = if inform.is_event(EVENT_BOOTSTRAP) {
                tasks::BOOTSTRAP_EVENT
            } else {
                tasks::BOOT_EVENT
            };
            let auth_msg = entry.management_auth_message(&session, &ctx.state).await;
            if let Err(e) = tasks::create_preset_task(
                &ctx.state,
                &inform.sn,
                event_tag,
                "ManagementAuth",
                "retry",
                &session,
                &auth_msg,
                0,
            )
            .await
            {
                error!("management-auth task for {} failed: {e}", inform.sn);
            }
            if let Err(e) = entry
                .update_management_auth(&session, &ctx.state, 1000, false)
                .await
            {
                error!("management-auth push for {} failed: {e}", inform.sn);
            }

            if inform.is_event(EVENT_BOOTSTRAP) {
                let session = tasks::new_session("WebCredentials");
                if let Err(e) = entry
                    .push_web_credentials(&session, &ctx.state, 1000, false)
                    .await
                {
                    warn!("web credential push for {} failed: {e}", inform.sn);
                }
            }
        } else if inform.is_event(EVENT_SCHEDULED) {
            let key = inform.command_key();
            let key = (!key.is_empty()).then_some(key);
            if let Err(e) = tasks::activate_sched_tasks(&ctx.state, &inform.sn, key).await {
                error!("scheduled task activation for {} failed: {e}", inform.sn);
            }
        }
    }

    // Auto-fetch the WiFi/WAN/host subtrees for the data model the device
    // just spoke; Informs themselves rarely carry those tables.
    let parameter_names: Vec<String> = if inform.uses_tr098() {
        vec![
            "InternetGatewayDevice.DeviceInfo.".to_string(),
            "InternetGatewayDevice.LANDevice.1.WLANConfiguration.".to_string(),
            "InternetGatewayDevice.LANDevice.1.Hosts.".to_string(),
            "InternetGatewayDevice.WANDevice.".to_string(),
        ]
    } else if inform.params.keys().any(|n| n.starts_with("Device.")) {
        vec![
            "Device.WiFi.".to_string(),
            "Device.IP.".to_string(),
            "Device.PPP.".to_string(),
        ]
    } else {
        return;
    };

    let session = format!("auto-fetch-{}", Uuid::new_v4());
    let fetch = CwmpEventData {
        session: session.clone(),
        sn: inform.sn.clone(),
        message: CwmpMessage::GetParameterValues(GetParameterValues {
            id: session,
            parameter_names,
        }),
    };
    if let Err(e) = entry.send_event(fetch, 3000, false).await {
        warn!("auto-fetch queue for {} failed: {e}", inform.sn);
    }
}

/// Pick the next unit of work after a response envelope: DB preset tasks
/// first, then the in-memory queues, then nothing.
async fn next_work(ctx: &AcsContext, entry: &CpeEntry, queue_budget_ms: u64) -> Response {
    if let Some(task) = tasks::next_pending_task(&ctx.state, &entry.sn).await {
        if !task.request.is_empty() {
            ctx.metrics.increment_rpcs_sent();
            info!("sending preset task {} to {}", task.name, entry.sn);
            return xml_response(task.request);
        }
    }

    if let Some(event) = entry.next_queued(queue_budget_ms).await {
        ctx.metrics.increment_rpcs_sent();
        info!("sending queued {} to {}", event.message.name(), entry.sn);
        return xml_response(codec::emit(&event.message));
    }

    no_content()
}

/// Empty-POST drain: the CPE polls for work until it gets a 204
async fn empty_post(ctx: &AcsContext, session_sn: Option<String>) -> Response {
    let Some(sn) = session_sn else {
        return no_content();
    };
    let entry = match ctx.registry.get(&sn, &ctx.state).await {
        Ok(entry) => entry,
        Err(_) => return no_content(),
    };

    if let Some(task) = tasks::next_pending_task(&ctx.state, &sn).await {
        if !task.request.is_empty() {
            ctx.metrics.increment_rpcs_sent();
            info!("sending preset task {} to {}", task.name, sn);
            return xml_response(task.request);
        }
    }

    if let Some(event) = entry.next_queued(1000).await {
        ctx.metrics.increment_rpcs_sent();
        info!("sending queued {} to {}", event.message.name(), sn);
        return xml_response(codec::emit(&event.message));
    }

    no_content()
}

/// Reject file names that could escape the workdir
fn unsafe_filename(filename: &str) -> bool {
    filename.contains("..") || filename.contains('/') || filename.contains('\\')
}

/// Serve a per-session config blob (token valid for the current day)
async fn config_file(
    State(ctx): State<Arc<AcsContext>>,
    Path((session, token, filename)): Path<(String, String, String)>,
) -> Response {
    if session.is_empty() || token != tasks::file_token(&session, &ctx.config.tr069.secret) {
        return (StatusCode::BAD_REQUEST, "bad token").into_response();
    }

    match DatabaseQueries::get_config_session(ctx.state.pool(), &session).await {
        Ok(Some(row)) => {
            info!("cpe fetch cwmp file session = {session}");
            serve_attachment(&filename, row.content.into_bytes())
        }
        Ok(None) => (StatusCode::NOT_FOUND, "no such session").into_response(),
        Err(e) => AcsError::Internal(e).into_response(),
    }
}

/// Serve a preset-task file body (token valid for the current day)
async fn preset_file(
    State(ctx): State<Arc<AcsContext>>,
    Path((session, token, filename)): Path<(String, String, String)>,
) -> Response {
    if session.is_empty() || token != tasks::file_token(&session, &ctx.config.tr069.secret) {
        return (StatusCode::BAD_REQUEST, "bad token").into_response();
    }

    match DatabaseQueries::get_task_by_session(ctx.state.pool(), &session).await {
        Ok(Some(task)) => {
            info!("cpe fetch cwmp preset file session = {session}");
            serve_attachment(&filename, task.content.into_bytes())
        }
        Ok(None) => (StatusCode::NOT_FOUND, "no such session").into_response(),
        Err(e) => AcsError::Internal(e).into_response(),
    }
}

/// Serve firmware from the workdir; traversal attempts are rejected
async fn firmware_download(
    State(ctx): State<Arc<AcsContext>>,
    Path(filename): Path<String>,
) -> Response {
    if unsafe_filename(&filename) {
        return (StatusCode::BAD_REQUEST, "bad request").into_response();
    }
    let path = FsPath::new(&ctx.config.core.workdir)
        .join("cwmp")
        .join(&filename);
    match tokio::fs::read(&path).await {
        Ok(data) => serve_attachment(&filename, data),
        Err(_) => (StatusCode::NOT_FOUND, "no such file").into_response(),
    }
}

/// Store an uploaded CPE file (log, backup) under the workdir
async fn cpe_upload(
    State(ctx): State<Arc<AcsContext>>,
    Path((session, token, filename)): Path<(String, String, String)>,
    body: Bytes,
) -> Response {
    if session.is_empty() || token != tasks::file_token(&session, &ctx.config.tr069.secret) {
        return (StatusCode::BAD_REQUEST, "bad token").into_response();
    }
    if unsafe_filename(&filename) {
        return (StatusCode::BAD_REQUEST, "bad request").into_response();
    }

    let dir = FsPath::new(&ctx.config.core.workdir).join("cwmp");
    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        return AcsError::Internal(e.into()).into_response();
    }
    match tokio::fs::write(dir.join(&filename), &body).await {
        Ok(()) => {
            info!("stored cpe upload {} ({} bytes)", filename, body.len());
            StatusCode::OK.into_response()
        }
        Err(e) => AcsError::Internal(e.into()).into_response(),
    }
}

fn serve_attachment(filename: &str, data: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/octet-stream".to_string(),
            ),
            (header::CONNECTION, "keep-alive".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment;filename={filename}"),
            ),
        ],
        data,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_sn_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("other=1; tr069-session=ABC123"),
        );
        assert_eq!(cookie_sn(&headers).as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_cookie_sn_absent() {
        let headers = HeaderMap::new();
        assert!(cookie_sn(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("tr069-session="));
        assert!(cookie_sn(&headers).is_none());
    }

    #[test]
    fn test_unsafe_filenames() {
        assert!(unsafe_filename("../etc/passwd"));
        assert!(unsafe_filename("a/b.bin"));
        assert!(!unsafe_filename("firmware-1.2.3.bin"));
    }
}
