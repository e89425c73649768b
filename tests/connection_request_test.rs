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

//! End-to-end digest connection-request flow against a canned CPE endpoint

use std::collections::HashMap;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use idris::cwmp::auth_client::{compute_digest_response, connection_request};

const CHALLENGE: &str = "HTTP/1.1 401 Unauthorized\r\n\
    Www-Authenticate: Digest realm=\"acs\", nonce=\"N\", qop=auth, opaque=\"O\"\r\n\
    Content-Length: 0\r\n\
    Connection: keep-alive\r\n\r\n";

const ACCEPTED: &str = "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

/// Read one HTTP request head (GET requests carry no body)
async fn read_request(sock: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = sock.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf.windows(4).any(|w| w == b"\r\n\r\n") {
            return Some(String::from_utf8_lossy(&buf).to_string());
        }
    }
}

async fn serve_cpe(listener: TcpListener, captured: mpsc::UnboundedSender<String>) {
    loop {
        let Ok((mut sock, _)) = listener.accept().await else {
            return;
        };
        let captured = captured.clone();
        tokio::spawn(async move {
            while let Some(request) = read_request(&mut sock).await {
                if request.to_ascii_lowercase().contains("authorization: digest") {
                    let _ = captured.send(request);
                    let _ = sock.write_all(ACCEPTED.as_bytes()).await;
                    return;
                }
                if sock.write_all(CHALLENGE.as_bytes()).await.is_err() {
                    return;
                }
            }
        });
    }
}

fn auth_params(request: &str) -> HashMap<String, String> {
    // header name casing is transport detail; hyper lowercases it
    let line = request
        .lines()
        .find(|l| l.to_ascii_lowercase().starts_with("authorization: digest "))
        .expect("no Authorization header");
    let (_, value) = line.split_once(": ").unwrap();
    value
        .trim_start_matches("Digest ")
        .split(", ")
        .filter_map(|kv| kv.split_once('='))
        .map(|(k, v)| (k.to_string(), v.trim_matches('"').to_string()))
        .collect()
}

#[tokio::test]
async fn test_digest_connection_request_flow() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(serve_cpe(listener, tx));

    let url = format!("http://{addr}/acs");
    let accepted = connection_request("ABC123", "P", &url).await.unwrap();
    assert!(accepted, "second attempt should have been a 200");

    let request = rx.recv().await.expect("authorized request not captured");
    let params = auth_params(&request);

    assert_eq!(params["username"], "ABC123");
    assert_eq!(params["realm"], "acs");
    assert_eq!(params["nonce"], "N");
    assert_eq!(params["uri"], "/acs");
    assert_eq!(params["nc"], "00000001");
    assert_eq!(params["qop"], "auth");
    assert_eq!(params["opaque"], "O");

    // response = MD5(HA1:N:00000001:cnonce:auth:HA2) with the cnonce the
    // client actually sent
    let expected = compute_digest_response(
        "ABC123",
        "acs",
        "P",
        "GET",
        "/acs",
        "N",
        "00000001",
        &params["cnonce"],
        "auth",
    );
    assert_eq!(params["response"], expected);
}

#[tokio::test]
async fn test_connection_request_without_challenge_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let _ = read_request(&mut sock).await;
        let _ = sock.write_all(ACCEPTED.as_bytes()).await;
    });

    let url = format!("http://{addr}/acs");
    let err = connection_request("ABC123", "P", &url).await.unwrap_err();
    assert!(err.to_string().contains("should have been 401"));
}
