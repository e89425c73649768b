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

//! Connection Request Client (RFC 2617 digest)
//!
//! The ACS wakes a CPE by issuing an HTTP GET to the device's management
//! URL. The CPE answers 401 with a Digest challenge; the second attempt
//! carries the computed Authorization header. A 200 on the second attempt
//! means the CPE will shortly open a new CWMP session.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use log::debug;
use md5::{Digest, Md5};

/// Fire a digest-authenticated connection request at a CPE management URL
///
/// # Arguments
///
/// * `username` - Digest username (by convention the device serial number)
/// * `password` - Configured connection-request password
/// * `url` - The CPE's ConnectionRequestURL
///
/// # Returns
///
/// Returns `Ok(true)` when the authenticated retry got a 200, `Ok(false)`
/// when the CPE rejected the credentials, or an error on transport failure
pub async fn connection_request(username: &str, password: &str, url: &str) -> Result<bool> {
    let parsed = reqwest::Url::parse(url)?;
    let mut uri_path = parsed.path().to_string();
    if let Some(query) = parsed.query() {
        uri_path.push('?');
        uri_path.push_str(query);
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    // First request collects the 401 challenge
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if status != reqwest::StatusCode::UNAUTHORIZED {
        return Err(anyhow!(
            "response status code should have been 401, it was {}",
            status
        ));
    }

    let challenge = resp
        .headers()
        .get("www-authenticate")
        .and_then(|v| v.to_str().ok())
        .and_then(parse_digest_challenge)
        .ok_or_else(|| anyhow!("401 response without a parsable Digest challenge"))?;

    let realm = challenge.get("realm").cloned().unwrap_or_default();
    let nonce = challenge.get("nonce").cloned().unwrap_or_default();
    let qop = challenge.get("qop").cloned().unwrap_or_default();
    let opaque = challenge.get("opaque").cloned().unwrap_or_default();

    let cnonce = generate_cnonce();
    let response = compute_digest_response(
        username, &realm, password, "GET", &uri_path, &nonce, "00000001", &cnonce, &qop,
    );

    let authorization = format!(
        r#"Digest username="{username}", realm="{realm}", nonce="{nonce}", uri="{uri_path}", cnonce="{cnonce}", nc=00000001, qop={qop}, response="{response}", opaque="{opaque}", algorithm=MD5"#
    );
    debug!("connection request retry to {} as {}", url, username);

    let resp2 = client
        .get(url)
        .header("Authorization", authorization)
        .send()
        .await?;
    Ok(resp2.status() == reqwest::StatusCode::OK)
}

/// Parse a `Www-Authenticate: Digest ...` header into its parameters
///
/// Returns `None` when the header is not a parsable Digest challenge.
pub fn parse_digest_challenge(header: &str) -> Option<HashMap<String, String>> {
    let rest = header.strip_prefix("Digest ")?;
    let mut params = HashMap::new();
    for part in rest.split(',') {
        if let Some((key, value)) = part.split_once('=') {
            params.insert(
                key.trim().trim_matches('"').to_string(),
                value.trim().trim_matches('"').to_string(),
            );
        }
    }
    Some(params)
}

/// Compute the RFC 2617 digest response value
///
/// `HA1 = MD5(username:realm:password)`, `HA2 = MD5(method:uri)`; with qop
/// the response is `MD5(HA1:nonce:nc:cnonce:qop:HA2)`, without it
/// `MD5(HA1:nonce:HA2)`.
pub fn compute_digest_response(
    username: &str,
    realm: &str,
    password: &str,
    method: &str,
    uri: &str,
    nonce: &str,
    nc: &str,
    cnonce: &str,
    qop: &str,
) -> String {
    let ha1 = md5_hex(&format!("{username}:{realm}:{password}"));
    let ha2 = md5_hex(&format!("{method}:{uri}"));
    if qop.is_empty() {
        md5_hex(&format!("{ha1}:{nonce}:{ha2}"))
    } else {
        md5_hex(&format!("{ha1}:{nonce}:{nc}:{cnonce}:{qop}:{ha2}"))
    }
}

/// Generate a fresh client nonce
pub fn generate_cnonce() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 12] = rng.gen();
    hex::encode(bytes)
}

/// Lower-case hex MD5 digest of a string
pub fn md5_hex(data: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_digest_challenge() {
        let params = parse_digest_challenge(
            r#"Digest realm="acs", nonce="N", qop=auth, opaque="O", algorithm=MD5"#,
        )
        .unwrap();
        assert_eq!(params.get("realm").unwrap(), "acs");
        assert_eq!(params.get("nonce").unwrap(), "N");
        assert_eq!(params.get("qop").unwrap(), "auth");
        assert_eq!(params.get("opaque").unwrap(), "O");
    }

    #[test]
    fn test_parse_digest_challenge_rejects_basic() {
        assert!(parse_digest_challenge(r#"Basic realm="acs""#).is_none());
    }

    #[test]
    fn test_digest_response_algebra() {
        // HA1 = MD5("ABC123:acs:P"), HA2 = MD5("GET:/acs"),
        // response = MD5(HA1:N:00000001:CNONCE:auth:HA2)
        let ha1 = md5_hex("ABC123:acs:P");
        let ha2 = md5_hex("GET:/acs");
        let expected = md5_hex(&format!("{ha1}:N:00000001:CNONCE:auth:{ha2}"));

        let got = compute_digest_response(
            "ABC123", "acs", "P", "GET", "/acs", "N", "00000001", "CNONCE", "auth",
        );
        assert_eq!(got, expected);
    }

    #[test]
    fn test_digest_response_without_qop() {
        let ha1 = md5_hex("u:r:p");
        let ha2 = md5_hex("GET:/");
        let expected = md5_hex(&format!("{ha1}:n:{ha2}"));
        assert_eq!(
            compute_digest_response("u", "r", "p", "GET", "/", "n", "00000001", "c", ""),
            expected
        );
    }

    #[test]
    fn test_cnonce_is_fresh() {
        assert_ne!(generate_cnonce(), generate_cnonce());
        assert_eq!(generate_cnonce().len(), 24);
    }
}
