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

//! Vendor Capability Table
//!
//! Vendor-specific branching is a capability lookup, not inheritance. Each
//! profile names the parameter-path families known to actually work on that
//! vendor's firmware; pushes that have no working path for a device are
//! skipped silently rather than fired and faulted.

use std::collections::HashMap;

use crate::cwmp::ParamValue;

/// How a vendor exposes its web UI credentials over TR-069
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebCredentialPaths {
    /// ZTE `X_ZTE-COM_UserInterface.X_ZTE-COM_WebUserInfo.*`
    ZteWebUserInfo,
    /// TR-098 `DeviceInfo.X_CT-COM_TeleComAccount.*` (CDATA/CDTC and friends)
    TelecomAccount,
}

struct VendorProfile {
    match_substrings: &'static [&'static str],
    factory_config_filetype: &'static str,
    web_credentials: WebCredentialPaths,
}

const VENDOR_TABLE: &[VendorProfile] = &[
    VendorProfile {
        match_substrings: &["zte"],
        factory_config_filetype: "3 Vendor Configuration File",
        web_credentials: WebCredentialPaths::ZteWebUserInfo,
    },
    VendorProfile {
        match_substrings: &["mikrotik"],
        factory_config_filetype: "X MIKROTIK Factory Configuration File",
        web_credentials: WebCredentialPaths::TelecomAccount,
    },
];

const DEFAULT_FACTORY_FILETYPE: &str = "3 Vendor Configuration File";

fn profile(manufacturer: &str) -> Option<&'static VendorProfile> {
    let m = manufacturer.to_lowercase();
    VENDOR_TABLE
        .iter()
        .find(|p| p.match_substrings.iter().any(|s| m.contains(s)))
}

/// File type string for a factory-configuration Download RPC
pub fn factory_config_filetype(manufacturer: &str) -> &'static str {
    profile(manufacturer)
        .map(|p| p.factory_config_filetype)
        .unwrap_or(DEFAULT_FACTORY_FILETYPE)
}

/// ONT web UI credentials to push
#[derive(Debug, Clone, Default)]
pub struct WebCredentials {
    pub admin_username: String,
    pub admin_password: String,
    pub user_username: String,
    pub user_password: String,
}

impl WebCredentials {
    pub fn is_empty(&self) -> bool {
        self.admin_username.is_empty()
            && self.admin_password.is_empty()
            && self.user_username.is_empty()
            && self.user_password.is_empty()
    }
}

/// Build the SetParameterValues map for a web-credential push.
///
/// Only paths known to work for the device's vendor are used; an empty map
/// means the push should be skipped for this device.
pub fn web_credential_params(
    manufacturer: &str,
    creds: &WebCredentials,
) -> HashMap<String, ParamValue> {
    let mut params = HashMap::new();
    let paths = profile(manufacturer)
        .map(|p| p.web_credentials)
        .unwrap_or(WebCredentialPaths::TelecomAccount);

    match paths {
        WebCredentialPaths::ZteWebUserInfo => {
            if !creds.admin_password.is_empty() {
                params.insert(
                    "InternetGatewayDevice.X_ZTE-COM_UserInterface.X_ZTE-COM_WebUserInfo.AdminPassword"
                        .to_string(),
                    ParamValue::string(&creds.admin_password),
                );
            }
            if !creds.user_username.is_empty() {
                params.insert(
                    "InternetGatewayDevice.X_ZTE-COM_UserInterface.X_ZTE-COM_WebUserInfo.UserName"
                        .to_string(),
                    ParamValue::string(&creds.user_username),
                );
            }
            if !creds.user_password.is_empty() {
                params.insert(
                    "InternetGatewayDevice.X_ZTE-COM_UserInterface.X_ZTE-COM_WebUserInfo.UserPassword"
                        .to_string(),
                    ParamValue::string(&creds.user_password),
                );
            }
        }
        WebCredentialPaths::TelecomAccount => {
            if !creds.admin_username.is_empty() {
                params.insert(
                    "InternetGatewayDevice.DeviceInfo.X_CT-COM_TeleComAccount.Username".to_string(),
                    ParamValue::string(&creds.admin_username),
                );
            }
            if !creds.admin_password.is_empty() {
                params.insert(
                    "InternetGatewayDevice.DeviceInfo.X_CT-COM_TeleComAccount.Password".to_string(),
                    ParamValue::string(&creds.admin_password),
                );
            }
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_filetype() {
        assert_eq!(
            factory_config_filetype("MikroTik"),
            "X MIKROTIK Factory Configuration File"
        );
        assert_eq!(factory_config_filetype("ZTE"), "3 Vendor Configuration File");
        assert_eq!(factory_config_filetype("Huawei"), "3 Vendor Configuration File");
    }

    #[test]
    fn test_zte_web_credentials_use_zte_paths_only() {
        let creds = WebCredentials {
            admin_username: "admin".to_string(),
            admin_password: "pw".to_string(),
            user_username: "user".to_string(),
            user_password: "upw".to_string(),
        };
        let params = web_credential_params("ZTE Corporation", &creds);
        assert!(params.keys().all(|k| k.contains("X_ZTE-COM_WebUserInfo")));
        // ZTE firmware rejects AdminName writes; only three paths work
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_default_web_credentials_use_telecom_account() {
        let creds = WebCredentials {
            admin_username: "admin".to_string(),
            admin_password: "pw".to_string(),
            ..WebCredentials::default()
        };
        let params = web_credential_params("CDTC", &creds);
        assert!(params
            .keys()
            .all(|k| k.contains("X_CT-COM_TeleComAccount")));
        assert_eq!(params.len(), 2);
    }
}
