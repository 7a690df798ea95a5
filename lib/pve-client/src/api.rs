// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire types exchanged with the management API.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Every response body wraps its payload in a `data` field. A body with no
/// `data` field at all is distinct from one whose `data` is empty.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
pub struct DataResponse<T> {
    #[serde(default)]
    pub data: Option<T>,
}

/// A network interface on a node. Fields the server leaves out read as
/// their defaults.
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct NetworkInterfaceRecord {
    #[serde(default)]
    pub address: String,

    /// Display order; interfaces without one sort as zero.
    #[serde(default)]
    pub priority: i64,

    #[serde(default, rename = "type")]
    pub kind: String,
}

pub type NetworkListResponse = DataResponse<Vec<NetworkInterfaceRecord>>;

/// A VM's configuration, keyed by option name (`memory`, `scsi0`, ...).
pub type VmConfigResponse =
    DataResponse<BTreeMap<String, serde_json::Value>>;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn data_absent_and_empty_are_distinct() {
        let empty: NetworkListResponse =
            serde_json::from_str(r#"{ "data": [] }"#).unwrap();
        assert_eq!(empty.data, Some(vec![]));

        let absent: NetworkListResponse =
            serde_json::from_str(r#"{ "errors": {} }"#).unwrap();
        assert_eq!(absent.data, None);
    }

    #[test]
    fn priority_defaults_to_zero() {
        let resp: NetworkListResponse = serde_json::from_str(
            r#"{ "data": [
                { "address": "10.0.0.2", "priority": 4, "type": "bridge" },
                { "type": "eth", "iface": "eno1" }
            ] }"#,
        )
        .unwrap();

        let data = resp.data.unwrap();
        assert_eq!(data[0].priority, 4);
        assert_eq!(data[0].kind, "bridge");
        assert_eq!(data[1].priority, 0);
        assert_eq!(data[1].address, "");
    }

    #[test]
    fn record_without_type_still_decodes() {
        let resp: NetworkListResponse = serde_json::from_str(
            r#"{ "data": [
                { "address": "10.0.0.2", "priority": 1 },
                { "type": "bridge" }
            ] }"#,
        )
        .unwrap();

        let data = resp.data.unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].kind, "");
        assert_eq!(data[1].kind, "bridge");
    }

    #[test]
    fn vm_config_values_keep_their_kind() {
        let resp: VmConfigResponse = serde_json::from_str(
            r#"{ "data": { "memory": 2048, "scsi0": "local-lvm:vm-1,size=8G" } }"#,
        )
        .unwrap();
        let data = resp.data.unwrap();
        assert!(data["memory"].is_number());
        assert!(data["scsi0"].is_string());
    }
}
