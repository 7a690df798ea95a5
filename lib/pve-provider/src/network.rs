// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;

use pve_client::api::NetworkInterfaceRecord;
use pve_client::NodeApi;
use pve_types::DeviceSnapshot;
use slog::{debug, Logger};

use crate::{Error, NO_DATA_OBJECT};

/// Lists the network interfaces of `node`, ordered by ascending priority.
/// Interfaces of equal priority keep the order the server returned them in.
pub async fn list_networks<A: NodeApi + ?Sized>(
    api: &A,
    node: &str,
    log: &Logger,
) -> Result<Vec<NetworkInterfaceRecord>, Error> {
    let mut records = api
        .list_networks(node)
        .await?
        .data
        .ok_or_else(|| Error::Protocol(NO_DATA_OBJECT.to_owned()))?;

    records.sort_by_key(|r| r.priority);
    debug!(log, "listed networks"; "node" => node, "count" => records.len());
    Ok(records)
}

/// Reads the disk devices currently attached to VM `vm_id` on `node`.
pub async fn fetch_snapshot<A: NodeApi + ?Sized>(
    api: &A,
    node: &str,
    vm_id: i64,
    log: &Logger,
) -> Result<DeviceSnapshot, Error> {
    let config = api
        .vm_config(node, vm_id)
        .await?
        .data
        .ok_or_else(|| Error::Protocol(NO_DATA_OBJECT.to_owned()))?;

    // Device entries are strings; numeric options are rendered so the map is
    // uniform.
    let config: BTreeMap<String, String> = config
        .into_iter()
        .map(|(k, v)| match v {
            serde_json::Value::String(s) => (k, s),
            other => (k, other.to_string()),
        })
        .collect();

    let snapshot = DeviceSnapshot::from_config(&config);
    debug!(log, "fetched device snapshot";
        "node" => node, "vm_id" => vm_id, "devices" => snapshot.len());
    Ok(snapshot)
}
