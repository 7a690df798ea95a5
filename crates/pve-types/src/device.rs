// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Disk devices: the platform's view of a provisioned device and the user's
//! declaration of one.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::{Error, ErrorKind};
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::DiskSlot;

/// A disk device as reported by the platform for one slot.
///
/// The platform encodes a device as `<volume>[,key=value]...`; everything but
/// `file_id` and `interface` is opaque to reconciliation and is carried through
/// unchanged.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema,
)]
pub struct DeviceDescriptor {
    /// The backing volume, e.g. `local-lvm:vm-101-disk-0`.
    pub file_volume: String,

    /// The file the disk was imported from, if one was declared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,

    /// The slot name this device is attached at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,

    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl FromStr for DeviceDescriptor {
    type Err = std::io::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut file_volume = None;
        let mut options = BTreeMap::new();

        for (i, field) in s.split(',').enumerate() {
            match field.split_once('=') {
                Some(("file", v)) => file_volume = Some(v.to_owned()),
                Some((k, v)) => {
                    options.insert(k.to_owned(), v.to_owned());
                }
                // Only the leading field may omit its key.
                None if i == 0 && !field.is_empty() => {
                    file_volume = Some(field.to_owned())
                }
                None => {
                    return Err(Self::Err::new(
                        ErrorKind::InvalidInput,
                        format!("Malformed field {:?} in device {:?}", field, s),
                    ));
                }
            }
        }

        let file_volume = file_volume.ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                format!("No volume in device {:?}", s),
            )
        })?;

        Ok(Self { file_volume, file_id: None, interface: None, options })
    }
}

impl Display for DeviceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.file_volume)?;
        for (k, v) in self.options.iter() {
            write!(f, ",{}={}", k, v)?;
        }
        Ok(())
    }
}

/// The devices the platform reports for a VM, keyed by slot. A slot with no
/// entry has no device provisioned.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceSnapshot {
    devices: BTreeMap<DiskSlot, DeviceDescriptor>,
}

impl DeviceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from a VM configuration map as returned by the
    /// platform. Keys that are not disk slots, and slot values that do not
    /// describe a device (such as an empty cdrom's `none`), are skipped.
    pub fn from_config<'a, I>(config: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let devices = config
            .into_iter()
            .filter_map(|(key, value)| {
                let slot = DiskSlot::from_str(key).ok()?;
                if value.split(',').next() == Some("none") {
                    return None;
                }
                let device = DeviceDescriptor::from_str(value).ok()?;
                Some((slot, device))
            })
            .collect();

        Self { devices }
    }

    pub fn insert(
        &mut self,
        slot: DiskSlot,
        device: DeviceDescriptor,
    ) -> Option<DeviceDescriptor> {
        self.devices.insert(slot, device)
    }

    pub fn get(&self, slot: &DiskSlot) -> Option<&DeviceDescriptor> {
        self.devices.get(slot)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// A user-authored description of one disk, keyed by `interface`.
///
/// `interface` is kept as written; names outside the slot table never match a
/// device during reconciliation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct DiskDeclaration {
    pub interface: String,

    #[serde(default)]
    pub file_id: Option<String>,

    #[serde(default)]
    pub datastore_id: Option<String>,

    #[serde(default)]
    pub size: Option<String>,

    #[serde(default)]
    pub file_format: Option<String>,
}

impl DiskDeclaration {
    pub fn new<S: Into<String>>(interface: S) -> Self {
        Self {
            interface: interface.into(),
            file_id: None,
            datastore_id: None,
            size: None,
            file_format: None,
        }
    }

    pub fn with_file_id<S: Into<String>>(mut self, file_id: S) -> Self {
        self.file_id = Some(file_id.into());
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_device_string() {
        let dev = DeviceDescriptor::from_str(
            "local-lvm:vm-101-disk-0,size=8G,format=raw",
        )
        .unwrap();
        assert_eq!(dev.file_volume, "local-lvm:vm-101-disk-0");
        assert_eq!(dev.options.get("size").map(String::as_str), Some("8G"));
        assert_eq!(dev.options.get("format").map(String::as_str), Some("raw"));
        assert_eq!(dev.file_id, None);
        assert_eq!(dev.interface, None);

        // Options render in key order.
        assert_eq!(
            dev.to_string(),
            "local-lvm:vm-101-disk-0,format=raw,size=8G"
        );
    }

    #[test]
    fn parse_device_string_with_file_key() {
        let dev =
            DeviceDescriptor::from_str("cache=none,file=local:iso/x.iso")
                .unwrap();
        assert_eq!(dev.file_volume, "local:iso/x.iso");
        assert_eq!(dev.options.len(), 1);
    }

    #[test]
    fn malformed_device_strings() {
        for input in ["", ",size=8G", "size=8G", "local:x,bogus"] {
            assert!(
                DeviceDescriptor::from_str(input).is_err(),
                "Expected error parsing device {:?}",
                input
            );
        }
    }

    #[test]
    fn snapshot_from_vm_config() {
        let config: BTreeMap<String, String> = [
            ("scsi0", "local-lvm:vm-101-disk-0,size=8G"),
            ("ide2", "none,media=cdrom"),
            ("virtio3", "local:101/vm-101-disk-1.qcow2,size=32G"),
            ("scsi14", "local-lvm:vm-101-disk-9,size=1G"),
            ("net0", "virtio=A0:B1:C2:D3:E4:F5,bridge=vmbr0"),
            ("memory", "2048"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        let snapshot = DeviceSnapshot::from_config(&config);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get(&"scsi0".parse().unwrap()).is_some());
        assert!(snapshot.get(&"virtio3".parse().unwrap()).is_some());
        assert!(snapshot.get(&"ide2".parse().unwrap()).is_none());
    }

    #[test]
    fn declaration_deserializes_sparse() {
        let decl: DiskDeclaration =
            serde_json::from_str(r#"{ "interface": "scsi1" }"#).unwrap();
        assert_eq!(decl, DiskDeclaration::new("scsi1"));
    }
}
