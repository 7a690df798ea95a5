// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeMap;
use std::str::FromStr;

use pve_types::{DeviceDescriptor, DeviceSnapshot, DiskDeclaration, DiskSlot};
use serde::{Deserialize, Serialize};

/// The outcome of reconciliation: one entry for every slot the platform can
/// address, `None` where no device is attached.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ReconciledDeviceTable(BTreeMap<DiskSlot, Option<DeviceDescriptor>>);

impl ReconciledDeviceTable {
    pub fn get(&self, slot: &DiskSlot) -> Option<&DeviceDescriptor> {
        self.0.get(slot).and_then(Option::as_ref)
    }

    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&DiskSlot, &Option<DeviceDescriptor>)> {
        self.0.iter()
    }

    /// Only the slots that hold a device.
    pub fn assigned(
        &self,
    ) -> impl Iterator<Item = (&DiskSlot, &DeviceDescriptor)> {
        self.0.iter().filter_map(|(slot, dev)| dev.as_ref().map(|d| (slot, d)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Merges `declarations` into the devices of `snapshot`.
///
/// A declaration only adjusts a device that already exists; it never creates
/// one. When two declarations name the same slot the later one wins, and a
/// declaration naming no known slot is dropped.
pub fn reconcile_disks(
    snapshot: &DeviceSnapshot,
    declarations: &[DiskDeclaration],
) -> ReconciledDeviceTable {
    let declared: BTreeMap<DiskSlot, &DiskDeclaration> = declarations
        .iter()
        .filter_map(|d| Some((DiskSlot::from_str(&d.interface).ok()?, d)))
        .collect();

    let table = DiskSlot::ALL
        .iter()
        .map(|slot| {
            let device = snapshot.get(slot).map(|remote| {
                let mut device = remote.clone();
                if let Some(file_id) =
                    declared.get(slot).and_then(|d| d.file_id.as_ref())
                {
                    device.file_id = Some(file_id.clone());
                }
                device.interface = Some(slot.to_string());
                device
            });
            (*slot, device)
        })
        .collect();

    ReconciledDeviceTable(table)
}
