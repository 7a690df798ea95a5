// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fundamental types shared by the provider crates.
//!
//! The disk slot namespace and the device descriptors exchanged between the
//! configuration and provider crates.

use std::fmt::Display;
use std::io::{Error, ErrorKind};
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

mod device;

pub use device::{DeviceDescriptor, DeviceSnapshot, DiskDeclaration};

/// A storage bus a virtual disk can be attached to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum DiskBus {
    Ide,
    Sata,
    Scsi,
    Virtio,
}

impl DiskBus {
    /// Every bus, in slot table order.
    pub const ALL: [DiskBus; 4] =
        [DiskBus::Ide, DiskBus::Sata, DiskBus::Scsi, DiskBus::Virtio];

    /// The number of device slots the platform exposes on this bus.
    pub const fn slot_count(self) -> u8 {
        match self {
            DiskBus::Ide => 3,
            DiskBus::Sata => 6,
            DiskBus::Scsi => 14,
            DiskBus::Virtio => 16,
        }
    }

    /// The bus name as it appears at the front of a slot name.
    pub const fn prefix(self) -> &'static str {
        match self {
            DiskBus::Ide => "ide",
            DiskBus::Sata => "sata",
            DiskBus::Scsi => "scsi",
            DiskBus::Virtio => "virtio",
        }
    }
}

impl Display for DiskBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

const fn total_slot_count() -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < DiskBus::ALL.len() {
        total += DiskBus::ALL[i].slot_count() as usize;
        i += 1;
    }
    total
}

/// The size of the fixed slot universe.
pub const SLOT_COUNT: usize = total_slot_count();

const _: () = assert!(SLOT_COUNT == 39);

/// A disk slot: a bus and an index on that bus. Supports conversion from a
/// string formatted as "<bus><index>", e.g. "scsi2".
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct DiskSlot {
    bus: DiskBus,
    index: u8,
}

impl DiskSlot {
    /// Every slot the platform can address, ordered by bus and then index.
    pub const ALL: [DiskSlot; SLOT_COUNT] = {
        let mut slots = [DiskSlot { bus: DiskBus::Ide, index: 0 }; SLOT_COUNT];
        let mut n = 0;
        let mut b = 0;
        while b < DiskBus::ALL.len() {
            let bus = DiskBus::ALL[b];
            let mut index = 0;
            while index < bus.slot_count() {
                slots[n] = DiskSlot { bus, index };
                n += 1;
                index += 1;
            }
            b += 1;
        }
        slots
    };

    pub fn new(bus: DiskBus, index: u8) -> Result<Self, std::io::Error> {
        if index >= bus.slot_count() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!(
                    "{} index {} outside range of 0-{}",
                    bus,
                    index,
                    bus.slot_count() - 1
                ),
            ));
        }

        Ok(Self { bus, index })
    }

    #[inline]
    pub fn bus(&self) -> DiskBus {
        self.bus
    }

    #[inline]
    pub fn index(&self) -> u8 {
        self.index
    }
}

impl FromStr for DiskSlot {
    type Err = std::io::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (bus, digits) = DiskBus::ALL
            .iter()
            .find_map(|bus| s.strip_prefix(bus.prefix()).map(|d| (*bus, d)))
            .ok_or_else(|| {
                Self::Err::new(
                    ErrorKind::InvalidInput,
                    format!("Unknown bus in disk slot {}", s),
                )
            })?;

        // Slot names are canonical: no sign, no leading zeros.
        let canonical = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && (digits.len() == 1 || !digits.starts_with('0'));
        if !canonical {
            return Err(Self::Err::new(
                ErrorKind::InvalidInput,
                format!("Expected a slot index in disk slot {}", s),
            ));
        }

        let index = u8::from_str(digits).map_err(|e| {
            Self::Err::new(
                ErrorKind::InvalidInput,
                format!("Failed to parse disk slot {}: {}", s, e),
            )
        })?;

        Self::new(bus, index)
    }
}

impl Display for DiskSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.bus.prefix(), self.index)
    }
}

impl Serialize for DiskSlot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(format!("{}", self).as_str())
    }
}

// Described by its string form, which is what serialization produces.
impl JsonSchema for DiskSlot {
    fn schema_name() -> String {
        "DiskSlot".to_owned()
    }

    fn json_schema(
        gen: &mut schemars::gen::SchemaGenerator,
    ) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

impl<'d> Deserialize<'d> for DiskSlot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'d>,
    {
        let s = String::deserialize(deserializer)?;
        FromStr::from_str(&s).map_err(de::Error::custom)
    }
}
