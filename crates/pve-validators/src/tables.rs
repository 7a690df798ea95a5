// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed value tables accepted by the platform.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

const BIOS: &[&str] = &["ovmf", "seabios"];

const CONTENT_TYPES: &[&str] = &["backup", "iso", "snippets", "vztmpl"];

const CPU_TYPES: &[&str] = &[
    "486",
    "Broadwell",
    "Broadwell-IBRS",
    "Broadwell-noTSX",
    "Broadwell-noTSX-IBRS",
    "Cascadelake-Server",
    "Conroe",
    "EPYC",
    "EPYC-IBPB",
    "EPYC-Rome",
    "Haswell",
    "Haswell-IBRS",
    "Haswell-noTSX",
    "Haswell-noTSX-IBRS",
    "Icelake-Client",
    "Icelake-Server",
    "IvyBridge",
    "IvyBridge-IBRS",
    "KnightsMill",
    "Nehalem",
    "Nehalem-IBRS",
    "Opteron_G1",
    "Opteron_G2",
    "Opteron_G3",
    "Opteron_G4",
    "Opteron_G5",
    "Penryn",
    "SandyBridge",
    "SandyBridge-IBRS",
    "Skylake-Client",
    "Skylake-Client-IBRS",
    "Skylake-Server",
    "Skylake-Server-IBRS",
    "Westmere",
    "Westmere-IBRS",
    "athlon",
    "core2duo",
    "coreduo",
    "host",
    "kvm32",
    "kvm64",
    "max",
    "pentium",
    "pentium2",
    "pentium3",
    "phenom",
    "qemu32",
    "qemu64",
    "x86-64-v2",
    "x86-64-v2-AES",
    "x86-64-v3",
    "x86-64-v4",
];

const CPU_FLAGS: &[&str] = &[
    "+aes",
    "-aes",
    "+amd-no-ssb",
    "-amd-no-ssb",
    "+amd-ssbd",
    "-amd-ssbd",
    "+hv-evmcs",
    "-hv-evmcs",
    "+hv-tlbflush",
    "-hv-tlbflush",
    "+ibpb",
    "-ibpb",
    "+md-clear",
    "-md-clear",
    "+pcid",
    "-pcid",
    "+pdpe1gb",
    "-pdpe1gb",
    "+spec-ctrl",
    "-spec-ctrl",
    "+ssbd",
    "-ssbd",
    "+virt-ssbd",
    "-virt-ssbd",
];

const FILE_FORMATS: &[&str] = &["qcow2", "raw", "vmdk"];

const KEYBOARD_LAYOUTS: &[&str] = &[
    "da", "de", "de-ch", "en-gb", "en-us", "es", "fi", "fr", "fr-be", "fr-ca",
    "fr-ch", "hu", "is", "it", "ja", "lt", "mk", "nl", "no", "pl", "pt",
    "pt-br", "sl", "sv", "tr",
];

const NETWORK_DEVICE_MODELS: &[&str] =
    &["e1000", "rtl8139", "virtio", "vmxnet3"];

const AGENT_TYPES: &[&str] = &["isa", "virtio"];

const CLOUD_INIT_TYPES: &[&str] = &["configdrive2", "nocloud"];

const VGA_TYPES: &[&str] = &[
    "cirrus", "qxl", "qxl2", "qxl3", "qxl4", "serial0", "serial1", "serial2",
    "serial3", "std", "virtio", "vmware",
];

fn set_of(values: &'static [&'static str]) -> BTreeSet<&'static str> {
    values.iter().copied().collect()
}

lazy_static! {
    pub static ref BIOS_TYPE_SET: BTreeSet<&'static str> = set_of(BIOS);
    pub static ref CONTENT_TYPE_SET: BTreeSet<&'static str> =
        set_of(CONTENT_TYPES);
    pub static ref CPU_TYPE_SET: BTreeSet<&'static str> = set_of(CPU_TYPES);

    /// CPU flags, each in its enabling (`+`) and disabling (`-`) form.
    pub static ref CPU_FLAG_SET: BTreeSet<&'static str> = set_of(CPU_FLAGS);

    pub static ref FILE_FORMAT_SET: BTreeSet<&'static str> =
        set_of(FILE_FORMATS);
    pub static ref KEYBOARD_LAYOUT_SET: BTreeSet<&'static str> =
        set_of(KEYBOARD_LAYOUTS);
    pub static ref NETWORK_DEVICE_MODEL_SET: BTreeSet<&'static str> =
        set_of(NETWORK_DEVICE_MODELS);
    pub static ref AGENT_TYPE_SET: BTreeSet<&'static str> =
        set_of(AGENT_TYPES);
    pub static ref CLOUD_INIT_TYPE_SET: BTreeSet<&'static str> =
        set_of(CLOUD_INIT_TYPES);
    pub static ref VGA_TYPE_SET: BTreeSet<&'static str> = set_of(VGA_TYPES);

    /// `<store>:[<subpath>/]<name>`; the store and subpath ignore case.
    pub static ref FILE_ID_REGEX: Regex =
        Regex::new(r"^(?i:[a-z0-9\-_]+:([a-z0-9\-_]+/)?).+$")
            .expect("Failed to compile regex");

    /// Six colon-separated pairs of uppercase hex digits.
    pub static ref MAC_ADDRESS_REGEX: Regex =
        Regex::new(r"^[0-9A-F]{2}(:[0-9A-F]{2}){5}$")
            .expect("Failed to compile regex");
}
