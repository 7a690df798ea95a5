// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The named rules applied to VM configuration fields.

use crate::combinators::{
    int_between, int_between_or, list_of, matches, one_of, IntBetween, ListOf,
    Matches, OneOf,
};
use crate::{size, tables};
use crate::{Diagnostics, FieldPath, ValidationErrorKind, Validator, Value};

/// The VM ID the platform assigns when none is given.
pub const VM_ID_AUTO: i64 = -1;

/// The VLAN ID meaning "untagged".
pub const VLAN_ID_NONE: i64 = -1;

pub const VM_ID_MIN: i64 = 100;
pub const VM_ID_MAX: i64 = 2147483647;

pub fn bios() -> OneOf {
    one_of(&tables::BIOS_TYPE_SET)
}

pub fn content_type() -> OneOf {
    one_of(&tables::CONTENT_TYPE_SET)
}

pub fn cpu_type() -> OneOf {
    one_of(&tables::CPU_TYPE_SET)
}

pub fn cpu_flags() -> ListOf<OneOf> {
    list_of(one_of(&tables::CPU_FLAG_SET))
}

pub fn file_format() -> OneOf {
    one_of(&tables::FILE_FORMAT_SET)
}

pub fn keyboard_layout() -> OneOf {
    one_of(&tables::KEYBOARD_LAYOUT_SET)
}

pub fn network_device_model() -> OneOf {
    one_of(&tables::NETWORK_DEVICE_MODEL_SET)
}

pub fn agent_type() -> OneOf {
    one_of(&tables::AGENT_TYPE_SET)
}

pub fn cloud_init_type() -> OneOf {
    one_of(&tables::CLOUD_INIT_TYPE_SET)
}

pub fn vga_type() -> OneOf {
    one_of(&tables::VGA_TYPE_SET)
}

/// An empty file ID means none is set.
pub fn file_id() -> Matches {
    matches(&tables::FILE_ID_REGEX, "a file ID (<store>:[<subpath>/]<name>)")
        .or_empty()
}

/// MAC addresses must already be uppercase; lowercase input is rejected
/// rather than normalized. An empty address lets the platform pick one.
pub fn mac_address() -> Matches {
    matches(
        &tables::MAC_ADDRESS_REGEX,
        "a MAC address in the form XX:XX:XX:XX:XX:XX",
    )
    .or_empty()
}

pub fn vm_id() -> IntBetween {
    int_between_or(VM_ID_MIN, VM_ID_MAX, VM_ID_AUTO)
}

pub fn vlan_ids() -> ListOf<IntBetween> {
    list_of(int_between_or(1, 4094, VLAN_ID_NONE))
}

pub fn vga_memory() -> IntBetween {
    int_between(4, 512)
}

/// Accepts a duration in `humantime` syntax: whole numbers with unit
/// suffixes, optionally space separated, such as `30s`, `1500ms` or `1h 30m`.
/// Fractional (`1.5h`) and negative (`-30s`) amounts are rejected, and a bare
/// number like `30` needs a unit.
#[derive(Clone, Copy, Debug)]
pub struct Timeout;

pub fn timeout() -> Timeout {
    Timeout
}

impl Validator for Timeout {
    fn validate(&self, value: &Value, path: &FieldPath) -> Diagnostics {
        let Some(s) = value.as_str() else {
            return Diagnostics::type_mismatch(path, "string", value);
        };

        match humantime::parse_duration(s) {
            Ok(_) => Diagnostics::new(),
            Err(e) => Diagnostics::error(
                path,
                ValidationErrorKind::Parse(format!(
                    "cannot parse duration {:?}: {}",
                    s, e
                )),
            ),
        }
    }
}

/// Accepts a size string the size parser understands.
#[derive(Clone, Copy, Debug)]
pub struct DiskSize;

pub fn disk_size() -> DiskSize {
    DiskSize
}

impl Validator for DiskSize {
    fn validate(&self, value: &Value, path: &FieldPath) -> Diagnostics {
        let Some(s) = value.as_str() else {
            return Diagnostics::type_mismatch(path, "string", value);
        };

        match size::parse_size(Some(s)) {
            Ok(_) => Diagnostics::new(),
            Err(e) => Diagnostics::error(
                path,
                ValidationErrorKind::Parse(e.to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn int_list(values: &[i64]) -> Value {
        Value::Array(values.iter().copied().map(Value::Integer).collect())
    }

    fn kinds(diags: &Diagnostics) -> Vec<&ValidationErrorKind> {
        diags.errors.iter().map(|e| &e.kind).collect()
    }

    #[test]
    fn vm_id_range_and_sentinel() {
        let path = FieldPath::from("vm_id");
        for (v, ok) in [
            (100, true),
            (99, false),
            (-1, true),
            (-2, false),
            (0, false),
            (2147483647, true),
            (2147483648, false),
        ] {
            let diags = vm_id().validate(&Value::Integer(v), &path);
            assert_eq!(diags.is_ok(), ok, "vm_id {}", v);
        }

        let diags = vm_id().validate(&Value::Integer(99), &path);
        assert_eq!(
            kinds(&diags),
            vec![&ValidationErrorKind::Range {
                min: 100,
                max: 2147483647,
                value: 99
            }]
        );
    }

    #[test]
    fn vlan_ids_per_element() {
        let path = FieldPath::from("vlan_ids");
        assert!(vlan_ids().validate(&int_list(&[1, 4094, -1]), &path).is_ok());

        for bad in [0, 4095] {
            let diags = vlan_ids().validate(&int_list(&[bad]), &path);
            assert!(matches!(
                kinds(&diags)[..],
                [ValidationErrorKind::Range { .. }]
            ));
            assert_eq!(diags.errors[0].path.to_string(), "vlan_ids[0]");
        }

        // Every failing element is reported, not just the first.
        let diags = vlan_ids().validate(&int_list(&[0, 10, 5000]), &path);
        assert_eq!(diags.errors.len(), 2);
        assert_eq!(diags.errors[1].path.to_string(), "vlan_ids[2]");
    }

    #[test]
    fn vlan_ids_must_be_a_list() {
        let diags =
            vlan_ids().validate(&Value::Integer(10), &"vlan_ids".into());
        assert!(matches!(
            kinds(&diags)[..],
            [ValidationErrorKind::TypeMismatch { expected: "array", .. }]
        ));
    }

    #[test]
    fn mac_address_requires_uppercase() {
        let path = FieldPath::from("mac_address");
        assert!(mac_address()
            .validate(&Value::from("A0:B1:C2:D3:E4:F5"), &path)
            .is_ok());
        assert!(mac_address().validate(&Value::from(""), &path).is_ok());

        for bad in [
            "a0:b1:c2:d3:e4:f5",
            "A0:B1:C2:D3:E4",
            "A0-B1-C2-D3-E4-F5",
            "G0:B1:C2:D3:E4:F5",
            "A0:B1:C2:D3:E4:F5:00",
        ] {
            let diags = mac_address().validate(&Value::from(bad), &path);
            assert!(
                matches!(
                    kinds(&diags)[..],
                    [ValidationErrorKind::PatternMismatch { .. }]
                ),
                "Expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn file_id_shapes() {
        let path = FieldPath::from("file_id");
        for good in [
            "local:iso/debian.img",
            "LOCAL:ISO/debian.img",
            "nfs-store:backup.vma",
            "local-lvm:vm-100-disk-0",
            "my_store:iso/x.img",
            "local:snippets_2/user.yaml",
            "",
        ] {
            assert!(
                file_id().validate(&Value::from(good), &path).is_ok(),
                "Expected {:?} to be accepted",
                good
            );
        }

        for bad in ["local", "local:", ":iso/x.img", "my store:x.img"] {
            assert!(
                !file_id().validate(&Value::from(bad), &path).is_ok(),
                "Expected {:?} to be rejected",
                bad
            );
        }
    }

    #[test]
    fn membership_rules() {
        let path = FieldPath::root();
        let accepts = |rule: &dyn Validator, v: &str| {
            rule.validate(&Value::from(v), &path).is_ok()
        };

        assert!(accepts(&bios(), "seabios"));
        assert!(!accepts(&bios(), "uefi"));
        assert!(accepts(&content_type(), "snippets"));
        assert!(!accepts(&content_type(), "images"));
        assert!(accepts(&cpu_type(), "x86-64-v2-AES"));
        assert!(accepts(&cpu_type(), "host"));
        assert!(!accepts(&cpu_type(), "Host"));
        assert!(accepts(&file_format(), "qcow2"));
        assert!(!accepts(&file_format(), "vdi"));
        assert!(accepts(&keyboard_layout(), "de-ch"));
        assert!(!accepts(&keyboard_layout(), "en"));
        assert!(accepts(&network_device_model(), "vmxnet3"));
        assert!(!accepts(&network_device_model(), "ne2k_pci"));
        assert!(accepts(&agent_type(), "isa"));
        assert!(!accepts(&agent_type(), "usb"));
        assert!(accepts(&cloud_init_type(), "nocloud"));
        assert!(!accepts(&cloud_init_type(), "NoCloud"));
        assert!(accepts(&vga_type(), "qxl2"));
        assert!(!accepts(&vga_type(), "qxl5"));
    }

    #[test]
    fn cpu_flags_each_checked() {
        let flags = Value::Array(vec![
            Value::from("+aes"),
            Value::from("aes"),
            Value::from("-pcid"),
            Value::from("+bogus"),
        ]);
        let diags = cpu_flags().validate(&flags, &"flags".into());
        let failed: Vec<_> =
            diags.errors.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(failed, vec!["flags[1]", "flags[3]"]);
    }

    #[test]
    fn vga_memory_range() {
        let path = FieldPath::from("memory");
        assert!(vga_memory().validate(&Value::Integer(4), &path).is_ok());
        assert!(vga_memory().validate(&Value::Integer(512), &path).is_ok());
        assert!(!vga_memory().validate(&Value::Integer(2), &path).is_ok());
    }

    #[test]
    fn timeout_must_parse() {
        let path = FieldPath::from("timeout");
        for good in ["30s", "5m", "1h 30m", "1500ms"] {
            assert!(
                timeout().validate(&Value::from(good), &path).is_ok(),
                "Expected {:?} to parse",
                good
            );
        }

        for bad in ["thirty", "30x", "", "1.5h", "-30s", "30"] {
            let diags = timeout().validate(&Value::from(bad), &path);
            assert!(
                matches!(kinds(&diags)[..], [ValidationErrorKind::Parse(_)]),
                "Expected {:?} to be rejected",
                bad
            );
        }

        let diags = timeout().validate(&Value::Integer(30), &path);
        assert!(matches!(
            kinds(&diags)[..],
            [ValidationErrorKind::TypeMismatch { .. }]
        ));
    }

    #[test]
    fn disk_size_uses_size_parser() {
        let path = FieldPath::from("size");
        assert!(disk_size().validate(&Value::from("8G"), &path).is_ok());
        assert!(disk_size().validate(&Value::from("512M"), &path).is_ok());

        let diags = disk_size().validate(&Value::from("5X"), &path);
        assert!(matches!(kinds(&diags)[..], [ValidationErrorKind::Parse(_)]));
    }
}
