// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The rules each field of a VM description is checked against.

use std::collections::{BTreeMap, BTreeSet};

use pve_validators::{
    rules, Diagnostics, FieldPath, ValidationErrorKind, Validator, Value,
};

fn string(value: &Value, path: &FieldPath) -> Diagnostics {
    if value.is_str() {
        Diagnostics::new()
    } else {
        Diagnostics::type_mismatch(path, "string", value)
    }
}

/// A nested block: either a single table or a list of tables.
struct Block {
    list: bool,
    schema: Schema,
}

/// Maps field names to the rules their values must pass. Fields without a
/// rule are not checked here and are left to deserialization.
#[derive(Default)]
pub struct Schema {
    fields: BTreeMap<&'static str, Box<dyn Validator>>,
    required: BTreeSet<&'static str>,
    blocks: BTreeMap<&'static str, Block>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field<V: Validator + 'static>(
        mut self,
        name: &'static str,
        rule: V,
    ) -> Self {
        self.fields.insert(name, Box::new(rule));
        self
    }

    /// As [`Schema::field`], but the field must be present.
    pub fn required<V: Validator + 'static>(
        mut self,
        name: &'static str,
        rule: V,
    ) -> Self {
        self.required.insert(name);
        self.field(name, rule)
    }

    /// Adds a block that appears at most once, e.g. `[cpu]`.
    pub fn block(mut self, name: &'static str, schema: Schema) -> Self {
        self.blocks.insert(name, Block { list: false, schema });
        self
    }

    /// Adds a block that may repeat, e.g. `[[disk]]`.
    pub fn list_block(mut self, name: &'static str, schema: Schema) -> Self {
        self.blocks.insert(name, Block { list: true, schema });
        self
    }

    /// The rules for a VM description.
    pub fn vm() -> Self {
        Schema::new()
            .required("node_name", string)
            .field("name", string)
            .field("vm_id", rules::vm_id())
            .field("bios", rules::bios())
            .field("keyboard_layout", rules::keyboard_layout())
            .field("timeout_start_vm", rules::timeout())
            .field("timeout_shutdown_vm", rules::timeout())
            .block(
                "cpu",
                Schema::new()
                    .field("type", rules::cpu_type())
                    .field("flags", rules::cpu_flags()),
            )
            .block(
                "vga",
                Schema::new()
                    .field("type", rules::vga_type())
                    .field("memory", rules::vga_memory()),
            )
            .block("agent", Schema::new().field("type", rules::agent_type()))
            .block(
                "initialization",
                Schema::new().field("type", rules::cloud_init_type()),
            )
            .list_block(
                "disk",
                Schema::new()
                    .required("interface", string)
                    .field("file_id", rules::file_id())
                    .field("datastore_id", string)
                    .field("size", rules::disk_size())
                    .field("file_format", rules::file_format()),
            )
            .list_block(
                "network_device",
                Schema::new()
                    .field("model", rules::network_device_model())
                    .field("mac_address", rules::mac_address())
                    .field("vlan_ids", rules::vlan_ids())
                    .field("bridge", string),
            )
            .list_block(
                "file",
                Schema::new()
                    .field("content_type", rules::content_type())
                    .required("datastore_id", string)
                    .required("source", string),
            )
    }

    /// Checks every declared field of `table`, found at `path`, gathering all
    /// of the failures rather than stopping at the first.
    pub fn validate(
        &self,
        table: &toml::Table,
        path: &FieldPath,
    ) -> Diagnostics {
        let mut diags = Diagnostics::new();

        for (name, rule) in self.fields.iter() {
            match table.get(*name) {
                Some(value) => {
                    diags.merge(rule.validate(value, &path.key(*name)))
                }
                None if self.required.contains(name) => diags.merge(
                    Diagnostics::error(
                        &path.key(*name),
                        ValidationErrorKind::Missing,
                    ),
                ),
                None => {}
            }
        }

        for (name, block) in self.blocks.iter() {
            let Some(value) = table.get(*name) else {
                continue;
            };
            let block_path = path.key(*name);

            match (block.list, value) {
                (true, Value::Array(items)) => {
                    for (i, item) in items.iter().enumerate() {
                        diags.merge(
                            block.schema.validate_block(item, &block_path.index(i)),
                        );
                    }
                }
                (true, _) => {
                    diags.merge(Diagnostics::type_mismatch(
                        &block_path,
                        "array",
                        value,
                    ));
                }
                (false, _) => {
                    diags.merge(block.schema.validate_block(value, &block_path))
                }
            }
        }

        diags
    }

    fn validate_block(&self, value: &Value, path: &FieldPath) -> Diagnostics {
        match value.as_table() {
            Some(table) => self.validate(table, path),
            None => Diagnostics::type_mismatch(path, "table", value),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn table(raw: &str) -> toml::Table {
        toml::from_str(raw).unwrap()
    }

    fn failed_paths(diags: &Diagnostics) -> Vec<String> {
        diags.errors.iter().map(|e| e.path.to_string()).collect()
    }

    #[test]
    fn valid_description_passes() {
        let raw = r#"
node_name = "pve1"
vm_id = 101
bios = "seabios"

[cpu]
type = "host"
flags = ["+aes"]

[[disk]]
interface = "scsi0"
size = "8G"

[[network_device]]
mac_address = "A0:B1:C2:D3:E4:F5"
vlan_ids = [10, -1]
"#;
        let diags = Schema::vm().validate(&table(raw), &FieldPath::root());
        assert!(diags.is_ok(), "{}", diags);
    }

    #[test]
    fn all_failures_are_reported_with_paths() {
        let raw = r#"
node_name = "pve1"
vm_id = 99
bios = "uefi"

[vga]
memory = 1024

[[disk]]
interface = "scsi0"
size = "8G"

[[disk]]
interface = "scsi1"
size = "8X"
file_id = "nowhere"

[[network_device]]
mac_address = "a0:b1:c2:d3:e4:f5"
vlan_ids = [0, 10, 4095]
"#;
        let diags = Schema::vm().validate(&table(raw), &FieldPath::root());
        let mut failed = failed_paths(&diags);
        failed.sort();
        assert_eq!(
            failed,
            vec![
                "bios",
                "disk[1].file_id",
                "disk[1].size",
                "network_device[0].mac_address",
                "network_device[0].vlan_ids[0]",
                "network_device[0].vlan_ids[2]",
                "vga.memory",
                "vm_id",
            ]
        );
    }

    #[test]
    fn wrong_kinds_are_type_mismatches() {
        let raw = r#"
node_name = 7
disk = "scsi0"

[[network_device]]
vlan_ids = 10
"#;
        let diags = Schema::vm().validate(&table(raw), &FieldPath::root());
        assert_eq!(diags.errors.len(), 3);
        assert!(diags.errors.iter().all(|e| matches!(
            e.kind,
            ValidationErrorKind::TypeMismatch { .. }
        )));
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let raw = r#"
vm_id = 101

[[disk]]
file_id = "local:iso/x.img"

[[disk]]
interface = "scsi1"

[[file]]
datastore_id = "local"
"#;
        let diags = Schema::vm().validate(&table(raw), &FieldPath::root());
        assert!(diags
            .errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::Missing));
        let mut failed = failed_paths(&diags);
        failed.sort();
        assert_eq!(
            failed,
            vec!["disk[0].interface", "file[0].source", "node_name"]
        );
    }

    #[test]
    fn unknown_fields_are_not_checked() {
        let raw = r#"
node_name = "pve1"
description = 12
"#;
        let diags = Schema::vm().validate(&table(raw), &FieldPath::root());
        assert!(diags.is_ok());
    }
}
