// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::borrow::Cow;
use std::path::Path;
use std::str::FromStr;

use pve_types::DiskDeclaration;
use pve_validators::{Diagnostics, FieldPath};
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;

pub mod schema;

pub use schema::Schema;

fn vm_id_auto() -> i64 {
    pve_validators::rules::VM_ID_AUTO
}

/// Description of a single VM.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Config {
    pub node_name: String,

    #[serde(default = "vm_id_auto")]
    pub vm_id: i64,

    pub name: Option<String>,
    pub bios: Option<String>,
    pub keyboard_layout: Option<String>,
    pub timeout_start_vm: Option<String>,
    pub timeout_shutdown_vm: Option<String>,

    pub cpu: Option<Cpu>,
    pub vga: Option<Vga>,
    pub agent: Option<Agent>,
    pub initialization: Option<Initialization>,

    #[serde(default, rename = "disk")]
    pub disks: Vec<DiskDeclaration>,

    #[serde(default, rename = "network_device")]
    pub network_devices: Vec<NetworkDevice>,

    #[serde(default, rename = "file")]
    pub files: Vec<File>,
}

impl Config {
    pub fn new<S: Into<String>>(node_name: S) -> Config {
        Config {
            node_name: node_name.into(),
            vm_id: vm_id_auto(),
            name: None,
            bios: None,
            keyboard_layout: None,
            timeout_start_vm: None,
            timeout_shutdown_vm: None,
            cpu: None,
            vga: None,
            agent: None,
            initialization: None,
            disks: Vec::new(),
            network_devices: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Returns the `index`th declared disk.
    pub fn disk(&self, index: usize) -> Result<&DiskDeclaration, ParseError> {
        self.disks.get(index).ok_or_else(|| {
            ParseError::BlockIndexOutOfBounds {
                block: "disk".to_owned(),
                index,
                len: self.disks.len(),
            }
        })
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Cpu {
    #[serde(rename = "type")]
    pub cpu_type: Option<String>,
    #[serde(default)]
    pub flags: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Vga {
    #[serde(rename = "type")]
    pub vga_type: Option<String>,
    pub memory: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Agent {
    #[serde(rename = "type")]
    pub agent_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Initialization {
    #[serde(rename = "type")]
    pub init_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct NetworkDevice {
    pub model: Option<String>,
    pub mac_address: Option<String>,
    pub bridge: Option<String>,
    #[serde(default)]
    pub vlan_ids: Vec<i64>,
}

/// A file to place on a datastore.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct File {
    pub content_type: Option<String>,
    pub datastore_id: String,
    pub source: String,
}

/// Errors which may be returned when parsing a VM description.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Cannot parse toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration:\n{0}")]
    Validation(Diagnostics),

    #[error("Index {index} is out of bounds for block {block} ({len} declared)")]
    BlockIndexOutOfBounds { block: String, index: usize, len: usize },

    #[error("{0} is not a block")]
    NotABlock(String),
}

/// A VM description as written, before it has been checked.
#[derive(Clone, Debug, PartialEq)]
pub struct RawConfig {
    table: toml::Table,
}

impl FromStr for RawConfig {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { table: toml::from_str(s)? })
    }
}

impl RawConfig {
    /// Checks every field against `schema`.
    pub fn validate(&self, schema: &Schema) -> Diagnostics {
        schema.validate(&self.table, &FieldPath::root())
    }

    /// Returns the `index`th table of the block `name`. A block written as a
    /// single table has length one.
    pub fn block(
        &self,
        name: &str,
        index: usize,
    ) -> Result<&toml::Table, ParseError> {
        let out_of_bounds = |len| ParseError::BlockIndexOutOfBounds {
            block: name.to_owned(),
            index,
            len,
        };

        let value = match self.table.get(name) {
            None => return Err(out_of_bounds(0)),
            Some(toml::Value::Table(t)) if index == 0 => return Ok(t),
            Some(toml::Value::Table(_)) => return Err(out_of_bounds(1)),
            Some(toml::Value::Array(items)) => {
                items.get(index).ok_or_else(|| out_of_bounds(items.len()))?
            }
            Some(_) => return Err(ParseError::NotABlock(name.to_owned())),
        };

        value.as_table().ok_or_else(|| {
            ParseError::NotABlock(format!("{}[{}]", name, index))
        })
    }

    /// As [`RawConfig::block`], but a block that was left out entirely reads
    /// as an empty table at index 0.
    pub fn block_or_default(
        &self,
        name: &str,
        index: usize,
    ) -> Result<Cow<'_, toml::Table>, ParseError> {
        if index == 0 && !self.table.contains_key(name) {
            return Ok(Cow::Owned(toml::Table::new()));
        }
        self.block(name, index).map(Cow::Borrowed)
    }

    /// Validates the description against `schema` and, if it passes,
    /// deserializes it. Returns the warnings found alongside the config.
    pub fn into_config(
        self,
        schema: &Schema,
    ) -> Result<(Config, Vec<String>), ParseError> {
        let warnings =
            self.validate(schema).into_result().map_err(ParseError::Validation)?;
        let config = toml::Value::Table(self.table).try_into::<Config>()?;
        Ok((config, warnings))
    }
}

/// Parses and validates a TOML file into a configuration object.
pub fn parse<P: AsRef<Path>>(path: P) -> Result<Config, ParseError> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let (cfg, _warnings) =
        RawConfig::from_str(&contents)?.into_config(&Schema::vm())?;
    Ok(cfg)
}
