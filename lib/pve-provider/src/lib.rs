// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Provider core: reconciles declared disks against the devices a VM
//! actually has, and reads node state through a [`NodeApi`].

use thiserror::Error;

pub use pve_client::NodeApi;

mod disks;
mod network;

pub use disks::{reconcile_disks, ReconciledDeviceTable};
pub use network::{fetch_snapshot, list_networks};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] pve_client::Error),

    /// The server answered, but not with the shape the API promises.
    #[error("{0}")]
    Protocol(String),
}

pub(crate) const NO_DATA_OBJECT: &str =
    "server did not include a data object in the response";
