// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use pve_client::Client;
use pve_config_toml::{Config, ParseError, RawConfig, Schema};
use pve_validators::rules::VM_ID_AUTO;
use reqwest::Url;
use slog::{o, Drain, Level, Logger};

#[derive(Debug, Parser)]
#[clap(about, version)]
/// Check VM descriptions and inspect a node through its management API
struct Opt {
    /// API endpoint, e.g. https://pve.example.com:8006/api2/json
    #[clap(short, long, action)]
    endpoint: Option<Url>,

    /// Enable debugging
    #[clap(short, long, action)]
    debug: bool,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a VM description, reporting every problem found
    Validate {
        #[clap(action)]
        config: PathBuf,
    },

    /// List a node's network interfaces in priority order
    Networks {
        #[clap(action)]
        node: String,
    },

    /// Reconcile a VM description's disks against the VM's current devices
    Reconcile {
        #[clap(action)]
        config: PathBuf,
    },
}

fn create_logger(opt: &Opt) -> Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let level = if opt.debug { Level::Debug } else { Level::Info };
    let drain = slog::LevelFilter(drain, level).fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Logger::root(drain, o!())
}

fn read_raw_config(path: &Path) -> anyhow::Result<RawConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| anyhow!("failed to read {}", path.display()))?;
    RawConfig::from_str(&contents)
        .with_context(|| anyhow!("failed to parse {}", path.display()))
}

// Runs the same checks and conversion `reconcile` does, discarding the
// converted config.
fn check(raw: RawConfig) -> Result<Vec<String>, ParseError> {
    raw.into_config(&Schema::vm()).map(|(_, warnings)| warnings)
}

fn validate(path: &Path) -> anyhow::Result<()> {
    match check(read_raw_config(path)?) {
        Ok(warnings) => {
            for warning in warnings.iter() {
                eprintln!("warning: {}", warning);
            }
            println!("{} is valid", path.display());
            Ok(())
        }
        Err(ParseError::Validation(diags)) => {
            for warning in diags.warnings.iter() {
                eprintln!("warning: {}", warning);
            }
            for error in diags.errors.iter() {
                eprintln!("error: {}", error);
            }
            bail!("{} has {} error(s)", path.display(), diags.errors.len())
        }
        Err(e) => Err(e).with_context(|| {
            anyhow!("invalid configuration {}", path.display())
        }),
    }
}

fn load_config(path: &Path, log: &Logger) -> anyhow::Result<Config> {
    let (config, warnings) = read_raw_config(path)?
        .into_config(&Schema::vm())
        .with_context(|| anyhow!("invalid configuration {}", path.display()))?;
    for warning in warnings {
        slog::warn!(log, "{}", warning);
    }
    Ok(config)
}

fn client(opt: &Opt, log: &Logger) -> anyhow::Result<Client> {
    let endpoint = opt
        .endpoint
        .clone()
        .ok_or_else(|| anyhow!("this command requires --endpoint"))?;
    Ok(Client::new(endpoint, log.new(o!())))
}

async fn networks(
    client: &Client,
    node: &str,
    log: &Logger,
) -> anyhow::Result<()> {
    let records = pve_provider::list_networks(client, node, log)
        .await
        .with_context(|| anyhow!("failed to list networks on {}", node))?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

async fn reconcile(
    client: &Client,
    path: &Path,
    log: &Logger,
) -> anyhow::Result<()> {
    let config = load_config(path, log)?;
    if config.vm_id == VM_ID_AUTO {
        bail!("{} names no vm_id to reconcile against", path.display());
    }

    let snapshot = pve_provider::fetch_snapshot(
        client,
        &config.node_name,
        config.vm_id,
        log,
    )
    .await
    .with_context(|| {
        anyhow!("failed to fetch VM {} on {}", config.vm_id, config.node_name)
    })?;

    let table = pve_provider::reconcile_disks(&snapshot, &config.disks);
    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    let log = create_logger(&opt);

    match &opt.cmd {
        Command::Validate { config } => validate(config)?,
        Command::Networks { node } => {
            networks(&client(&opt, &log)?, node, &log).await?
        }
        Command::Reconcile { config } => {
            reconcile(&client(&opt, &log)?, config, &log).await?
        }
    }

    Ok(())
}
