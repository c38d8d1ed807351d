use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use groupsync_core::cluster::{ClusterManager, Group, GroupManager, Node};
use groupsync_core::config::{GroupProperties, NodeConfig};
use groupsync_core::events::{BroadcastProducer, SwitchStatus};
use groupsync_core::filter::PropertyAccessFilter;
use groupsync_core::logging::{init_logging_with_config, LogConfig, LogLevel};
use groupsync_core::policy::{PolicyResolution, SyncPolicyResolver};
use groupsync_core::store::MemoryStore;
use groupsync_core::sync::{MemoryResourceAdapter, SyncReport, Synchronizer};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "groupsync")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Set the log level (trace, debug, info, warn, error), overriding the configuration
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging, overriding the configuration
    #[arg(long)]
    json_logs: bool,

    /// Node configuration file; `GROUPSYNC_*` variables are used otherwise
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the sync policy resolved for a group, or for every group in the property file
    Policy {
        /// Group property file (TOML)
        #[arg(long)]
        properties: Option<PathBuf>,

        #[arg(long)]
        group: Option<String>,

        /// Resource category, defaults to the configured one
        #[arg(long)]
        category: Option<String>,
    },

    /// Reconcile local state files with a shared state snapshot
    Sync {
        /// Group property file (TOML)
        #[arg(long)]
        properties: Option<PathBuf>,

        /// Shared state snapshot (JSON), created if missing
        #[arg(long)]
        state: PathBuf,

        /// Local resource manifest (JSON), created if missing
        #[arg(long)]
        local: PathBuf,

        /// Group to sync; every configured local group when omitted
        #[arg(long)]
        group: Option<String>,

        /// Local node as `host:port`, defaults to the configured one
        #[arg(long)]
        node: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Start with the event producer switched off
        #[arg(long)]
        producer_off: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => NodeConfig::from_file(path)
            .with_context(|| format!("loading node configuration from {}", path.display()))?,
        None => NodeConfig::from_env().context("reading GROUPSYNC_* environment")?,
    };

    let mut log_config =
        LogConfig::try_from(&config.logging).context("invalid logging configuration")?;
    if let Some(level) = &args.log_level {
        log_config.level = level
            .parse::<LogLevel>()
            .with_context(|| format!("invalid --log-level '{}'", level))?;
    }
    if args.json_logs {
        log_config = log_config.json_format(true);
    }
    init_logging_with_config(log_config)?;
    groupsync_core::metrics::init_metrics();

    match args.command {
        Command::Policy {
            properties,
            group,
            category,
        } => {
            let props = load_properties(properties.as_ref(), &config)?;
            let category = category.unwrap_or_else(|| config.groups.category.clone());
            let resolver = SyncPolicyResolver::new(props.clone());

            match group {
                Some(name) => {
                    let group = Group::try_new(name)?;
                    let resolution = resolver.resolve(group.name(), &category);
                    println!("{}", serde_json::to_string_pretty(&resolution)?);
                }
                None => {
                    let resolutions: BTreeMap<String, PolicyResolution> = props
                        .groups()?
                        .into_iter()
                        .map(|name| {
                            let resolution = resolver.resolve(&name, &category);
                            (name, resolution)
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&resolutions)?);
                }
            }
        }
        Command::Sync {
            properties,
            state,
            local,
            group,
            node,
            category,
            producer_off,
        } => {
            let props = load_properties(properties.as_ref(), &config)?;
            let category = category.unwrap_or_else(|| config.groups.category.clone());
            let node = match node {
                Some(address) => Node::parse(&address)?,
                None => Node::new(config.node.host.clone(), config.node.port),
            };
            let group = group.map(Group::try_new).transpose()?;

            let store = Arc::new(
                MemoryStore::load_snapshot(&state)
                    .with_context(|| format!("loading shared state from {}", state.display()))?,
            );
            let adapter = Arc::new(
                MemoryResourceAdapter::load_manifest(category.as_str(), &local)
                    .with_context(|| format!("loading local manifest from {}", local.display()))?,
            );

            let status = if producer_off || !config.events.producer_enabled {
                SwitchStatus::Off
            } else {
                SwitchStatus::On
            };
            let producer = Arc::new(BroadcastProducer::new(config.events.capacity, status));

            let synchronizer = Synchronizer::new(
                adapter.clone(),
                store.clone(),
                Arc::new(PropertyAccessFilter::new(props.clone())),
                producer.clone(),
                SyncPolicyResolver::new(props),
                node.clone(),
            );

            let reports: Vec<SyncReport> = match group {
                Some(group) => vec![synchronizer.sync(&group.with_node(node.clone())).await],
                None => {
                    let cluster = Arc::new(ClusterManager::new(node.clone()));
                    let groups = GroupManager::new(cluster, producer);
                    for name in &config.groups.local {
                        groups.join_group(name, node.clone()).await?;
                    }
                    synchronizer.init(&groups).await
                }
            };

            store
                .save_snapshot(&state)
                .await
                .with_context(|| format!("writing shared state to {}", state.display()))?;
            adapter
                .save_manifest(&local)
                .await
                .with_context(|| format!("writing local manifest to {}", local.display()))?;

            info!(node = %node, groups = reports.len(), "sync finished");
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    Ok(())
}

/// Group properties from `--properties` or the configured file; a missing file is an error
fn load_properties(path: Option<&PathBuf>, config: &NodeConfig) -> Result<Arc<GroupProperties>> {
    let path = path
        .or(config.groups.properties_file.as_ref())
        .context("no group property file: pass --properties or set groups.properties_file")?;
    let props = GroupProperties::from_file(path)
        .with_context(|| format!("loading group properties from {}", path.display()))?;
    Ok(Arc::new(props))
}
