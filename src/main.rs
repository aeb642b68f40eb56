//! `isis-metrics-collector`: a standalone demo CLI exercising the collector
//! against in-process fake `NodeExec`/`HandoverBus`/`PeerLookup`
//! implementations, the way `trix`'s various `[[bin]]` targets run against
//! recorded data rather than a live lab.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::time::Duration;

use isis_metrics_collector::bus::HandoverNotification;
use isis_metrics_collector::clock::ZeroClock;
use isis_metrics_collector::config::CollectorConfig;
use isis_metrics_collector::export::default_export_filename;
use isis_metrics_collector::gateway::Gateway;
use isis_metrics_collector::lifecycle::Collector;
use isis_metrics_collector::node::{NodeId, NodeInventory};
use isis_metrics_collector::testkit::{ChannelHandoverBus, FixedPeerLookup, ScriptedNodeExec, ScriptedProbe};

#[derive(Parser)]
#[command(name = "isis-metrics-collector", about = "ISIS routing metrics collector demo CLI")]
struct Cli {
    /// Optional TOML file with CollectorConfig overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Starts the collector against a small scripted demo topology.
    Start,
    /// Stops the collector after the demo run.
    Stop,
    /// Prints the current status.
    Status,
    /// Exports the collected metrics to a JSON file.
    Export {
        /// Destination path; defaults to `isis_metrics_<timestamp>.json`.
        path: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> CollectorConfig {
    match path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => CollectorConfig::from_toml_str(&text).unwrap_or_else(|err| {
                eprintln!("invalid config at {}: {err}, using defaults", path.display());
                CollectorConfig::default()
            }),
            Err(err) => {
                eprintln!("could not read config at {}: {err}, using defaults", path.display());
                CollectorConfig::default()
            }
        },
        None => CollectorConfig::default(),
    }
}

async fn demo_node_exec() -> ScriptedNodeExec {
    let exec = ScriptedNodeExec::new();
    exec.set(&NodeId::satellite(0), "show isis neighbor", "sat1 eth0 2 Up 26 aaaa").await;
    exec.set(&NodeId::satellite(0), "show isis spf-log", "   1    00:00:10 ago  topology change").await;
    exec.set(
        &NodeId::satellite(0),
        "show isis database",
        "sat0.00-00 * 452 0x00000005 0xabcd 720 0/0/0",
    )
    .await;
    exec.set(&NodeId::ground_station("gs0"), "show isis neighbor", "sat0 eth0 2 Up 26 aaaa").await;
    exec.set(&NodeId::ground_station("gs0"), "show ip route isis", "I 10.0.2.0/30 [115/20] via 10.0.1.2").await;
    exec
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    isis_metrics_collector::logging::init_logging(Some("log4rs.yml"));

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    let gateway = Gateway::new(demo_node_exec().await, Duration::from_secs_f64(config.command_timeout_s));
    let (bus, sender) = ChannelHandoverBus::new();
    let peer_lookup = FixedPeerLookup(None);
    let probe = ScriptedProbe::new(vec![true]);
    let clock = ZeroClock;
    let inventory = NodeInventory::new(vec![0, 1, 2, 3], vec!["gs0".to_string()]);

    let collector = Arc::new(Collector::new(gateway, bus, peer_lookup, Some(probe), clock, inventory, config));

    match cli.command {
        Command::Start => {
            collector.start().await?;
            let _ = sender.send(HandoverNotification::Connect { gs_id: "gs0".into(), sat_id: 0, sim_time_s: 0.0 });
            tokio::time::sleep(Duration::from_secs(2)).await;
            println!("collector running with demo topology");
        }
        Command::Stop => {
            collector.start().await?;
            collector.stop().await;
            println!("collector stopped");
        }
        Command::Status => {
            collector.start().await?;
            let status = collector.status().await;
            println!("{status:#?}");
        }
        Command::Export { path } => {
            collector.start().await?;
            tokio::time::sleep(Duration::from_millis(500)).await;
            collector.stop().await;
            let export_time = Utc::now();
            let path = path.unwrap_or_else(|| PathBuf::from(default_export_filename(&export_time)));
            collector.export(path.clone(), export_time.to_rfc3339()).await?;
            println!("metrics exported to {}", path.display());
        }
    }

    Ok(())
}
