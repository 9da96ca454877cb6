//! Chain demo - a core, a relay satellite and an end satellite.
//!
//! This example demonstrates:
//! - Building transports over in-memory links standing in for UARTs
//! - A relay node forwarding downstream traffic toward the core
//! - Discovery, status and power telemetry through the network manager
//!
//! ```text
//! core <──> relay (0101) <──> satellite (0102)
//! ```
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=satlink=debug,chain=info cargo run --example chain
//! ```

use std::sync::Arc;
use std::time::Duration;

use satlink::network::{NetworkEvent, SatelliteNetworkManager};
use satlink::protocol::{commands, destinations};
use satlink::transport::Link;
use satlink::{Message, Transport};
use tokio::io::duplex;
use tracing::{info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

/// Id following the one in an `ID_ASSIGN` payload (`TTII`).
fn next_id(assignment: &str) -> Option<String> {
    let kind: u16 = assignment.get(..2)?.parse().ok()?;
    let index: u16 = assignment.get(2..4)?.parse().ok()?;
    Some(format!("{:02}{:02}", kind, index + 1))
}

/// Minimal satellite firmware: wait for an id, announce, then report.
async fn run_satellite(node: Transport, kind: &'static str) -> satlink::Result<()> {
    let id = loop {
        let Some(msg) = node.receive().await else {
            return Ok(());
        };
        if msg.command() != commands::ID_ASSIGN {
            continue;
        }
        let Some(id) = next_id(&msg.payload().to_string()) else {
            continue;
        };
        // Pass the assignment on down the chain
        if node.is_relay() {
            let forward = Message::new(destinations::ALL, commands::ID_ASSIGN, id.as_str());
            node.send_downstream(&forward).await?;
        }
        break id;
    };

    info!(%id, kind, "id assigned");
    let hello = Message::new(id.as_str(), commands::HELLO, kind);
    node.send(&hello).await?;

    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    let mut tick = 0u8;
    loop {
        ticker.tick().await;
        let status = Message::new(id.as_str(), commands::STATUS, format!("{},1,0", tick % 4));
        node.send(&status).await?;
        let power = Message::new(id.as_str(), commands::POWER, "12.1,5.02,3.3");
        node.send(&power).await?;
        tick = tick.wrapping_add(1);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (core_io, relay_up) = duplex(256);
    let (relay_down, satellite_up) = duplex(256);

    let core = Arc::new(
        Transport::builder(Link::new(core_io))
            .span(info_span!("core"))
            .build(),
    );
    let relay = Transport::builder(Link::new(relay_up))
        .downstream(Link::new(relay_down))
        .span(info_span!("relay"))
        .build();
    let satellite = Transport::builder(Link::new(satellite_up))
        .span(info_span!("satellite"))
        .build();

    tokio::spawn(run_satellite(relay, "INDUSTRIAL").instrument(info_span!("relay")));
    tokio::spawn(run_satellite(satellite, "EXPANSION").instrument(info_span!("satellite")));

    let mut network = SatelliteNetworkManager::builder(core)
        .status_hook(|event: NetworkEvent| async move {
            info!("{}", event);
        })
        .span(info_span!("network"))
        .build();

    network.discover_satellites().await?;
    let _ = tokio::time::timeout(Duration::from_millis(2500), network.monitor_satellites()).await;

    for sat in network.satellites() {
        info!(
            id = sat.id(),
            kind = sat.kind(),
            active = sat.is_active(),
            status = ?sat.status(),
            telemetry = ?network.telemetry(sat.id()),
            "satellite"
        );
    }

    Ok(())
}
