//! ocppnet networking node (line relay)
//!
//! Reads `<peer-id> <ocpp-j frame>` lines from stdin, runs each CALL through
//! the forwarding pipeline and prints what would go on the wire:
//! - `relay <destination> <path> <frame>`
//! - `reply <peer-id> <frame>`
//! - `discard <peer-id>`
//! - `passthrough <peer-id> <frame>`

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use ocppnet_core::protocol::NetworkingNodeId;
use ocppnet_node::{config, forwarding::CancelSignal, transport::Outbound, NetworkingNode};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "ocppnet.yaml".into());
    let node = match config::load_from_file(&path).and_then(NetworkingNode::new) {
        Ok(node) => node,
        Err(e) => {
            tracing::error!(config = %path, error = %e, "node startup failed");
            std::process::exit(1);
        }
    };

    tracing::info!(node = %node.id(), "ocppnet-node starting");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let cancel = CancelSignal::never();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            }
        };
        let Some((peer, frame)) = line.trim().split_once(' ') else {
            if !line.trim().is_empty() {
                tracing::warn!(line = %line, "expected `<peer-id> <frame>`");
            }
            continue;
        };

        let conn = node.connection(peer, NetworkingNodeId::new(peer));
        match node.handle_frame(frame, &conn, &cancel).await {
            Outbound::Relay { destination, network_path, frame, .. } => {
                println!("relay {destination} {network_path} {}", frame.to_text());
            }
            Outbound::Reply(frame) => println!("reply {peer} {}", frame.to_text()),
            Outbound::Discard => println!("discard {peer}"),
            Outbound::Passthrough(frame) => println!("passthrough {peer} {}", frame.to_text()),
        }
    }

    tracing::info!(metrics = %node.metrics().render(), "ocppnet-node stopped");
}
