//! Node assembly
//!
//! Wires one replica together: the queue actor, the WebSocket listener,
//! seed redialers and (optionally) UDP discovery. Background tasks are
//! owned by the `Node` and aborted when it is dropped.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::Settings;
use crate::display::{DisplayDriver, OscDisplay};
use crate::peer::{LocalPeer, PeerSet};
use crate::queue::{QueueHandle, spawn_queue};
use crate::transport::discovery::run_discovery;
use crate::transport::{Backoff, Endpoint, maintain_seed, start_peer_listener};
use crate::utils::QueueError;

pub struct Node {
    pub queue: QueueHandle,
    pub peers: PeerSet,
    pub local: LocalPeer,
    listen_addr: SocketAddr,
    endpoint: Endpoint,
    backoff: Backoff,
    tasks: Vec<JoinHandle<()>>,
}

impl Node {
    /// Start a node that drives the wall over OSC.
    pub async fn start(settings: &Settings) -> Result<Self, QueueError> {
        let osc = OscDisplay::connect(&settings.display).await?;
        info!("Display output to osc://{}", osc.target());
        Self::start_with_display(settings, Box::new(osc)).await
    }

    pub async fn start_with_display(
        settings: &Settings,
        display: Box<dyn DisplayDriver>,
    ) -> Result<Self, QueueError> {
        let local = LocalPeer::new(settings.node.name.clone());
        let peers = PeerSet::new();
        let (events, peer_events) = mpsc::unbounded_channel();

        let (queue, actor) = spawn_queue(
            &settings.queue,
            Arc::new(peers.clone()),
            display,
            peer_events,
        );
        let mut tasks = vec![actor];

        let listener =
            TcpListener::bind((settings.node.host.as_str(), settings.node.port)).await?;
        let listen_addr = listener.local_addr()?;

        let endpoint = Endpoint {
            local: local.clone(),
            peers: peers.clone(),
            events,
        };
        tasks.push(tokio::spawn(start_peer_listener(listener, endpoint.clone())));

        let backoff = Backoff::from(&settings.transport);
        for seed in &settings.node.seeds {
            tasks.push(tokio::spawn(maintain_seed(
                seed.clone(),
                endpoint.clone(),
                backoff,
            )));
        }

        if settings.discovery.enabled {
            let discovery = settings.discovery.clone();
            let endpoint = endpoint.clone();
            let port = listen_addr.port();
            tasks.push(tokio::spawn(async move {
                if let Err(e) = run_discovery(discovery, port, endpoint).await {
                    error!("Discovery stopped: {e}");
                }
            }));
        }

        info!(
            "Node {} ({}) listening on ws://{listen_addr}",
            local.name, local.id
        );

        Ok(Self {
            queue,
            peers,
            local,
            listen_addr,
            endpoint,
            backoff,
            tasks,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// Keep a link to `url` alive alongside the configured seeds.
    pub fn dial(&mut self, url: impl Into<String>) {
        self.tasks.push(tokio::spawn(maintain_seed(
            url.into(),
            self.endpoint.clone(),
            self.backoff,
        )));
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
