//! peertrade application integrating all components

use crate::config::NodeConfig;
use crate::error::Result;
use crate::interfaces::PeerDirectory;
use crate::layout::WindowLayout;
use crate::negotiation::NegotiationAction;
use crate::node::{Collaborators, TradeNode};
use crate::notify::TracingNotifier;
use crate::p2p::{NetworkEvent, NetworkManager, NetworkMessage, Outbound, OutboundQueue};
use crate::readiness::LocalPeerSignal;
use crate::roster::Roster;
use crate::types::{LocalPeer, PeerID, Position};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Main peertrade application: one node, its transport, and a console
pub struct TradeApp {
    config: NodeConfig,
    local_peer_id: PeerID,
    roster: Arc<Roster>,
    readiness: LocalPeerSignal,
    node: TradeNode,
    network: NetworkManager,
    outbox: mpsc::UnboundedReceiver<Outbound>,
}

impl TradeApp {
    /// Create a new application and start listening
    pub async fn new(config: NodeConfig) -> Result<Self> {
        let local_peer_id = PeerID::generate();
        let name = config.node.name.clone();
        let position = config.node.position();

        let network =
            NetworkManager::new(local_peer_id.clone(), &name, position, config.node.port).await?;

        let roster = Arc::new(Roster::new());
        let readiness = LocalPeerSignal::new();
        let (queue, outbox) = OutboundQueue::new();

        let node = TradeNode::new(
            config.negotiation.clone(),
            &readiness,
            Collaborators {
                directory: roster.clone(),
                channel: Arc::new(queue),
                notifier: Arc::new(TracingNotifier::new(roster.clone())),
                layout: Arc::new(WindowLayout::new()),
            },
        );

        Ok(Self {
            config,
            local_peer_id,
            roster,
            readiness,
            node,
            network,
            outbox,
        })
    }

    pub fn local_peer_id(&self) -> &PeerID {
        &self.local_peer_id
    }

    pub fn listen_addr(&self) -> &str {
        self.network.listen_addr()
    }

    /// Spawn the local avatar and announce it on the readiness signal
    pub fn spawn_local_avatar(&self) {
        let handle = self.roster.upsert(
            &self.local_peer_id,
            &self.config.node.name,
            self.config.node.position(),
        );
        self.readiness.publish(LocalPeer {
            id: self.local_peer_id.clone(),
            handle,
        });
    }

    /// Dial every configured peer, logging failures
    pub async fn connect_configured_peers(&self) {
        for addr in &self.config.node.connect {
            match self.network.connect_to_peer(addr).await {
                Ok(peer) => tracing::info!("Connected to {} at {}", peer, addr),
                Err(e) => tracing::error!("Could not connect to {}: {}", addr, e),
            }
        }
    }

    /// Run the event loop until `quit` or end of input
    pub async fn run(mut self) -> Result<()> {
        let mut ticker = tokio::time::interval(self.config.node.tick_interval());
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        print_help();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.node.tick(Instant::now());
                }
                event = self.network.next_event() => match event {
                    Some(event) => self.handle_network_event(event),
                    None => break,
                },
                Some(outbound) = self.outbox.recv() => {
                    if let Err(e) = self.network.send_to_peer(&outbound.to, &outbound.message).await {
                        tracing::warn!("Failed to deliver {} to {}: {}", outbound.message.kind(), outbound.to, e);
                    }
                }
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        if !self.handle_command(line.trim()).await {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!("Console read error: {}", e);
                        break;
                    }
                },
            }
        }

        self.node.shutdown();
        tracing::info!("Node stopped");
        Ok(())
    }

    /// Handle network events
    fn handle_network_event(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::PeerConnected {
                peer,
                name,
                position,
            } => {
                self.roster.upsert(&peer, &name, position);
                println!("   {} joined at {}", name, position);
            }
            NetworkEvent::PeerDisconnected(peer) => {
                if let Some(entry) = self.roster.remove(&peer) {
                    println!("   {} left", entry.name);
                }
            }
            NetworkEvent::MessageReceived { from, message } => {
                if let NetworkMessage::Moved { position } = message {
                    self.roster.move_to(&from, position);
                    return;
                }

                let action = self.node.handle_message(&from, &message, Instant::now());
                tracing::debug!("{} from {}: {:?}", message.kind(), from, action);
            }
        }
    }

    /// Handle one console line. Returns false to stop.
    async fn handle_command(&mut self, line: &str) -> bool {
        let mut parts = line.splitn(2, ' ');
        let command = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).unwrap_or_default();

        match command {
            "" => {}
            "trade" => {
                let target = self.roster.find_by_name(arg).map(|(_, handle)| handle);
                let action = self.node.interact(target, Instant::now());
                if action == NegotiationAction::Ignored {
                    tracing::debug!("No valid trade target '{}'", arg);
                }
            }
            "cancel" => self.node.cancel_trade(),
            "edit" => self.node.toggle_edit_mode(),
            "changed" => self.node.notify_inventory_changed(),
            "move" => match arg.parse::<Position>() {
                Ok(position) => self.move_to(position).await,
                Err(e) => println!("   {}", e),
            },
            "status" => self.print_status(),
            "peers" => self.print_peers(),
            "help" => print_help(),
            "quit" | "exit" => return false,
            other => println!("   Unknown command '{}' (try 'help')", other),
        }
        true
    }

    async fn move_to(&self, position: Position) {
        self.roster.move_to(&self.local_peer_id, position);
        self.network.set_position(position);
        if let Err(e) = self
            .network
            .broadcast(&NetworkMessage::Moved { position })
            .await
        {
            tracing::warn!("Failed to announce move: {}", e);
        }
    }

    fn print_status(&self) {
        println!("   Phase: {:?}", self.node.phase());
        if let Some(session) = self.node.active_session() {
            println!(
                "   Trading with {} (inventory {}, revision {})",
                self.roster.display_name(session.counterparty()),
                session.inventory(),
                session.inventory_revision()
            );
        }

        let negotiator = self.node.negotiator();
        for peer in negotiator.sent().peers() {
            println!("   Request sent to {}", self.roster.display_name(peer));
        }
        for peer in negotiator.received().peers() {
            println!("   Request from {}", self.roster.display_name(peer));
        }
        if self.node.is_negotiation_ui_open() && !self.node.is_session_active() {
            println!("   Layout edit mode on");
        }
    }

    fn print_peers(&self) {
        let here = self
            .roster
            .resolve(&self.local_peer_id)
            .and_then(|h| self.roster.position_of(h));

        for (id, entry) in self.roster.entries() {
            if id == self.local_peer_id {
                continue;
            }
            let distance = here
                .map(|p| format!("{:.1}", p.distance(&entry.position)))
                .unwrap_or_else(|| "?".to_string());
            println!("   {} ({}) at {} distance {}", entry.name, id.short(), entry.position, distance);
        }
    }
}

fn print_help() {
    println!("Commands: trade <name> | cancel | move x,y,z | edit | changed | status | peers | quit");
}
