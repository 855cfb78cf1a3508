//! Two-node demo: request, accept, and expire on a simulated clock
//!
//! Walks through the negotiation lifecycle:
//! 1. Two peers within reach of each other
//! 2. Alice asks Bob to trade
//! 3. Bob accepts, both open the same trade
//! 4. Carol's request is held while Alice is busy
//! 5. Unanswered requests expire silently
//!
//! Run with: cargo run --example two_node_demo

use std::time::Duration;

use peertrade::sim::SimWorld;
use peertrade::{NegotiationAction, NegotiationConfig, Position};

fn banner(title: &str) {
    println!("┌─────────────────────────────────────────────┐");
    println!("│ {:<44}│", title);
    println!("└─────────────────────────────────────────────┘");
}

fn show(label: &str, action: &NegotiationAction) {
    println!("   {} -> {:?}", label, action);
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info,peertrade=debug")
        .init();

    println!("\n╔══════════════════════════════════════════════╗");
    println!("║   peertrade Two-Node Demo                    ║");
    println!("║   Request / Accept / Expire                  ║");
    println!("╚══════════════════════════════════════════════╝\n");

    let config = NegotiationConfig::default();
    let timeout = config.request_timeout();
    let mut world = SimWorld::new(config);

    let alice = world.add_peer("alice", Position::new(0.0, 0.0, 0.0));
    let bob = world.add_peer("bob", Position::new(2.0, 0.0, 0.0));
    let carol = world.add_peer("carol", Position::new(0.0, 3.0, 0.0));
    println!("📡 alice {}", world.id(alice));
    println!("📡 bob   {}", world.id(bob));
    println!("📡 carol {}\n", world.id(carol));

    // =========================================================================
    // Scenario 1: Request
    // =========================================================================
    banner("Scenario 1: Alice asks Bob");
    show("alice interacts with bob", &world.interact(alice, bob));
    show("alice interacts again", &world.interact(alice, bob));
    println!("   📤 {} message(s) delivered", world.deliver_all());
    println!("   📥 bob sees: {:?}\n", world.peer(bob).notices.last());

    // =========================================================================
    // Scenario 2: Accept
    // =========================================================================
    banner("Scenario 2: Bob accepts after 3s");
    world.advance(Duration::from_secs(3));
    show("bob interacts with alice", &world.interact(bob, alice));
    println!("   📤 {} message(s) delivered", world.deliver_all());
    for peer in [alice, bob] {
        let node = &world.peer(peer).node;
        println!(
            "   🤝 {} {:?} inventory {:?}",
            world.peer(peer).name,
            node.phase(),
            node.trade_inventory_handle()
        );
    }
    println!();

    // =========================================================================
    // Scenario 3: Busy
    // =========================================================================
    banner("Scenario 3: Carol asks busy Alice");
    show("carol interacts with alice", &world.interact(carol, alice));
    world.deliver_all();
    show("alice interacts with carol", &world.interact(alice, carol));
    println!(
        "   ⚠️  alice still trading with {:?}\n",
        world
            .peer(alice)
            .node
            .active_session()
            .map(|s| s.counterparty().clone())
    );

    // =========================================================================
    // Scenario 4: Expiry
    // =========================================================================
    banner("Scenario 4: Requests expire");
    world.peer_mut(alice).node.cancel_trade();
    world.peer_mut(bob).node.cancel_trade();
    show("bob interacts with carol", &world.interact(bob, carol));
    world.deliver_all();
    println!(
        "   ⏳ carol pending from bob: {}",
        world.peer(carol).node.negotiator().has_received_from(&world.id(bob))
    );
    world.advance(timeout);
    println!(
        "   ⌛ after {:?}: {}\n",
        timeout,
        world.peer(carol).node.negotiator().has_received_from(&world.id(bob))
    );

    println!("╔══════════════════════════════════════════════╗");
    println!("║   Demo Complete                              ║");
    println!("╚══════════════════════════════════════════════╝\n");

    Ok(())
}
