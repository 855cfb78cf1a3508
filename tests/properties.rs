//! Property tests over random interaction schedules.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use proptest::prelude::*;

use peertrade::layout::WindowLayout;
use peertrade::negotiation::{Direction, PendingRequests, SessionController};
use peertrade::notify::NoticeLog;
use peertrade::p2p::NetworkMessage;
use peertrade::sim::SimWorld;
use peertrade::{NegotiationAction, NegotiationConfig, PeerID, Position};

const PEERS: usize = 3;

#[derive(Debug, Clone)]
enum Op {
    Interact(usize, usize),
    DeliverAll,
    DropOutbound(usize),
    Advance(u64),
    Cancel(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..PEERS, 0..PEERS).prop_map(|(a, b)| Op::Interact(a, b)),
        3 => Just(Op::DeliverAll),
        1 => (0..PEERS).prop_map(Op::DropOutbound),
        2 => (0u64..6_000).prop_map(Op::Advance),
        1 => (0..PEERS).prop_map(Op::Cancel),
    ]
}

fn world() -> SimWorld {
    let mut world = SimWorld::new(NegotiationConfig::default());
    for (i, name) in ["alice", "bob", "carol"].iter().enumerate() {
        world.add_peer(name, Position::new(i as f32, 0.0, 0.0));
    }
    world
}

proptest! {
    /// A session, once started, keeps its counterparty until cancelled
    #[test]
    fn prop_session_never_replaced(ops in prop::collection::vec(op(), 1..60)) {
        let mut world = world();

        for op in ops {
            let before: Vec<Option<PeerID>> = (0..PEERS)
                .map(|i| world.peer(i).node.active_session().map(|s| s.counterparty().clone()))
                .collect();

            let cancelled = match op {
                Op::Interact(a, b) => { world.interact(a, b); None }
                Op::DeliverAll => { world.deliver_all(); None }
                Op::DropOutbound(i) => { world.take_outbound(i); None }
                Op::Advance(ms) => { world.advance(Duration::from_millis(ms)); None }
                Op::Cancel(i) => { world.peer_mut(i).node.cancel_trade(); Some(i) }
            };

            for (i, previous) in before.iter().enumerate() {
                if cancelled == Some(i) {
                    continue;
                }
                if let Some(previous) = previous {
                    let now = world.peer(i).node.active_session().map(|s| s.counterparty().clone());
                    prop_assert_eq!(now.as_ref(), Some(previous));
                }
            }
        }
    }

    /// No peer ever has itself pending, and every pending deadline is in
    /// the future once a tick has run
    #[test]
    fn prop_pending_sets_stay_clean(ops in prop::collection::vec(op(), 1..60)) {
        let mut world = world();

        for op in ops {
            match op {
                Op::Interact(a, b) => { world.interact(a, b); }
                Op::DeliverAll => { world.deliver_all(); }
                Op::DropOutbound(i) => { world.take_outbound(i); }
                Op::Advance(ms) => { world.advance(Duration::from_millis(ms)); }
                Op::Cancel(i) => world.peer_mut(i).node.cancel_trade(),
            }
            world.advance(Duration::ZERO);

            let now = world.now();
            for i in 0..PEERS {
                let negotiator = world.peer(i).node.negotiator();
                let me = world.id(i);
                prop_assert!(!negotiator.has_sent_to(&me));
                prop_assert!(!negotiator.has_received_from(&me));
                for pending in [negotiator.sent(), negotiator.received()] {
                    if let Some(next) = pending.next_deadline() {
                        prop_assert!(next > now);
                    }
                }
            }
        }
    }

    /// Accepting always answers with start-trading and never also sends a
    /// request-to-trade to the same peer
    #[test]
    fn prop_accept_sends_only_start_trading(ops in prop::collection::vec(op(), 1..60)) {
        let mut world = world();

        for op in ops {
            match op {
                Op::Interact(a, b) => {
                    let action = world.interact(a, b);
                    let outbound = world.take_outbound(a);
                    match action {
                        NegotiationAction::SessionStarted(_)
                        | NegotiationAction::SessionRejected => {
                            prop_assert_eq!(outbound.len(), 1);
                            prop_assert_eq!(
                                &outbound[0].message,
                                &NetworkMessage::start_trading(&world.id(a))
                            );
                        }
                        NegotiationAction::RequestSent => {
                            prop_assert_eq!(outbound.len(), 1);
                        }
                        _ => prop_assert!(outbound.is_empty()),
                    }
                    for sent in &outbound {
                        world.deliver(a, sent);
                    }
                }
                Op::DeliverAll => { world.deliver_all(); }
                Op::DropOutbound(i) => { world.take_outbound(i); }
                Op::Advance(ms) => { world.advance(Duration::from_millis(ms)); }
                Op::Cancel(i) => world.peer_mut(i).node.cancel_trade(),
            }
        }
    }

    /// Create/cancel sequences never yield two sessions at once
    #[test]
    fn prop_create_session_mutually_exclusive(
        ops in prop::collection::vec(prop::option::of(0u8..5), 1..40)
    ) {
        let notices = Arc::new(NoticeLog::new());
        let mut sessions = SessionController::new(notices.clone(), Arc::new(WindowLayout::new()));
        let local = PeerID::from_pubkey(b"local");
        let mut model: Option<PeerID> = None;
        let mut rejections = 0;

        for op in ops {
            match op {
                Some(n) => {
                    let remote = PeerID::from_pubkey(&[n]);
                    let created = sessions.create_session(&local, &remote).is_ok();
                    prop_assert_eq!(created, model.is_none());
                    if created {
                        model = Some(remote);
                    } else {
                        rejections += 1;
                    }
                }
                None => {
                    sessions.cancel_active_session();
                    model = None;
                }
            }
            prop_assert_eq!(
                sessions.active_session().map(|s| s.counterparty().clone()),
                model.clone()
            );
        }
        prop_assert_eq!(notices.len(), rejections);
    }

    /// Pending requests behave like a map of first-insert deadlines, and
    /// expiring twice at the same instant is a no-op the second time
    #[test]
    fn prop_pending_matches_model(
        ops in prop::collection::vec((0u8..3, 0u8..4, 0u64..4_000), 1..80)
    ) {
        let ttl = Duration::from_secs(2);
        let start = Instant::now();
        let mut now = start;
        let mut pending = PendingRequests::new(Direction::Sent);
        let mut model: HashMap<PeerID, Instant> = HashMap::new();

        for (kind, peer, ms) in ops {
            let peer = PeerID::from_pubkey(&[peer]);
            match kind {
                0 => {
                    let fresh = !model.contains_key(&peer);
                    prop_assert_eq!(pending.insert(peer.clone(), now, ttl), fresh);
                    model.entry(peer).or_insert(now + ttl);
                }
                1 => {
                    prop_assert_eq!(pending.remove(&peer), model.remove(&peer).is_some());
                }
                _ => {
                    now += Duration::from_millis(ms);
                    let mut expired = pending.expire(now);
                    expired.sort();
                    let mut expected: Vec<PeerID> = model
                        .iter()
                        .filter(|(_, deadline)| **deadline <= now)
                        .map(|(p, _)| p.clone())
                        .collect();
                    expected.sort();
                    model.retain(|_, deadline| *deadline > now);
                    prop_assert_eq!(expired, expected);
                    prop_assert!(pending.expire(now).is_empty());
                }
            }
            prop_assert_eq!(pending.len(), model.len());
            for (peer, deadline) in &model {
                prop_assert_eq!(pending.deadline(peer), Some(*deadline));
            }
        }
    }
}
