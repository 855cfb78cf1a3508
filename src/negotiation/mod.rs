//! Trade negotiation: pending requests, the negotiator, and sessions

pub mod negotiator;
pub mod pending;
pub mod session;
pub mod types;

pub use negotiator::Negotiator;
pub use pending::PendingRequests;
pub use session::{SessionController, TradeSession};
pub use types::{Direction, NegotiationAction, Notice, Placement, TradePhase};
