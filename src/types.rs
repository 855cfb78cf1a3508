//! Core types used throughout peertrade

use blake2::{Blake2b512, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable identifier for a participant on the network (derived from public key hash)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerID(pub String);

impl PeerID {
    /// Create PeerID from public key bytes
    pub fn from_pubkey(pubkey: &[u8]) -> Self {
        let mut hasher = Blake2b512::new();
        hasher.update(pubkey);
        let result = hasher.finalize();
        Self(hex::encode(&result[..16])) // Use first 16 bytes
    }

    /// Generate a random identity for a fresh node
    pub fn generate() -> Self {
        let seed: [u8; 32] = rand::random();
        Self::from_pubkey(&seed)
    }

    /// Short form for logs and notices
    pub fn short(&self) -> &str {
        let end = self.0.len().min(8);
        self.0.get(..end).unwrap_or(&self.0)
    }
}

impl fmt::Display for PeerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transient in-process reference to a peer's avatar.
///
/// Handles are only meaningful inside the process that allocated them and
/// must never be sent over the wire; use [`PeerID`] for that.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PeerHandle(pub u64);

impl fmt::Display for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The local process's own identity, available once its avatar exists
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalPeer {
    pub id: PeerID,
    pub handle: PeerHandle,
}

/// World-space position of an avatar
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Euclidean distance to another position
    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl From<[f32; 3]> for Position {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<Position> for [f32; 3] {
    fn from(p: Position) -> Self {
        [p.x, p.y, p.z]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl FromStr for Position {
    type Err = String;

    /// Parse "x,y,z"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(format!("expected x,y,z but got '{}'", s));
        }

        let mut coords = [0f32; 3];
        for (slot, part) in coords.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|e| format!("invalid coordinate '{}': {}", part, e))?;
            if !slot.is_finite() {
                return Err(format!("coordinate '{}' is not finite", part));
            }
        }
        Ok(coords.into())
    }
}

/// Handle to the shared trade inventory of a session.
///
/// Both peers derive the same handle for the same pair, so the two mirrors of
/// a logical session refer to one inventory.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryHandle(pub String);

impl InventoryHandle {
    /// Derive the inventory handle for a pair of peers (order-independent)
    pub fn for_pair(a: &PeerID, b: &PeerID) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };

        let mut hasher = Blake2b512::new();
        hasher.update(first.0.as_bytes());
        hasher.update([0u8]);
        hasher.update(second.0.as_bytes());
        let result = hasher.finalize();
        Self(format!("inv_{}", hex::encode(&result[..12])))
    }
}

impl fmt::Display for InventoryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
