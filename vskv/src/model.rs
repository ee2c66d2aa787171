//! The data model: addresses, blocks, and the key map that is the sole
//! authoritative state of the service, serialized as the payload of a
//! single mutable root block in the value store.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde_derive::{Deserialize, Serialize};

/// Opaque byte string identifying a block in the value store. Equality is
/// byte-for-byte; this crate never interprets an address's contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(#[serde(with = "serde_bytes")] pub Vec<u8>);

impl Address {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// The kind-specific payload of a block, modeled as a tagged variant rather
/// than an inheritance hierarchy: the value store's three block kinds share
/// an address envelope but never share payload shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockPayload {
    /// Content-addressed, write-once data. Carries one value's raw bytes,
    /// or (for the root block) an encoded `KeyMap`.
    Immutable(#[serde(with = "serde_bytes")] Vec<u8>),
    /// CAS-updatable. `version` advances by one on every successful update.
    Mutable {
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
        version: u64,
    },
    /// Mutable and additionally reachable by a client-chosen key. Carries
    /// the address of another block (here, always the root block).
    Named { target: Address, version: u64 },
}

/// A block as known to this service: an optional address (absent for a
/// freshly-created, not-yet-inserted block) plus its payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub address: Option<Address>,
    pub payload: BlockPayload,
}

impl Block {
    pub fn version(&self) -> Option<u64> {
        match &self.payload {
            BlockPayload::Mutable { version, .. } => Some(*version),
            BlockPayload::Named { version, .. } => Some(*version),
            BlockPayload::Immutable(_) => None,
        }
    }

    pub fn data(&self) -> &[u8] {
        match &self.payload {
            BlockPayload::Immutable(data) => data,
            BlockPayload::Mutable { data, .. } => data,
            BlockPayload::Named { .. } => &[],
        }
    }
}

/// Pointer to an immutable data block holding one value's bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueStore {
    pub address: Address,
}

/// The descriptor for a single key: the committed value pointer, if any,
/// plus any in-flight write attempts.
///
/// `current` is a true `Option`, never a present struct whose address field
/// is itself optional -- "no committed value" is the single state
/// `Option::None`, not a second encoding layered on top of a present value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDescriptor {
    pub current: Option<ValueStore>,
    pub edits: Vec<ValueStore>,
}

impl ValueDescriptor {
    /// A descriptor with no committed value and no pending edits carries no
    /// information and must not be retained in the map (invariant 1).
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.edits.is_empty()
    }
}

/// The sole authoritative state of the service: key to descriptor. Backed
/// by a `BTreeMap` so iteration is already in lexicographic key order --
/// the listing engine's sort step falls out of the data structure.
pub type KeyMap = BTreeMap<String, ValueDescriptor>;
