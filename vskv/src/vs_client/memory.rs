//! In-memory value-store test double.
//!
//! Grounded on `storage::memory::Memory`: a `Mutex`-guarded `BTreeMap`
//! standing in for the real storage engine. Used by this crate's own
//! tests, by `demos`, and by anywhere a real value-store endpoint isn't
//! configured.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

use rand::RngCore;

use crate::error::{CResult, Error};
use crate::model::{Address, Block, BlockPayload};
use crate::vs_client::{BoxFuture, ValueStoreClient};

/// Deterministic content address: two independent 64-bit hashes of the
/// bytes, concatenated, so collisions require both hashes to collide.
fn content_address(bytes: &[u8]) -> Address {
    let mut h1 = DefaultHasher::new();
    bytes.hash(&mut h1);
    let mut h2 = DefaultHasher::new();
    (bytes, 0x5bd1e995u32).hash(&mut h2);
    let mut out = Vec::with_capacity(16);
    out.extend_from_slice(&h1.finish().to_be_bytes());
    out.extend_from_slice(&h2.finish().to_be_bytes());
    Address(out)
}

fn named_address(key: &[u8]) -> Address {
    let mut out = b"named:".to_vec();
    out.extend_from_slice(&content_address(key).0);
    Address(out)
}

fn random_address() -> Address {
    let mut bytes = vec![0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    Address(bytes)
}

#[derive(Default)]
pub struct MemoryValueStore {
    blocks: Mutex<BTreeMap<Address, Block>>,
}

impl MemoryValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ValueStoreClient for MemoryValueStore {
    fn named_block_address<'a>(&'a self, key: &'a [u8]) -> BoxFuture<'a, CResult<Address>> {
        Box::pin(async move { Ok(named_address(key)) })
    }

    fn fetch<'a>(&'a self, address: &'a Address, _decrypt: bool) -> BoxFuture<'a, CResult<Block>> {
        Box::pin(async move {
            let blocks = self.blocks.lock().unwrap();
            blocks
                .get(address)
                .cloned()
                .ok_or_else(|| Error::DoesNotExist(format!("block not found: {address}")))
        })
    }

    fn insert<'a>(&'a self, block: Block) -> BoxFuture<'a, CResult<()>> {
        Box::pin(async move {
            let address = block
                .address
                .clone()
                .ok_or_else(|| Error::Internal("insert of unaddressed block".to_string()))?;
            let mut blocks = self.blocks.lock().unwrap();
            blocks.insert(address, block);
            Ok(())
        })
    }

    fn update<'a>(&'a self, block: Block) -> BoxFuture<'a, CResult<Option<Block>>> {
        Box::pin(async move {
            let address = block
                .address
                .clone()
                .ok_or_else(|| Error::Internal("update of unaddressed block".to_string()))?;
            let new_version = block
                .version()
                .ok_or_else(|| Error::Internal("update of immutable block".to_string()))?;

            let mut blocks = self.blocks.lock().unwrap();
            let current = blocks
                .get(&address)
                .cloned()
                .ok_or_else(|| Error::Internal(format!("no block to update at {address}")))?;
            let current_version = current.version().unwrap_or(0);

            if current_version != new_version {
                return Ok(Some(current));
            }

            let mut updated = block;
            match &mut updated.payload {
                BlockPayload::Mutable { version, .. } => *version += 1,
                BlockPayload::Named { version, .. } => *version += 1,
                BlockPayload::Immutable(_) => {
                    return Err(Error::Internal("update of immutable block".to_string()))
                }
            }
            blocks.insert(address, updated);
            Ok(None)
        })
    }

    fn remove<'a>(&'a self, address: &'a Address) -> BoxFuture<'a, CResult<()>> {
        Box::pin(async move {
            let mut blocks = self.blocks.lock().unwrap();
            blocks.remove(address);
            Ok(())
        })
    }

    fn make_mutable_block(&self) -> Block {
        Block {
            address: Some(random_address()),
            payload: BlockPayload::Mutable { data: Vec::new(), version: 0 },
        }
    }

    fn make_immutable_block(&self, data: Vec<u8>) -> Block {
        let address = content_address(&data);
        Block { address: Some(address), payload: BlockPayload::Immutable(data) }
    }

    fn make_named_block(&self, key: &[u8], target: Address) -> Block {
        Block {
            address: Some(named_address(key)),
            payload: BlockPayload::Named { target, version: 0 },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn fetch_missing_is_does_not_exist() {
        let vs = MemoryValueStore::new();
        let addr = Address(vec![1, 2, 3]);
        let err = vs.fetch(&addr, false).await.unwrap_err();
        assert!(matches!(err, Error::DoesNotExist(_)));
    }

    #[tokio::test]
    async fn insert_then_fetch_round_trips() {
        let vs = MemoryValueStore::new();
        let block = vs.make_immutable_block(b"hello".to_vec());
        let address = block.address.clone().unwrap();
        vs.insert(block).await.unwrap();

        let fetched = vs.fetch(&address, false).await.unwrap();
        assert_eq!(fetched.data(), b"hello");
    }

    #[tokio::test]
    async fn update_conflict_returns_winner() {
        let vs = MemoryValueStore::new();
        let mutable = vs.make_mutable_block();
        let address = mutable.address.clone().unwrap();
        vs.insert(mutable.clone()).await.unwrap();

        // First writer succeeds and advances the version.
        let mut first = mutable.clone();
        if let BlockPayload::Mutable { data, .. } = &mut first.payload {
            *data = b"first".to_vec();
        }
        assert!(vs.update(first).await.unwrap().is_none());

        // Second writer, still holding the stale version, conflicts.
        let mut second = mutable;
        if let BlockPayload::Mutable { data, .. } = &mut second.payload {
            *data = b"second".to_vec();
        }
        let conflict = vs.update(second).await.unwrap();
        assert!(conflict.is_some());
        assert_eq!(conflict.unwrap().data(), b"first");

        let _ = address;
    }

    #[tokio::test]
    async fn named_block_address_is_deterministic() {
        let vs = MemoryValueStore::new();
        let a = vs.named_block_address(b"svc").await.unwrap();
        let b = vs.named_block_address(b"svc").await.unwrap();
        assert_eq!(a, b);
    }
}
