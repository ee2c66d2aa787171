//! The value-store client seam: a thin async trait over the external
//! content-addressed block store, mirrored by an in-memory test double
//! (`memory`) and a real framed-TCP adapter (`wire`).
//!
//! Modeled in the shape of `storage::engine::Engine` -- a trait the rest of
//! the crate programs against, with the same object-safety trade-off
//! `Engine::scan_dyn` makes for its iterator: since a binary picks between
//! a wire-backed and an in-memory store at runtime (not at compile time),
//! the async methods here return a boxed future rather than `async fn`, so
//! `dyn ValueStoreClient` stays usable behind an `Arc`.

pub mod memory;
pub mod wire;

use std::future::Future;
use std::pin::Pin;

use crate::error::CResult;
use crate::model::{Address, Block};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait ValueStoreClient: Send + Sync {
    /// Resolves the address of the named block reachable by `key`. This is
    /// deterministic: the same key always resolves to the same address,
    /// whether or not a block has been inserted there yet.
    fn named_block_address<'a>(&'a self, key: &'a [u8]) -> BoxFuture<'a, CResult<Address>>;

    /// Fetches the block at `address`. `decrypt` mirrors the value store's
    /// own flag for mutable/named blocks whose payload is encrypted at
    /// rest; the in-memory double ignores it.
    fn fetch<'a>(&'a self, address: &'a Address, decrypt: bool) -> BoxFuture<'a, CResult<Block>>;

    /// Inserts a freshly created block (one with no address yet, or one
    /// whose address was already assigned by `make_named_block`).
    fn insert<'a>(&'a self, block: Block) -> BoxFuture<'a, CResult<()>>;

    /// Compare-and-swap update of a mutable or named block. `block` must
    /// already have an address and must carry the version the caller last
    /// observed. Returns `Ok(None)` on success, or `Ok(Some(winner))`
    /// carrying the block that won the race on conflict.
    fn update<'a>(&'a self, block: Block) -> BoxFuture<'a, CResult<Option<Block>>>;

    /// Removes a block. Removing a missing block is not an error -- this
    /// call is used for best-effort cleanup of orphaned or superseded
    /// blocks, and the value store is expected to tolerate redundant
    /// removes.
    fn remove<'a>(&'a self, address: &'a Address) -> BoxFuture<'a, CResult<()>>;

    /// Constructs a fresh mutable block with a newly assigned address,
    /// ready to `insert`.
    fn make_mutable_block(&self) -> Block;

    /// Constructs a fresh, content-addressed immutable block from `data`.
    fn make_immutable_block(&self, data: Vec<u8>) -> Block;

    /// Constructs a fresh named block reachable by `key`, pointing at
    /// `target`. Its address is `named_block_address(key)`.
    fn make_named_block(&self, key: &[u8], target: Address) -> Block;
}
