//! Real value-store adapter: speaks a length-delimited, bincode-framed
//! request/response protocol over TCP.
//!
//! Grounded on the teacher's own declared-but-previously-unused
//! `tokio-serde` (bincode feature), `tokio-util` (codec feature), and
//! `tokio-stream` (net feature) workspace dependencies -- this module is
//! the first in the transformed crate to actually exercise them, in place
//! of the gRPC transport the original system used, which this crate's
//! dependency stack has no counterpart for.
//!
//! One connection is opened per call. This keeps the adapter stateless and
//! trivially `Send + Sync`; a production deployment fronted by a
//! connection pool would replace this module without touching callers,
//! since everything here is reached only through `ValueStoreClient`.

use futures::SinkExt;
use serde_derive::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_serde::formats::Bincode;
use tokio_stream::StreamExt;
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

use crate::error::{CResult, Error};
use crate::model::{Address, Block};
use crate::vs_client::{BoxFuture, ValueStoreClient};

#[derive(Debug, Clone, Serialize, Deserialize)]
enum VsRequest {
    NamedBlockAddress(#[serde(with = "serde_bytes")] Vec<u8>),
    Fetch { address: Address, decrypt: bool },
    Insert(Block),
    Update(Block),
    Remove(Address),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum VsResponse {
    Address(Address),
    Block(Block),
    Updated(Option<Block>),
    Ack,
    Err(String),
}

/// Adapter to a value store reached over TCP at `endpoint`.
pub struct WireValueStore {
    endpoint: String,
}

impl WireValueStore {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into() }
    }

    async fn call(&self, request: VsRequest) -> CResult<VsResponse> {
        let stream = TcpStream::connect(&self.endpoint)
            .await
            .map_err(|e| Error::Internal(format!("connecting to value store: {e}")))?;
        let (read_half, write_half) = stream.into_split();

        let length_delimited_read =
            FramedRead::new(read_half, LengthDelimitedCodec::new());
        let length_delimited_write =
            FramedWrite::new(write_half, LengthDelimitedCodec::new());

        let mut deserialized = tokio_serde::Framed::<_, VsResponse, VsRequest, _>::new(
            length_delimited_read,
            Bincode::<VsResponse, VsRequest>::default(),
        );
        let mut serialized = tokio_serde::Framed::<_, VsResponse, VsRequest, _>::new(
            length_delimited_write,
            Bincode::<VsResponse, VsRequest>::default(),
        );

        serialized
            .send(request)
            .await
            .map_err(|e| Error::Internal(format!("sending to value store: {e}")))?;

        let response = deserialized
            .next()
            .await
            .ok_or_else(|| Error::Internal("value store closed connection".to_string()))?
            .map_err(|e| Error::Internal(format!("reading from value store: {e}")))?;

        if let VsResponse::Err(msg) = response {
            return Err(Error::Internal(msg));
        }
        Ok(response)
    }
}

impl ValueStoreClient for WireValueStore {
    fn named_block_address<'a>(&'a self, key: &'a [u8]) -> BoxFuture<'a, CResult<Address>> {
        Box::pin(async move {
            match self.call(VsRequest::NamedBlockAddress(key.to_vec())).await? {
                VsResponse::Address(addr) => Ok(addr),
                other => Err(unexpected(other)),
            }
        })
    }

    fn fetch<'a>(&'a self, address: &'a Address, decrypt: bool) -> BoxFuture<'a, CResult<Block>> {
        Box::pin(async move {
            match self
                .call(VsRequest::Fetch { address: address.clone(), decrypt })
                .await?
            {
                VsResponse::Block(block) => Ok(block),
                other => Err(unexpected(other)),
            }
        })
    }

    fn insert<'a>(&'a self, block: Block) -> BoxFuture<'a, CResult<()>> {
        Box::pin(async move {
            match self.call(VsRequest::Insert(block)).await? {
                VsResponse::Ack => Ok(()),
                other => Err(unexpected(other)),
            }
        })
    }

    fn update<'a>(&'a self, block: Block) -> BoxFuture<'a, CResult<Option<Block>>> {
        Box::pin(async move {
            match self.call(VsRequest::Update(block)).await? {
                VsResponse::Updated(winner) => Ok(winner),
                other => Err(unexpected(other)),
            }
        })
    }

    fn remove<'a>(&'a self, address: &'a Address) -> BoxFuture<'a, CResult<()>> {
        Box::pin(async move {
            match self.call(VsRequest::Remove(address.clone())).await? {
                VsResponse::Ack => Ok(()),
                other => Err(unexpected(other)),
            }
        })
    }

    // `make_*` are synchronous by trait contract (see `vs_client::mod`), so
    // unlike every other method here they cannot round-trip to the remote
    // value store to ask it to mint an address. They reuse the in-memory
    // double's deterministic address derivation instead, which only agrees
    // with a real remote value store if it publishes the same content- and
    // named-addressing scheme as a protocol contract. `bootstrap`'s
    // `debug_assert_eq!` between `named_block_address` (a real RPC) and
    // `make_named_block`'s address exists precisely to catch a divergence
    // here in debug builds.
    fn make_mutable_block(&self) -> Block {
        crate::vs_client::memory::MemoryValueStore::new().make_mutable_block()
    }

    fn make_immutable_block(&self, data: Vec<u8>) -> Block {
        crate::vs_client::memory::MemoryValueStore::new().make_immutable_block(data)
    }

    fn make_named_block(&self, key: &[u8], target: Address) -> Block {
        crate::vs_client::memory::MemoryValueStore::new().make_named_block(key, target)
    }
}

fn unexpected(response: VsResponse) -> Error {
    Error::Internal(format!("unexpected value store response: {response:?}"))
}
