//! `vskv` is a key-value frontend over an external content-addressed block
//! store. It holds no authoritative state of its own: the entire key-to-
//! value mapping lives in a single root block in the value store, and every
//! write is a read-modify-write on that root block coordinated through the
//! value store's compare-and-swap primitive. [Author fengyang]
//!
//! ## Getting started
//!
//! ```rust
//! use vskv::bootstrap;
//! use vskv::facade::ServiceFacade;
//! use vskv::vs_client::memory::MemoryValueStore;
//! use std::sync::Arc;
//!
//! # async fn run() -> vskv::error::CResult<()> {
//! let vstore = Arc::new(MemoryValueStore::new());
//! let root = bootstrap::bootstrap(vstore.as_ref(), b"demo", true).await?;
//! let facade = ServiceFacade::new(vstore, root);
//!
//! facade.insert("some/key", b"some data".to_vec()).await?;
//! let value = facade.fetch("some/key").await?;
//! assert_eq!(value, b"some data");
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod codec;
pub mod error;
pub mod facade;
pub mod listing;
pub mod mapping;
pub mod model;
pub mod vs_client;
pub mod wire;
