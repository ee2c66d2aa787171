//! `vskv-server` runs the key-value frontend service: a small binary that
//! bootstraps against a value store and then serves the client-facing
//! wire protocol over TCP. [Author fengyang]
//!
//! ## Getting started
//!
//! ```doc
//! ❯ ./vskv-server --name my-service --bootstrap
//!
//! ██  ██  █        █
//! ██ ██   ██      ██
//! ███      ██    ██
//! ██ ██     ██  ██
//! ██  ██     ████  KV Storage Service
//!
//! listening on 127.0.0.1:7878
//! ```

pub mod server;
pub mod trace;
