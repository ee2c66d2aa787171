//! The TCP front end: an accept loop spawning one task per connection.

pub mod config;
pub mod connection;

use std::sync::Arc;

use log::info;
use tokio::net::TcpListener;

use vskv::error::{CResult, Error};
use vskv::facade::ServiceFacade;

/// Binds `listen` and serves connections until the process is signalled to
/// stop. Each connection is handled on its own task via
/// `connection::handle_connection`.
pub async fn serve(listen: &str, facade: Arc<ServiceFacade>) -> CResult<()> {
    let listener = TcpListener::bind(listen)
        .await
        .map_err(|e| Error::Internal(format!("binding {listen}: {e}")))?;
    info!("listening on {listen}");

    loop {
        let (stream, _) = listener
            .accept()
            .await
            .map_err(|e| Error::Internal(format!("accepting connection: {e}")))?;
        let facade = facade.clone();
        tokio::spawn(async move {
            connection::handle_connection(stream, facade).await;
        });
    }
}
