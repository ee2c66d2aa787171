//! Per-connection dispatch: reads framed `Request`s off the socket and
//! writes back framed `Response`s, driving the `ServiceFacade` for each.
//!
//! Grounded on `kv-cli/src/server/session.rs`'s `Session` dispatch loop --
//! restructured from REPL tokens read off stdin to wire frames read off a
//! TCP socket.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use log::{info, warn};
use tokio::net::TcpStream;
use tokio_serde::formats::Bincode;
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

use vskv::error::CResult;
use vskv::facade::ServiceFacade;
use vskv::wire::{Request, Response};

pub async fn handle_connection(stream: TcpStream, facade: Arc<ServiceFacade>) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    info!("connection opened from {peer}");

    let (read_half, write_half) = stream.into_split();
    let length_delimited_read = FramedRead::new(read_half, LengthDelimitedCodec::new());
    let length_delimited_write = FramedWrite::new(write_half, LengthDelimitedCodec::new());

    let mut requests = tokio_serde::Framed::<_, Request, Response, _>::new(
        length_delimited_read,
        Bincode::<Request, Response>::default(),
    );
    let mut responses = tokio_serde::Framed::<_, Request, Response, _>::new(
        length_delimited_write,
        Bincode::<Request, Response>::default(),
    );

    while let Some(frame) = requests.next().await {
        let request = match frame {
            Ok(request) => request,
            Err(err) => {
                warn!("connection from {peer} sent a malformed frame: {err}");
                break;
            }
        };

        let response = dispatch(&facade, request).await;
        if let Err(err) = responses.send(response).await {
            warn!("failed to write response to {peer}: {err}");
            break;
        }
    }

    info!("connection closed from {peer}");
}

async fn dispatch(facade: &ServiceFacade, request: Request) -> Response {
    let result: CResult<Response> = async {
        match request.clone() {
            Request::Insert { key, value } => {
                facade.insert(&key, value).await?;
                Ok(Response::Ok)
            }
            Request::Update { key, value } => {
                facade.update(&key, value).await?;
                Ok(Response::Ok)
            }
            Request::Upsert { key, value } => {
                facade.upsert(&key, value).await?;
                Ok(Response::Ok)
            }
            Request::Fetch { key } => {
                let value = facade.fetch(&key).await?;
                Ok(Response::Value(value))
            }
            Request::Delete { key } => {
                facade.delete(&key).await?;
                Ok(Response::Ok)
            }
            Request::List { .. } => {
                let listing_req = request.into();
                let result = facade.list(listing_req).await?;
                Ok(result.into())
            }
        }
    }
    .await;

    match result {
        Ok(response) => response,
        Err(err) => Response::Err(err.into()),
    }
}
