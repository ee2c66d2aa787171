//! Startup root-block discovery, per §4.6: resolve the named block for the
//! configured service name, and either adopt its root or create a fresh
//! one, depending on the `bootstrap` flag.
//!
//! Grounded on `original_source/.../server.go`'s `NewServer()` sequence.

use log::{error, info};
use tokio::time::{sleep, Duration};

use crate::error::{CResult, Error};
use crate::model::{Address, BlockPayload};
use crate::vs_client::ValueStoreClient;

const RETRY_ATTEMPTS: u32 = 10;
const RETRY_DELAY: Duration = Duration::from_millis(250);

/// Resolves the root block address for `name`, creating it if `bootstrap`
/// is true and it doesn't already exist. Returns the root block's address,
/// ready to be handed to a `MappingEngine`.
pub async fn bootstrap(
    vstore: &dyn ValueStoreClient,
    name: &[u8],
    bootstrap: bool,
) -> CResult<Address> {
    let named_address = vstore.named_block_address(name).await?;

    if let Some(root) = try_fetch_root(vstore, &named_address).await? {
        // Verify the root block itself is reachable before serving.
        vstore.fetch(&root, true).await?;
        info!("adopted existing root block at {root}");
        return Ok(root);
    }

    if bootstrap {
        return create_root(vstore, name, &named_address).await;
    }

    for attempt in 1..=RETRY_ATTEMPTS {
        info!("waiting for another node to bootstrap ({attempt}/{RETRY_ATTEMPTS})");
        sleep(RETRY_DELAY).await;
        if let Some(root) = try_fetch_root(vstore, &named_address).await? {
            vstore.fetch(&root, true).await?;
            return Ok(root);
        }
    }

    error!("no root block found after {RETRY_ATTEMPTS} attempts and bootstrap=false");
    Err(Error::Internal(
        "named block not found; ensure another node has bootstrapped, or pass --bootstrap"
            .to_string(),
    ))
}

async fn try_fetch_root(
    vstore: &dyn ValueStoreClient,
    named_address: &Address,
) -> CResult<Option<Address>> {
    match vstore.fetch(named_address, true).await {
        Ok(block) => match block.payload {
            BlockPayload::Named { target, .. } => Ok(Some(target)),
            _ => Err(Error::Internal("named block has unexpected payload".to_string())),
        },
        Err(Error::DoesNotExist(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

async fn create_root(
    vstore: &dyn ValueStoreClient,
    name: &[u8],
    named_address: &Address,
) -> CResult<Address> {
    let root_block = vstore.make_mutable_block();
    let root_address = root_block
        .address
        .clone()
        .expect("make_mutable_block always assigns an address");

    let named_block = vstore.make_named_block(name, root_address.clone());
    debug_assert_eq!(&named_block.address.clone().unwrap(), named_address);

    vstore.insert(named_block).await?;
    vstore.insert(root_block).await?;

    info!("bootstrapped fresh root block at {root_address}");
    Ok(root_address)
}
