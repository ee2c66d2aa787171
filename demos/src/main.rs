//! Runs the end-to-end lifecycle scenario against an in-memory value
//! store, in-process, with no network hop -- a quick way to see the
//! frontend's two-phase write and conflict-replay machinery behave
//! without standing up a `vskv-server` and a separate value store.
//!
//! Grounded on the teacher's own demo binary (`example/src/main.rs`),
//! which drove a storage engine directly and asserted on a scan; this
//! walks the same insert/fetch/update/upsert/delete shape but against
//! the key-value frontend instead of a raw engine.

use std::sync::Arc;

use vskv::bootstrap;
use vskv::error::{CResult, Error};
use vskv::facade::ServiceFacade;
use vskv::vs_client::memory::MemoryValueStore;
use vskv::vs_client::ValueStoreClient;

#[tokio::main]
async fn main() {
    println!("vskv demo: in-process frontend over a memory value store");

    run().await.unwrap();

    println!("done");
}

async fn run() -> CResult<()> {
    let vstore: Arc<dyn ValueStoreClient> = Arc::new(MemoryValueStore::new());
    let root_address = bootstrap::bootstrap(vstore.as_ref(), b"demo", true).await?;
    let facade = ServiceFacade::new(vstore, root_address);

    facade.insert("some/key", b"some data".to_vec()).await?;
    println!("inserted some/key");

    let value = facade.fetch("some/key").await?;
    println!("fetched some/key -> {:?}", String::from_utf8_lossy(&value));

    match facade.insert("some/key", b"exists".to_vec()).await {
        Err(Error::AlreadyExists(key)) => println!("insert of {key} correctly rejected: already exists"),
        Err(other) => return Err(other),
        Ok(()) => panic!("expected AlreadyExists, got Ok"),
    }

    facade.update("some/key", b"update data".to_vec()).await?;
    let value = facade.fetch("some/key").await?;
    println!("updated some/key -> {:?}", String::from_utf8_lossy(&value));

    facade.upsert("some/key", b"upsert data".to_vec()).await?;
    let value = facade.fetch("some/key").await?;
    println!("upserted some/key -> {:?}", String::from_utf8_lossy(&value));

    facade.delete("some/key").await?;
    println!("deleted some/key");

    match facade.fetch("some/key").await {
        Err(Error::DoesNotExist(key)) => println!("fetch of {key} correctly reports: does not exist"),
        Err(other) => return Err(other),
        Ok(_) => panic!("expected DoesNotExist, got a value"),
    }

    Ok(())
}
