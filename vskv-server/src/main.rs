use std::panic;
use std::sync::Arc;
use std::{env, process};

use anyhow::Result;
use clap::Parser;
use log::info;

use vskv::bootstrap;
use vskv::facade::ServiceFacade;
use vskv::vs_client::wire::WireValueStore;
use vskv::vs_client::ValueStoreClient;
use vskv_server::server;
use vskv_server::server::config::ServerConfig;
use vskv_server::trace;

#[derive(Debug, Parser, PartialEq)]
#[command(version, author, about)]
pub struct Args {
    /// Name of the named root block this service owns.
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// Create the root block if it doesn't already exist.
    #[clap(long)]
    bootstrap: bool,

    /// Endpoint of the value store backing this service.
    #[clap(long = "value-store")]
    value_store: Option<String>,

    /// Endpoint this service listens on for client connections.
    #[clap(long)]
    listen: Option<String>,

    /// Configuration file path.
    #[clap(short = 'c', long = "config", default_value = "config/vskv.toml")]
    config: String,

    #[clap(short = 'l', long, help = "log level")]
    log_level: Option<String>,
}

#[tokio::main]
pub async fn main() -> Result<()> {
    setup_panic_hooks();

    eprintln!();
    eprintln!("██  ██  █        █");
    eprintln!("██ ██   ██      ██");
    eprintln!("███      ██    ██");
    eprintln!("██ ██     ██  ██");
    eprintln!("██  ██     ████  KV Storage Service");
    eprintln!();

    let args = Args::parse();

    let log_dir = format!(
        "{}/.vskv-server",
        std::env::var("HOME").unwrap_or_else(|_| ".".to_string())
    );

    let overrides = ServerConfig {
        name: args.name.clone(),
        bootstrap: if args.bootstrap { Some(true) } else { None },
        value_store: args.value_store.clone(),
        listen: args.listen.clone(),
        log_level: args.log_level.clone(),
    };
    let cfg = ServerConfig::load(&args.config).merge_cli(overrides);

    let _guards = trace::init_logging(&log_dir, cfg.log_level()).await?;
    info!("vskv-server starting with config: {cfg:?}");

    let name = match &cfg.name {
        Some(name) if !name.is_empty() => name.clone(),
        _ => {
            eprintln!("error: --name is required");
            process::exit(2);
        }
    };

    ctrlc::set_handler(move || {
        info!("received shutdown signal, exiting");
        process::exit(0);
    })
    .expect("error setting Ctrl-C handler");

    let vstore: Arc<dyn ValueStoreClient> = Arc::new(WireValueStore::new(cfg.value_store()));
    let root_address = bootstrap::bootstrap(vstore.as_ref(), name.as_bytes(), cfg.bootstrap())
        .await
        .map_err(|e| anyhow::anyhow!("bootstrap failed: {e}"))?;

    let facade = Arc::new(ServiceFacade::new(vstore, root_address));

    server::serve(cfg.listen(), facade)
        .await
        .map_err(|e| anyhow::anyhow!("serve failed: {e}"))?;

    Ok(())
}

fn setup_panic_hooks() {
    let meta = human_panic::Metadata {
        version: env!("CARGO_PKG_VERSION").into(),
        name: env!("CARGO_PKG_NAME").into(),
        authors: env!("CARGO_PKG_AUTHORS").replace(':', ", ").into(),
        homepage: env!("CARGO_PKG_HOMEPAGE").into(),
    };

    let default_hook = panic::take_hook();

    if env::var("RUST_BACKTRACE").is_err() {
        panic::set_hook(Box::new(move |info: &panic::PanicInfo| {
            default_hook(info);

            let file_path = human_panic::handle_dump(&meta, info);
            human_panic::print_msg(file_path, &meta)
                .expect("human-panic: printing error message to console failed");
        }));
    }
}
